use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;

use super::{addr_prefix, Severity};

/// Discriminant of an [`AlphaSignal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    VolumeSpike,
    WhaleWatch,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::VolumeSpike => "VOLUME_SPIKE",
            SignalType::WhaleWatch => "WHALE_WATCH",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Buy-side volume spike for a single mint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeSignal {
    /// Detection time, not trade time.
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub mint: String,
    pub description: String,
    /// Buy volume (SOL) in the recent window.
    pub recent_volume: Decimal,
    /// Buy volume (SOL) in the baseline window preceding it.
    pub baseline_volume: Decimal,
    /// `+inf` when the baseline is empty.
    #[serde(serialize_with = "serialize_spike")]
    pub spike_percentage: f64,
    pub trade_count_recent: u64,
    pub trade_count_baseline: u64,
}

/// A trader who bought heavily in the first minutes after a mint appeared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhaleSignal {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub mint: String,
    pub description: String,
    pub trader_address: String,
    /// SOL spent inside the detection window.
    pub total_accumulated: Decimal,
    pub total_tokens_accumulated: Decimal,
    pub trade_count: u64,
    pub first_trade_at: DateTime<Utc>,
    pub last_trade_at: DateTime<Utc>,
    /// Bonding-curve SOL reserve at the whale's last in-window buy.
    pub estimated_market_cap: Option<Decimal>,
}

/// Closed set of alerts produced by the detectors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "signal_type")]
pub enum AlphaSignal {
    #[serde(rename = "VOLUME_SPIKE")]
    Volume(VolumeSignal),

    #[serde(rename = "WHALE_WATCH")]
    Whale(WhaleSignal),
}

impl AlphaSignal {
    pub fn signal_type(&self) -> SignalType {
        match self {
            AlphaSignal::Volume(_) => SignalType::VolumeSpike,
            AlphaSignal::Whale(_) => SignalType::WhaleWatch,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            AlphaSignal::Volume(s) => s.timestamp,
            AlphaSignal::Whale(s) => s.timestamp,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            AlphaSignal::Volume(s) => s.severity,
            AlphaSignal::Whale(s) => s.severity,
        }
    }

    pub fn mint(&self) -> &str {
        match self {
            AlphaSignal::Volume(s) => &s.mint,
            AlphaSignal::Whale(s) => &s.mint,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            AlphaSignal::Volume(s) => &s.description,
            AlphaSignal::Whale(s) => &s.description,
        }
    }
}

impl From<VolumeSignal> for AlphaSignal {
    fn from(s: VolumeSignal) -> Self {
        AlphaSignal::Volume(s)
    }
}

impl From<WhaleSignal> for AlphaSignal {
    fn from(s: WhaleSignal) -> Self {
        AlphaSignal::Whale(s)
    }
}

impl fmt::Display for AlphaSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} mint={} {}",
            self.signal_type(),
            self.severity(),
            addr_prefix(self.mint(), 16),
            self.description(),
        )
    }
}

/// JSON has no infinity; render it as a string and round finite values.
fn serialize_spike<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_infinite() {
        serializer.serialize_str(if *value > 0.0 { "inf" } else { "-inf" })
    } else {
        serializer.serialize_f64((value * 100.0).round() / 100.0)
    }
}
