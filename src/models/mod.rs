pub mod signal;
pub mod trade;

pub use signal::{AlphaSignal, SignalType, VolumeSignal, WhaleSignal};
pub use trade::TradeRecord;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Alert severity. Ordered so that `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Tier for a volume spike percentage. Independent of the trigger threshold.
    pub fn for_spike(spike_percentage: f64) -> Self {
        if spike_percentage >= 1000.0 {
            Severity::Critical
        } else if spike_percentage >= 500.0 {
            Severity::High
        } else if spike_percentage >= 300.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Tier for a whale's accumulated SOL.
    pub fn for_accumulation(total_sol: Decimal) -> Self {
        if total_sol >= Decimal::from(50) {
            Severity::Critical
        } else if total_sol >= Decimal::from(25) {
            Severity::High
        } else if total_sol >= Decimal::from(15) {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Some(Severity::Low),
            "MEDIUM" => Some(Severity::Medium),
            "HIGH" => Some(Severity::High),
            "CRITICAL" => Some(Severity::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First `n` characters of an address for display. Mints and traders are
/// opaque strings, so this cuts on char boundaries.
pub fn addr_prefix(addr: &str, n: usize) -> &str {
    match addr.char_indices().nth(n) {
        Some((end, _)) => &addr[..end],
        None => addr,
    }
}

/// Last `n` characters of an address.
pub fn addr_suffix(addr: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match addr.char_indices().rev().nth(n - 1) {
        Some((start, _)) => &addr[start..],
        None => addr,
    }
}
