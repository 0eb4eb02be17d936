use chrono::Duration;
use rust_decimal::Decimal;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::errors::ConfigError;
use crate::models::Severity;

/// Upper bound for every window setting (30 days).
pub const MAX_WINDOW_MINUTES: i64 = 30 * 24 * 60;

/// Volume spike detector parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeSpikeParams {
    pub recent_window: Duration,
    /// Span immediately preceding the recent window.
    pub baseline_window: Duration,
    pub threshold_percent: f64,
}

impl Default for VolumeSpikeParams {
    fn default() -> Self {
        Self {
            recent_window: Duration::minutes(5),
            baseline_window: Duration::minutes(15),
            threshold_percent: 300.0,
        }
    }
}

/// Whale accumulation detector parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct WhaleParams {
    /// Window measured from the mint's first observed trade.
    pub first_window: Duration,
    pub sol_threshold: Decimal,
}

impl Default for WhaleParams {
    fn default() -> Self {
        Self {
            first_window: Duration::minutes(5),
            sol_threshold: Decimal::from(10),
        }
    }
}

/// Everything one analysis cycle needs besides its collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    pub lookback: Duration,
    pub volume: VolumeSpikeParams,
    pub whale: WhaleParams,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            lookback: Duration::minutes(20),
            volume: VolumeSpikeParams::default(),
            whale: WhaleParams::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,

    pub analysis_interval_secs: u64,
    pub analysis: AnalysisSettings,

    // Observability
    pub metrics_addr: Option<SocketAddr>,
    pub log_format: LogFormat,

    // Telegram alerts (optional)
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub alert_min_severity: Severity,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let lookback = window_or(&get, "LOOKBACK_MINUTES", 20)?;
        let recent_window = window_or(&get, "VOLUME_RECENT_MINUTES", 5)?;
        let baseline_window = window_or(&get, "VOLUME_BASELINE_MINUTES", 15)?;
        let threshold_percent: f64 = parse_or(&get, "VOLUME_SPIKE_THRESHOLD", 300.0)?;
        let first_window = window_or(&get, "WHALE_FIRST_MINUTES", 5)?;
        let whale_sol_threshold: Decimal =
            parse_or(&get, "WHALE_SOL_THRESHOLD", Decimal::from(10))?;

        let metrics_addr = match get("METRICS_ADDR") {
            Some(raw) => Some(raw.trim().parse().map_err(|_| ConfigError::Malformed {
                key: "METRICS_ADDR",
                value: raw,
            })?),
            None => None,
        };

        let log_format = match get("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Malformed {
                    key: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        let alert_min_severity = match get("ALERT_MIN_SEVERITY") {
            Some(raw) => Severity::from_str(&raw).ok_or(ConfigError::Malformed {
                key: "ALERT_MIN_SEVERITY",
                value: raw,
            })?,
            None => Severity::High,
        };

        let config = Self {
            database_url,
            db_max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 5)?,
            analysis_interval_secs: parse_or(&get, "ANALYSIS_INTERVAL_SECONDS", 30)?,
            analysis: AnalysisSettings {
                lookback,
                volume: VolumeSpikeParams {
                    recent_window,
                    baseline_window,
                    threshold_percent,
                },
                whale: WhaleParams {
                    first_window,
                    sol_threshold: whale_sol_threshold,
                },
            },
            metrics_addr,
            log_format,
            telegram_bot_token: get("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: get("TELEGRAM_CHAT_ID"),
            alert_min_severity,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let analysis = &self.analysis;
        let windows = [
            ("LOOKBACK_MINUTES", analysis.lookback),
            ("VOLUME_RECENT_MINUTES", analysis.volume.recent_window),
            ("VOLUME_BASELINE_MINUTES", analysis.volume.baseline_window),
            ("WHALE_FIRST_MINUTES", analysis.whale.first_window),
        ];
        for (key, window) in windows {
            if window <= Duration::zero() || window > Duration::minutes(MAX_WINDOW_MINUTES) {
                return Err(ConfigError::Invalid(format!(
                    "{key} must be between 1 and {MAX_WINDOW_MINUTES} minutes"
                )));
            }
        }

        if !analysis.volume.threshold_percent.is_finite() || analysis.volume.threshold_percent < 0.0 {
            return Err(ConfigError::Invalid(
                "VOLUME_SPIKE_THRESHOLD must be a non-negative number".into(),
            ));
        }
        if analysis.whale.sol_threshold.is_sign_negative() {
            return Err(ConfigError::Invalid(
                "WHALE_SOL_THRESHOLD must be non-negative".into(),
            ));
        }
        if self.analysis_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "ANALYSIS_INTERVAL_SECONDS must be at least 1".into(),
            ));
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::Invalid(
                "DB_MAX_CONNECTIONS must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Returns true if both Telegram credentials are configured.
    pub fn has_telegram(&self) -> bool {
        self.telegram_bot_token.is_some() && self.telegram_chat_id.is_some()
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Malformed { key, value: raw }),
        None => Ok(default),
    }
}

/// Parse a window given in minutes. Values chrono cannot hold are rejected
/// here; the range check itself happens in `validate`.
fn window_or<G>(get: &G, key: &'static str, default_minutes: i64) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let minutes: i64 = parse_or(get, key, default_minutes)?;
    Duration::try_minutes(minutes).ok_or_else(|| {
        ConfigError::Invalid(format!(
            "{key} must be between 1 and {MAX_WINDOW_MINUTES} minutes"
        ))
    })
}
