use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::models::{AlphaSignal, Severity};
use crate::output::notifier::Notifier;
use crate::output::SignalSink;

/// Writes signals and status lines through `tracing`, optionally forwarding
/// severe signals to Telegram.
pub struct ConsoleSink {
    signal_count: AtomicU64,
    notifier: Option<Arc<Notifier>>,
    alert_min_severity: Severity,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            signal_count: AtomicU64::new(0),
            notifier: None,
            alert_min_severity: Severity::High,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<Notifier>, min_severity: Severity) -> Self {
        self.notifier = Some(notifier);
        self.alert_min_severity = min_severity;
        self
    }

    /// Signals emitted since startup.
    pub fn signal_count(&self) -> u64 {
        self.signal_count.load(Ordering::Relaxed)
    }

    pub fn log_startup(&self, version: &str, interval_secs: u64) {
        tracing::info!(
            version = %version,
            interval_secs = interval_secs,
            "alphascan starting: volume spike and whale accumulation scanner"
        );
    }

    pub fn log_shutdown(&self) {
        tracing::info!(
            total_signals = self.signal_count(),
            "Shutting down, {} signals detected this session",
            self.signal_count()
        );
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalSink for ConsoleSink {
    fn emit(&self, signal: &AlphaSignal) {
        self.signal_count.fetch_add(1, Ordering::Relaxed);

        let body = serde_json::to_string_pretty(signal)
            .unwrap_or_else(|e| format!("<unserializable signal: {e}>"));

        if signal.severity() >= Severity::High {
            tracing::warn!(
                signal_type = %signal.signal_type(),
                severity = %signal.severity(),
                mint = %signal.mint(),
                "{}\n{}",
                signal.description(),
                body
            );
        } else {
            tracing::info!(
                signal_type = %signal.signal_type(),
                severity = %signal.severity(),
                mint = %signal.mint(),
                "{}\n{}",
                signal.description(),
                body
            );
        }

        if let Some(notifier) = &self.notifier {
            if signal.severity() >= self.alert_min_severity {
                // Fire and forget; the notifier logs its own failures
                match tokio::runtime::Handle::try_current() {
                    Ok(handle) => {
                        let notifier = Arc::clone(notifier);
                        let signal = signal.clone();
                        handle.spawn(async move {
                            notifier.alert(&signal).await;
                        });
                    }
                    Err(_) => tracing::warn!("No async runtime, Telegram alert dropped"),
                }
            }
        }
    }

    fn emit_cycle_summary(&self, signal_count: usize) {
        tracing::info!(signals = signal_count, "Analysis cycle complete");
    }

    fn emit_info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn emit_error(&self, message: &str) {
        tracing::error!("{message}");
    }

    fn emit_success(&self, message: &str) {
        tracing::info!(status = "ok", "{message}");
    }
}
