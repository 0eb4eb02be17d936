use std::time::Instant;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use metrics::{counter, gauge, histogram};

use crate::analysis::batch::TradeBatch;
use crate::analysis::volume::detect_volume_spike;
use crate::analysis::whale::detect_whale_accumulation;
use crate::config::AnalysisSettings;
use crate::models::AlphaSignal;
use crate::output::SignalSink;

/// Read side of the trade store.
#[async_trait]
pub trait TradeSource: Send + Sync {
    /// Trades observed within `lookback` of now, newest first. An empty
    /// window is an empty batch, not an error.
    async fn fetch_trade_batch(&self, lookback: Duration) -> anyhow::Result<TradeBatch>;

    /// Distinct mints with at least one trade within `lookback`.
    async fn list_active_mints(&self, lookback: Duration) -> anyhow::Result<Vec<String>>;
}

/// Runs both detectors over every active mint and forwards what they find.
pub struct Analyzer<S, K> {
    source: S,
    sink: K,
    settings: AnalysisSettings,
}

impl<S: TradeSource, K: SignalSink> Analyzer<S, K> {
    pub fn new(source: S, sink: K, settings: AnalysisSettings) -> Self {
        Self {
            source,
            sink,
            settings,
        }
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Fetch a fresh batch and analyze it.
    ///
    /// Storage failures abort the cycle and are returned to the caller.
    /// Detector failures are contained to the mint that raised them.
    pub async fn run_cycle(&self) -> anyhow::Result<Vec<AlphaSignal>> {
        let start = Instant::now();
        let lookback = self.settings.lookback;

        let batch = self
            .source
            .fetch_trade_batch(lookback)
            .await
            .context("failed to fetch trade batch")?;

        let mints = self
            .source
            .list_active_mints(lookback)
            .await
            .context("failed to list active mints")?;

        tracing::debug!(
            trades = batch.len(),
            mints = mints.len(),
            "Trade batch loaded"
        );

        let signals = self.analyze(&batch, &mints, Utc::now());

        histogram!("analysis_cycle_seconds").record(start.elapsed().as_secs_f64());
        Ok(signals)
    }

    /// Analyze `mints` in the given order against `batch` as of `now`.
    ///
    /// Output order is volume then whale signals for the first mint, then the
    /// next mint, and so on.
    pub fn analyze(
        &self,
        batch: &TradeBatch,
        mints: &[String],
        now: DateTime<Utc>,
    ) -> Vec<AlphaSignal> {
        let mut signals: Vec<AlphaSignal> = Vec::new();

        gauge!("active_mints").set(mints.len() as f64);

        if mints.is_empty() {
            self.sink.emit_info("No active tokens in lookback window");
            return signals;
        }

        self.sink
            .emit_info(&format!("Analyzing {} active tokens...", mints.len()));

        for mint in mints {
            match detect_volume_spike(batch, mint, &self.settings.volume, now) {
                Ok(Some(signal)) => self.publish(signal.into(), &mut signals),
                Ok(None) => {}
                Err(e) => self.detector_failed("volume", mint, &e),
            }

            match detect_whale_accumulation(batch, mint, &self.settings.whale, now) {
                Ok(whales) => {
                    for signal in whales {
                        self.publish(signal.into(), &mut signals);
                    }
                }
                Err(e) => self.detector_failed("whale", mint, &e),
            }
        }

        if signals.is_empty() {
            self.sink.emit_info("No alpha signals detected in this cycle");
        } else {
            self.sink.emit_cycle_summary(signals.len());
        }

        signals
    }

    fn publish(&self, signal: AlphaSignal, signals: &mut Vec<AlphaSignal>) {
        counter!(
            "signals_emitted_total",
            "signal_type" => signal.signal_type().as_str(),
            "severity" => signal.severity().as_str()
        )
        .increment(1);

        self.sink.emit(&signal);
        signals.push(signal);
    }

    fn detector_failed(&self, detector: &'static str, mint: &str, error: &dyn std::error::Error) {
        tracing::error!(
            detector = detector,
            mint = %mint,
            error = %error,
            "Detector failed, skipping mint"
        );
        counter!("detector_failures_total", "detector" => detector).increment(1);
        self.sink
            .emit_error(&format!("{detector} detector failed for {mint}: {error}"));
    }
}
