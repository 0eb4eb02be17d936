use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::models::{Severity, SignalType};

/// Install the Prometheus exporter with its own HTTP listener on `addr`
/// and register all application metrics.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    register_series();

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}

fn register_series() {
    // Pre-register counters so they appear even before the first increment.
    counter!("analysis_cycles_total").absolute(0);
    counter!("analysis_cycle_failures_total").absolute(0);
    for detector in ["volume", "whale"] {
        counter!("detector_failures_total", "detector" => detector).absolute(0);
    }
    for signal_type in [SignalType::VolumeSpike, SignalType::WhaleWatch] {
        for severity in [Severity::Low, Severity::Medium, Severity::High, Severity::Critical] {
            counter!(
                "signals_emitted_total",
                "signal_type" => signal_type.as_str(),
                "severity" => severity.as_str()
            )
            .absolute(0);
        }
    }

    gauge!("active_mints").set(0.0);

    // Histogram is lazily created on first record; force creation.
    histogram!("analysis_cycle_seconds").record(0.0);
}
