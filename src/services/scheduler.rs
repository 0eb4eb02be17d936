use std::time::Duration;

use metrics::counter;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::analysis::{Analyzer, TradeSource};
use crate::output::SignalSink;

/// Run analysis cycles until `shutdown` is cancelled.
///
/// Each cycle runs to completion; cancellation is only observed between
/// cycles, where the idle wait races `interval` against the token. A failed
/// cycle is logged and the next one is scheduled as usual.
///
/// Returns the number of cycles started.
pub async fn run_analysis_loop<S, K>(
    analyzer: &Analyzer<S, K>,
    interval: Duration,
    shutdown: CancellationToken,
) -> u64
where
    S: TradeSource,
    K: SignalSink,
{
    tracing::info!(
        interval_secs = interval.as_secs_f64(),
        "Analysis loop started"
    );

    let mut cycle: u64 = 0;

    while !shutdown.is_cancelled() {
        cycle += 1;
        analyzer
            .sink()
            .emit_info(&format!("Starting analysis cycle #{cycle}"));
        counter!("analysis_cycles_total").increment(1);

        if let Err(e) = analyzer.run_cycle().await {
            counter!("analysis_cycle_failures_total").increment(1);
            tracing::error!(cycle = cycle, error = ?e, "Analysis cycle failed");
            analyzer
                .sink()
                .emit_error(&format!("Analysis cycle #{cycle} failed: {e:#}"));
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = sleep(interval) => {}
        }
    }

    tracing::info!(cycles = cycle, "Analysis loop stopped");
    cycle
}
