use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::analysis::batch::TradeBatch;
use crate::config::VolumeSpikeParams;
use crate::errors::DetectError;
use crate::models::{Severity, VolumeSignal};

/// Detect a buy-side volume spike for `mint`.
///
/// Windows relative to `now`:
/// - recent:   `[now - recent, now)`
/// - baseline: `[now - recent - baseline, now - recent)`
///
/// Only buys count. An empty baseline with recent activity is an infinite
/// spike; no activity in either window yields no signal.
pub fn detect_volume_spike(
    batch: &TradeBatch,
    mint: &str,
    params: &VolumeSpikeParams,
    now: DateTime<Utc>,
) -> Result<Option<VolumeSignal>, DetectError> {
    let out_of_range = |window: &'static str| DetectError::WindowOutOfRange {
        mint: mint.to_string(),
        window,
    };
    let recent_cutoff = now
        .checked_sub_signed(params.recent_window)
        .ok_or_else(|| out_of_range("recent"))?;
    let baseline_cutoff = recent_cutoff
        .checked_sub_signed(params.baseline_window)
        .ok_or_else(|| out_of_range("baseline"))?;

    let buys = batch.for_mint(mint).buys();
    let recent = buys.between(recent_cutoff, now).volume()?;
    let baseline = buys.between(baseline_cutoff, recent_cutoff).volume()?;

    let Some(spike_percentage) = spike_percentage(mint, recent.sol, baseline.sol)? else {
        return Ok(None);
    };

    if spike_percentage < params.threshold_percent {
        tracing::debug!(
            mint = %mint,
            recent = %recent.sol,
            baseline = %baseline.sol,
            spike_pct = spike_percentage,
            "Volume below spike threshold"
        );
        return Ok(None);
    }

    let severity = Severity::for_spike(spike_percentage);

    Ok(Some(VolumeSignal {
        timestamp: now,
        severity,
        mint: mint.to_string(),
        description: format!(
            "Volume spike detected: {:.1}% increase in last {} minutes",
            spike_percentage,
            params.recent_window.num_minutes(),
        ),
        recent_volume: recent.sol,
        baseline_volume: baseline.sol,
        spike_percentage,
        trade_count_recent: recent.count,
        trade_count_baseline: baseline.count,
    }))
}

/// `(recent - baseline) / baseline * 100`, `+inf` for a zero baseline with
/// recent volume, `None` when both are zero.
fn spike_percentage(
    mint: &str,
    recent: Decimal,
    baseline: Decimal,
) -> Result<Option<f64>, DetectError> {
    if baseline.is_zero() {
        return Ok(if recent > Decimal::ZERO {
            Some(f64::INFINITY)
        } else {
            None
        });
    }

    let unrepresentable = |reason: &str| DetectError::Unrepresentable {
        mint: mint.to_string(),
        reason: reason.to_string(),
    };

    let ratio = recent
        .checked_sub(baseline)
        .and_then(|delta| delta.checked_div(baseline))
        .ok_or_else(|| unrepresentable("ratio overflow"))?;

    // Multiply after converting so large ratios cannot overflow the decimal
    let pct = ratio
        .to_f64()
        .map(|r| r * 100.0)
        .filter(|p| p.is_finite())
        .ok_or_else(|| unrepresentable("not a finite float"))?;

    Ok(Some(pct))
}
