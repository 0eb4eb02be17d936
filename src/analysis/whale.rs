use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::analysis::batch::{TradeBatch, TraderAggregate};
use crate::config::WhaleParams;
use crate::errors::DetectError;
use crate::models::{addr_prefix, Severity, WhaleSignal};

/// Detect traders who bought at least `sol_threshold` SOL of `mint` within
/// `first_window` of its first observed trade.
///
/// The first trade in the batch stands in for the launch. The window is
/// inclusive at both ends: `[launch, launch + first_window]`. Sells never
/// count toward accumulation. One signal per qualifying trader.
pub fn detect_whale_accumulation(
    batch: &TradeBatch,
    mint: &str,
    params: &WhaleParams,
    now: DateTime<Utc>,
) -> Result<Vec<WhaleSignal>, DetectError> {
    let trades = batch.for_mint(mint);
    let Some(launch) = trades.first_observed() else {
        return Ok(Vec::new());
    };
    let window_end = launch.checked_add_signed(params.first_window).ok_or_else(|| {
        DetectError::WindowOutOfRange {
            mint: mint.to_string(),
            window: "first",
        }
    })?;

    let early_buys = trades.through(launch, window_end).buys();
    if early_buys.is_empty() {
        return Ok(Vec::new());
    }

    let whales: Vec<WhaleSignal> = early_buys
        .group_by_trader()?
        .into_iter()
        .filter(|agg| agg.total_sol >= params.sol_threshold)
        .map(|agg| whale_signal(mint, agg, params, now))
        .collect();

    if !whales.is_empty() {
        tracing::debug!(
            mint = %mint,
            launch = %launch,
            whales = whales.len(),
            "Early accumulation found"
        );
    }

    Ok(whales)
}

fn whale_signal(
    mint: &str,
    agg: TraderAggregate,
    params: &WhaleParams,
    now: DateTime<Utc>,
) -> WhaleSignal {
    let estimated_market_cap = estimate_market_cap(agg.last_sol_reserves, agg.last_token_reserves);

    WhaleSignal {
        timestamp: now,
        severity: Severity::for_accumulation(agg.total_sol),
        mint: mint.to_string(),
        description: format!(
            "Whale detected: {}... accumulated {} SOL in first {} minutes",
            addr_prefix(&agg.trader, 8),
            agg.total_sol.round_dp(2),
            params.first_window.num_minutes(),
        ),
        trader_address: agg.trader,
        total_accumulated: agg.total_sol,
        total_tokens_accumulated: agg.total_tokens,
        trade_count: agg.trade_count,
        first_trade_at: agg.first_trade_at,
        last_trade_at: agg.last_trade_at,
        estimated_market_cap,
    }
}

/// Bonding-curve SOL reserve used directly as a liquidity-based cap proxy.
/// Needs both reserves present and non-zero.
fn estimate_market_cap(sol_reserves: Option<Decimal>, token_reserves: Option<Decimal>) -> Option<Decimal> {
    match (sol_reserves, token_reserves) {
        (Some(sol), Some(tokens)) if !sol.is_zero() && !tokens.is_zero() => Some(sol),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
