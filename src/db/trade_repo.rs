use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use crate::analysis::{TradeBatch, TradeSource};
use crate::models::TradeRecord;

/// All PumpFun trades observed at or after `since`, newest first.
pub async fn fetch_recent_trades(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> anyhow::Result<Vec<TradeRecord>> {
    let trades = sqlx::query_as::<_, TradeRecord>(
        r#"
        SELECT observed_at, mint, trader, is_buy, sol_amount, token_amount,
               virtual_sol_reserves, virtual_token_reserves
        FROM pumpfun_trades
        WHERE observed_at >= $1
        ORDER BY observed_at DESC
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(trades)
}

/// Distinct mints traded at or after `since`.
pub async fn list_active_mints(pool: &PgPool, since: DateTime<Utc>) -> anyhow::Result<Vec<String>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT DISTINCT mint FROM pumpfun_trades WHERE observed_at >= $1")
            .bind(since)
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(|(mint,)| mint).collect())
}

/// Insert one trade. Used by tests and backfill tooling; the live feed writes
/// this table directly.
pub async fn insert_trade(
    pool: &PgPool,
    tx_signature: &str,
    slot: i64,
    trade: &TradeRecord,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO pumpfun_trades (
            tx_signature, slot, observed_at, mint, trader, is_buy,
            sol_amount, token_amount, virtual_sol_reserves, virtual_token_reserves
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(tx_signature)
    .bind(slot)
    .bind(trade.observed_at)
    .bind(&trade.mint)
    .bind(&trade.trader)
    .bind(trade.is_buy)
    .bind(trade.sol_amount)
    .bind(trade.token_amount)
    .bind(trade.virtual_sol_reserves)
    .bind(trade.virtual_token_reserves)
    .execute(pool)
    .await?;

    Ok(())
}

/// [`TradeSource`] backed by the pumpfun_trades table.
#[derive(Clone)]
pub struct PgTradeSource {
    pool: PgPool,
}

impl PgTradeSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TradeSource for PgTradeSource {
    async fn fetch_trade_batch(&self, lookback: Duration) -> anyhow::Result<TradeBatch> {
        let trades = fetch_recent_trades(&self.pool, lookback_start(lookback)?).await?;
        Ok(TradeBatch::new(trades))
    }

    async fn list_active_mints(&self, lookback: Duration) -> anyhow::Result<Vec<String>> {
        list_active_mints(&self.pool, lookback_start(lookback)?).await
    }
}

fn lookback_start(lookback: Duration) -> anyhow::Result<DateTime<Utc>> {
    Utc::now()
        .checked_sub_signed(lookback)
        .with_context(|| format!("lookback of {lookback} reaches before the representable time range"))
}
