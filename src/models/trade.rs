use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use super::addr_prefix;

/// Database row for the pumpfun_trades table.
///
/// Reserves are optional so that rows written by older feed versions (or
/// partially decoded instructions) still load.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TradeRecord {
    pub observed_at: DateTime<Utc>,
    pub mint: String,
    pub trader: String,
    pub is_buy: bool,
    pub sol_amount: Decimal,
    pub token_amount: Decimal,
    pub virtual_sol_reserves: Option<Decimal>,
    pub virtual_token_reserves: Option<Decimal>,
}

impl fmt::Display for TradeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trade: {} {} SOL for {} tokens of {} by {}",
            if self.is_buy { "BUY" } else { "SELL" },
            self.sol_amount,
            self.token_amount,
            addr_prefix(&self.mint, 8),
            addr_prefix(&self.trader, 8),
        )
    }
}
