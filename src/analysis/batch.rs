use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::errors::DetectError;
use crate::models::TradeRecord;

/// Read-only snapshot of trades fetched for one analysis cycle.
///
/// Records are kept in the order the store returned them. An index by mint
/// is built once so per-mint queries do not rescan the whole batch.
#[derive(Debug, Clone, Default)]
pub struct TradeBatch {
    trades: Vec<TradeRecord>,
    by_mint: HashMap<String, Vec<usize>>,
}

impl TradeBatch {
    pub fn new(trades: Vec<TradeRecord>) -> Self {
        let mut by_mint: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, trade) in trades.iter().enumerate() {
            by_mint.entry(trade.mint.clone()).or_default().push(idx);
        }
        Self { trades, by_mint }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    /// Distinct mints in first-seen order.
    pub fn mints(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.trades
            .iter()
            .filter(|t| seen.insert(t.mint.as_str()))
            .map(|t| t.mint.clone())
            .collect()
    }

    /// All trades for `mint`. Empty view when the mint is absent.
    pub fn for_mint<'a>(&'a self, mint: &'a str) -> TradeView<'a> {
        let trades = self
            .by_mint
            .get(mint)
            .map(|idxs| idxs.iter().map(|&i| &self.trades[i]).collect())
            .unwrap_or_default();
        TradeView { mint, trades }
    }
}

/// Filtered view over one mint's trades. Filters return new views and never
/// touch the underlying batch.
#[derive(Debug, Clone)]
pub struct TradeView<'a> {
    mint: &'a str,
    trades: Vec<&'a TradeRecord>,
}

impl<'a> TradeView<'a> {
    pub fn mint(&self) -> &'a str {
        self.mint
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a TradeRecord> + '_ {
        self.trades.iter().copied()
    }

    fn filter<P>(&self, mut pred: P) -> TradeView<'a>
    where
        P: FnMut(&TradeRecord) -> bool,
    {
        TradeView {
            mint: self.mint,
            trades: self.trades.iter().copied().filter(|t| pred(*t)).collect(),
        }
    }

    /// Trades with `start <= observed_at < end`.
    pub fn between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> TradeView<'a> {
        self.filter(|t| t.observed_at >= start && t.observed_at < end)
    }

    /// Trades with `start <= observed_at <= end`.
    pub fn through(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> TradeView<'a> {
        self.filter(|t| t.observed_at >= start && t.observed_at <= end)
    }

    pub fn buys(&self) -> TradeView<'a> {
        self.filter(|t| t.is_buy)
    }

    pub fn sells(&self) -> TradeView<'a> {
        self.filter(|t| !t.is_buy)
    }

    /// Earliest `observed_at` in the view.
    pub fn first_observed(&self) -> Option<DateTime<Utc>> {
        self.trades.iter().map(|t| t.observed_at).min()
    }

    /// Summed SOL volume and trade count.
    pub fn volume(&self) -> Result<VolumeStats, DetectError> {
        let mut stats = VolumeStats::default();
        for trade in &self.trades {
            stats.sol = stats
                .sol
                .checked_add(trade.sol_amount)
                .ok_or_else(|| self.overflow("sol_amount"))?;
            stats.count += 1;
        }
        Ok(stats)
    }

    /// Per-trader aggregates, largest SOL total first (ties by trader).
    pub fn group_by_trader(&self) -> Result<Vec<TraderAggregate>, DetectError> {
        let mut groups: HashMap<&str, TraderAggregate> = HashMap::new();

        for trade in &self.trades {
            match groups.get_mut(trade.trader.as_str()) {
                None => {
                    groups.insert(trade.trader.as_str(), TraderAggregate::start(trade));
                }
                Some(agg) => {
                    agg.total_sol = agg
                        .total_sol
                        .checked_add(trade.sol_amount)
                        .ok_or_else(|| self.overflow("sol_amount"))?;
                    agg.total_tokens = agg
                        .total_tokens
                        .checked_add(trade.token_amount)
                        .ok_or_else(|| self.overflow("token_amount"))?;
                    agg.trade_count += 1;
                    agg.first_trade_at = agg.first_trade_at.min(trade.observed_at);
                    if trade.observed_at >= agg.last_trade_at {
                        agg.last_trade_at = trade.observed_at;
                        agg.last_sol_reserves = trade.virtual_sol_reserves;
                        agg.last_token_reserves = trade.virtual_token_reserves;
                    }
                }
            }
        }

        let mut aggregates: Vec<TraderAggregate> = groups.into_values().collect();
        aggregates.sort_by(|a, b| {
            b.total_sol
                .cmp(&a.total_sol)
                .then_with(|| a.trader.cmp(&b.trader))
        });
        Ok(aggregates)
    }

    fn overflow(&self, field: &'static str) -> DetectError {
        DetectError::Overflow {
            mint: self.mint.to_string(),
            field,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VolumeStats {
    pub sol: Decimal,
    pub count: u64,
}

/// One trader's activity inside a view.
#[derive(Debug, Clone, PartialEq)]
pub struct TraderAggregate {
    pub trader: String,
    pub total_sol: Decimal,
    pub total_tokens: Decimal,
    pub trade_count: u64,
    pub first_trade_at: DateTime<Utc>,
    pub last_trade_at: DateTime<Utc>,
    /// Reserves from the chronologically last trade.
    pub last_sol_reserves: Option<Decimal>,
    pub last_token_reserves: Option<Decimal>,
}

impl TraderAggregate {
    fn start(trade: &TradeRecord) -> Self {
        Self {
            trader: trade.trader.clone(),
            total_sol: trade.sol_amount,
            total_tokens: trade.token_amount,
            trade_count: 1,
            first_trade_at: trade.observed_at,
            last_trade_at: trade.observed_at,
            last_sol_reserves: trade.virtual_sol_reserves,
            last_token_reserves: trade.virtual_token_reserves,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn make_trade(mint: &str, trader: &str, is_buy: bool, sol: i64, secs: i64) -> TradeRecord {
        TradeRecord {
            observed_at: t0() + Duration::seconds(secs),
            mint: mint.to_string(),
            trader: trader.to_string(),
            is_buy,
            sol_amount: Decimal::from(sol),
            token_amount: Decimal::from(sol * 1_000),
            virtual_sol_reserves: Some(Decimal::from(30 + secs)),
            virtual_token_reserves: Some(Decimal::from(1_000_000)),
        }
    }

    #[test]
    fn test_for_mint_and_distinct_mints() {
        let batch = TradeBatch::new(vec![
            make_trade("mint_b", "alice", true, 1, 30),
            make_trade("mint_a", "alice", true, 2, 20),
            make_trade("mint_b", "bob", false, 3, 10),
        ]);

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.mints(), vec!["mint_b".to_string(), "mint_a".to_string()]);
        assert_eq!(batch.for_mint("mint_b").len(), 2);
        assert_eq!(batch.for_mint("mint_a").len(), 1);
        assert!(batch.for_mint("missing").is_empty());
        assert!(TradeBatch::empty().is_empty());
    }

    #[test]
    fn test_window_filters() {
        let batch = TradeBatch::new(vec![
            make_trade("mint", "a", true, 1, 0),
            make_trade("mint", "a", true, 1, 60),
            make_trade("mint", "a", false, 1, 120),
        ]);
        let view = batch.for_mint("mint");
        let end = t0() + Duration::seconds(60);

        assert_eq!(view.between(t0(), end).len(), 1);
        assert_eq!(view.through(t0(), end).len(), 2);
        assert_eq!(view.buys().len(), 2);
        assert_eq!(view.sells().len(), 1);
        assert_eq!(view.first_observed(), Some(t0()));
    }

    #[test]
    fn test_volume_sums_duplicates() {
        let trade = make_trade("mint", "a", true, 4, 0);
        let batch = TradeBatch::new(vec![trade.clone(), trade]);

        let stats = batch.for_mint("mint").volume().unwrap();
        assert_eq!(stats.sol, Decimal::from(8));
        assert_eq!(stats.count, 2);
    }

    #[test]
    fn test_volume_overflow_is_an_error() {
        let mut big = make_trade("mint", "a", true, 0, 0);
        big.sol_amount = Decimal::MAX;
        let batch = TradeBatch::new(vec![big.clone(), big]);

        let err = batch.for_mint("mint").volume().unwrap_err();
        assert!(matches!(err, DetectError::Overflow { field: "sol_amount", .. }));
    }

    #[test]
    fn test_group_by_trader() {
        // Store order is newest first
        let batch = TradeBatch::new(vec![
            make_trade("mint", "alice", true, 5, 90),
            make_trade("mint", "bob", true, 20, 45),
            make_trade("mint", "alice", true, 3, 10),
        ]);

        let groups = batch.for_mint("mint").group_by_trader().unwrap();
        assert_eq!(groups.len(), 2);

        assert_eq!(groups[0].trader, "bob");
        assert_eq!(groups[0].trade_count, 1);

        let alice = &groups[1];
        assert_eq!(alice.total_sol, Decimal::from(8));
        assert_eq!(alice.total_tokens, Decimal::from(8_000));
        assert_eq!(alice.trade_count, 2);
        assert_eq!(alice.first_trade_at, t0() + Duration::seconds(10));
        assert_eq!(alice.last_trade_at, t0() + Duration::seconds(90));
        // Reserves follow the chronologically last trade, not the last row
        assert_eq!(alice.last_sol_reserves, Some(Decimal::from(120)));
    }
}
