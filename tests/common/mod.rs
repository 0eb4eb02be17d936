use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

use alphascan::analysis::{TradeBatch, TradeSource};
use alphascan::models::{AlphaSignal, TradeRecord};
use alphascan::output::SignalSink;

#[allow(dead_code)]
pub fn make_trade(
    mint: &str,
    trader: &str,
    is_buy: bool,
    sol: Decimal,
    at: DateTime<Utc>,
) -> TradeRecord {
    TradeRecord {
        observed_at: at,
        mint: mint.to_string(),
        trader: trader.to_string(),
        is_buy,
        sol_amount: sol,
        token_amount: sol * Decimal::from(30_000),
        virtual_sol_reserves: Some(Decimal::from(30) + sol),
        virtual_token_reserves: Some(Decimal::from(1_073_000_000)),
    }
}

/// A buy placed `mins_ago` minutes before `now`.
#[allow(dead_code)]
pub fn buy_ago(mint: &str, trader: &str, sol: i64, now: DateTime<Utc>, mins_ago: i64) -> TradeRecord {
    make_trade(mint, trader, true, Decimal::from(sol), now - Duration::minutes(mins_ago))
}

/// In-memory trade store.
#[allow(dead_code)]
pub struct MemorySource {
    trades: Vec<TradeRecord>,
    mints: Option<Vec<String>>,
    failing_fetches: u32,
    cancel_on_fetch: Option<(u32, CancellationToken)>,
    fetches: AtomicU32,
}

#[allow(dead_code)]
impl MemorySource {
    pub fn new(trades: Vec<TradeRecord>) -> Self {
        Self {
            trades,
            mints: None,
            failing_fetches: 0,
            cancel_on_fetch: None,
            fetches: AtomicU32::new(0),
        }
    }

    /// Report exactly these mints instead of deriving them from the trades.
    pub fn with_mints(mut self, mints: &[&str]) -> Self {
        self.mints = Some(mints.iter().map(|m| m.to_string()).collect());
        self
    }

    /// Fail the first `n` fetches with a storage error.
    pub fn failing_first(mut self, n: u32) -> Self {
        self.failing_fetches = n;
        self
    }

    /// Cancel `token` while serving fetch number `n` (1-based).
    pub fn cancel_on_fetch(mut self, n: u32, token: CancellationToken) -> Self {
        self.cancel_on_fetch = Some((n, token));
        self
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TradeSource for MemorySource {
    async fn fetch_trade_batch(&self, lookback: Duration) -> anyhow::Result<TradeBatch> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some((at, token)) = &self.cancel_on_fetch {
            if n == *at {
                token.cancel();
            }
        }
        if n <= self.failing_fetches {
            anyhow::bail!("connection refused");
        }

        let cutoff = Utc::now() - lookback;
        let trades = self
            .trades
            .iter()
            .filter(|t| t.observed_at >= cutoff)
            .cloned()
            .collect();
        Ok(TradeBatch::new(trades))
    }

    async fn list_active_mints(&self, lookback: Duration) -> anyhow::Result<Vec<String>> {
        if let Some(mints) = &self.mints {
            return Ok(mints.clone());
        }
        let cutoff = Utc::now() - lookback;
        let recent: Vec<TradeRecord> = self
            .trades
            .iter()
            .filter(|t| t.observed_at >= cutoff)
            .cloned()
            .collect();
        Ok(TradeBatch::new(recent).mints())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
pub enum Event {
    Signal(AlphaSignal),
    Summary(usize),
    Info(String),
    Error(String),
    Success(String),
}

/// Sink that records everything it is given.
#[derive(Default)]
#[allow(dead_code)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn signals(&self) -> Vec<AlphaSignal> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Signal(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Error(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn infos(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Info(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl SignalSink for RecordingSink {
    fn emit(&self, signal: &AlphaSignal) {
        self.push(Event::Signal(signal.clone()));
    }

    fn emit_cycle_summary(&self, signal_count: usize) {
        self.push(Event::Summary(signal_count));
    }

    fn emit_info(&self, message: &str) {
        self.push(Event::Info(message.to_string()));
    }

    fn emit_error(&self, message: &str) {
        self.push(Event::Error(message.to_string()));
    }

    fn emit_success(&self, message: &str) {
        self.push(Event::Success(message.to_string()));
    }
}
