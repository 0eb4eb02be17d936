use anyhow::Context;
use serde::Serialize;

use crate::models::{addr_prefix, addr_suffix, AlphaSignal};

/// Payload of the Bot API `sendMessage` call.
#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

/// Pushes alpha signals to a Telegram chat.
#[derive(Debug, Clone)]
pub struct Notifier {
    http: reqwest::Client,
    endpoint: String,
    chat_id: String,
}

impl Notifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("https://api.telegram.org/bot{bot_token}/sendMessage"),
            chat_id,
        }
    }

    /// Deliver one signal. A failed delivery is logged and dropped; alerts
    /// are best effort and never retried.
    pub async fn alert(&self, signal: &AlphaSignal) {
        if let Err(e) = self.post(self.message_for(signal)).await {
            tracing::warn!(
                mint = %signal.mint(),
                signal_type = %signal.signal_type(),
                error = format!("{e:#}"),
                "Telegram alert not delivered"
            );
        }
    }

    fn message_for(&self, signal: &AlphaSignal) -> SendMessage<'_> {
        SendMessage {
            chat_id: &self.chat_id,
            text: format_signal(signal),
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        }
    }

    async fn post(&self, message: SendMessage<'_>) -> anyhow::Result<()> {
        self.http
            .post(&self.endpoint)
            .json(&message)
            .send()
            .await
            .context("sendMessage request failed")?
            .error_for_status()
            .context("sendMessage rejected")?;
        Ok(())
    }
}

fn short(addr: &str) -> String {
    if addr.chars().count() > 10 {
        format!("{}...{}", addr_prefix(addr, 6), addr_suffix(addr, 4))
    } else {
        addr.to_string()
    }
}

/// Format a signal as a Telegram Markdown message.
pub fn format_signal(signal: &AlphaSignal) -> String {
    match signal {
        AlphaSignal::Volume(s) => {
            let spike = if s.spike_percentage.is_infinite() {
                "new activity".to_string()
            } else {
                format!("+{:.1}%", s.spike_percentage)
            };
            format!(
                "*Volume Spike* ({})\nMint: `{}`\nSpike: {}\nRecent: {} SOL ({} buys)\nBaseline: {} SOL ({} buys)",
                s.severity,
                short(&s.mint),
                spike,
                s.recent_volume.round_dp(2),
                s.trade_count_recent,
                s.baseline_volume.round_dp(2),
                s.trade_count_baseline,
            )
        }
        AlphaSignal::Whale(s) => {
            let cap = s
                .estimated_market_cap
                .map(|c| format!("{} SOL", c.round_dp(2)))
                .unwrap_or_else(|| "n/a".into());
            format!(
                "*Whale Watch* ({})\nMint: `{}`\nWallet: `{}`\nAccumulated: {} SOL over {} buys\nCurve reserve: {}",
                s.severity,
                short(&s.mint),
                short(&s.trader_address),
                s.total_accumulated.round_dp(2),
                s.trade_count,
                cap,
            )
        }
    }
}
