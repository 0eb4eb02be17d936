pub mod analysis;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod output;
pub mod services;

pub use analysis::{Analyzer, TradeBatch, TradeSource};
pub use config::{AnalysisSettings, AppConfig, VolumeSpikeParams, WhaleParams};
pub use output::SignalSink;
