pub mod analyzer;
pub mod batch;
pub mod volume;
pub mod whale;

pub use analyzer::{Analyzer, TradeSource};
pub use batch::{TradeBatch, TradeView, TraderAggregate, VolumeStats};
pub use volume::detect_volume_spike;
pub use whale::detect_whale_accumulation;
