pub mod console;
pub mod notifier;

pub use console::ConsoleSink;
pub use notifier::Notifier;

use crate::models::AlphaSignal;

/// Presentation side of the analyzer. Implementations must return quickly;
/// anything slow (network, disk) belongs on a spawned task.
pub trait SignalSink: Send + Sync {
    fn emit(&self, signal: &AlphaSignal);
    fn emit_cycle_summary(&self, signal_count: usize);
    fn emit_info(&self, message: &str);
    fn emit_error(&self, message: &str);
    fn emit_success(&self, message: &str);
}
