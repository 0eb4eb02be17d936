pub mod scheduler;

pub use scheduler::run_analysis_loop;
