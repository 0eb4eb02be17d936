/// Failure of a single detector for a single mint.
///
/// The orchestrator logs these and moves on to the next mint.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("decimal overflow summing {field} for mint {mint}")]
    Overflow { mint: String, field: &'static str },

    #[error("spike percentage for mint {mint} is not representable: {reason}")]
    Unrepresentable { mint: String, reason: String },

    #[error("{window} window for mint {mint} falls outside the representable time range")]
    WindowOutOfRange { mint: String, window: &'static str },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value {value:?}")]
    Malformed { key: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
