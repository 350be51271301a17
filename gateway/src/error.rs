//! Error taxonomy for the `gateway` binary (spec §7 taxonomy, narrowed to
//! process-level concerns: config loading, startup, and the HTTP listener).

/// Top-level error surfaced by gateway commands.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration load/save/validation failure.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
    /// Engine-level failure (rule set load, persistence, mailbox overload).
    #[error(transparent)]
    Engine(#[from] engine::error::EngineError),
    /// I/O failure outside configuration handling (e.g. binding the listener).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for gateway commands.
pub type Result<T> = std::result::Result<T, GatewayError>;
