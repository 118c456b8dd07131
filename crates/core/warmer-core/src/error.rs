//! Error types for the warmer

use thiserror::Error;

/// Warmer result type
pub type Result<T> = std::result::Result<T, WarmerError>;

/// Code reported for [`WarmerError::NotWarmerEvent`]
pub const ERR_CODE_NOT_WARMER_EVENT: &str = "NotWarmerEvent";

/// Errors that can occur while warming
#[derive(Error, Debug)]
pub enum WarmerError {
    /// The invocation carried ordinary traffic, not a warming ping
    #[error("not a lambda warmer event")]
    NotWarmerEvent,

    /// Transport failure while invoking a descendant
    #[error("Invoke error: {0}")]
    Invoke(String),

    /// The invoked function ran but reported an error
    #[error("Function {function} returned {kind}")]
    FunctionError { function: String, kind: String },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Log sink could not accept a record
    #[error("Log sink error: {0}")]
    LogSink(String),
}

impl WarmerError {
    /// Create an invoke error
    pub fn invoke(msg: impl Into<String>) -> Self {
        Self::Invoke(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Convert from any displayable transport error
    pub fn from_transport<E>(err: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::Invoke(err.to_string())
    }

    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotWarmerEvent => ERR_CODE_NOT_WARMER_EVENT,
            Self::Invoke(_) => "InvokeError",
            Self::FunctionError { .. } => "FunctionError",
            Self::Serialization(_) => "SerializationError",
            Self::Config(_) => "ConfigError",
            Self::LogSink(_) => "LogSinkError",
        }
    }
}
