//! Shared error type across tickmeter crates.

use thiserror::Error;

/// Stable error codes (used in log fields and asserted by tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Configuration could not be parsed or failed validation.
    BadConfig,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Manager loops are already running.
    AlreadyRunning,
    /// No async runtime available to spawn the loops on.
    NoRuntime,
    /// Filesystem failure.
    Io,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::AlreadyRunning => "ALREADY_RUNNING",
            ErrorCode::NoRuntime => "NO_RUNTIME",
            ErrorCode::Io => "IO",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, TickError>;

/// Unified error type used by core and agent.
#[derive(Debug, Error)]
pub enum TickError {
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("metric manager already running")]
    AlreadyRunning,
    #[error("no async runtime: {0}")]
    NoRuntime(String),
    #[error("io: {0}")]
    Io(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl TickError {
    /// Map to the stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            TickError::BadConfig(_) => ErrorCode::BadConfig,
            TickError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            TickError::AlreadyRunning => ErrorCode::AlreadyRunning,
            TickError::NoRuntime(_) => ErrorCode::NoRuntime,
            TickError::Io(_) => ErrorCode::Io,
            TickError::Internal(_) => ErrorCode::Internal,
        }
    }
}
