//! Error types for the citeproxy core.

use thiserror::Error;

/// Result type alias for orchestration and backend calls.
pub type ProxyResult<T> = Result<T, ProxyError>;

/// Errors that abort a chat request.
///
/// Citation lookups never surface here; they fall back to placeholder labels
/// and the unknown page marker instead.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("no question was provided")]
    InvalidInput,

    #[error("{operation} failed with HTTP {status}: {body}")]
    Upstream {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("{operation} request failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} response could not be decoded: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Run {status}: {message}")]
    RunFailed { status: String, message: String },

    #[error("no assistant reply in thread {thread_id}")]
    NoAnswer { thread_id: String },

    #[error("run did not finish after {attempts} status checks")]
    PollTimeout { attempts: u32 },

    #[error("request cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// True for caller mistakes (empty question), false for server-side failures.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ProxyError::InvalidInput)
    }
}

/// Startup configuration errors. The gateway exits non-zero on any of these.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}
