//! Quota Error Types
//!
//! Every failure in the crate surfaces as one of three kinds. Underlying
//! messages are preserved; nothing is swallowed or retried.

/// Error kinds returned by all quota operations
#[derive(Debug, thiserror::Error)]
pub enum QuotaError {
    /// Network, authentication, or endpoint failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response shape mismatch (missing field, wrong type)
    #[error("Parse error: {0}")]
    Parse(String),

    /// License grant source unreachable or allotment not computable
    #[error("Quota evaluation error: {0}")]
    QuotaEvaluation(String),
}

impl QuotaError {
    /// Whether this error came from the transport layer
    pub fn is_transport(&self) -> bool {
        matches!(self, QuotaError::Transport(_))
    }

    /// Whether this error came from response parsing
    pub fn is_parse(&self) -> bool {
        matches!(self, QuotaError::Parse(_))
    }

    /// Whether this error came from license evaluation
    pub fn is_quota_evaluation(&self) -> bool {
        matches!(self, QuotaError::QuotaEvaluation(_))
    }
}

impl From<reqwest::Error> for QuotaError {
    fn from(err: reqwest::Error) -> Self {
        QuotaError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for QuotaError {
    fn from(err: serde_json::Error) -> Self {
        QuotaError::Parse(err.to_string())
    }
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, QuotaError>;
