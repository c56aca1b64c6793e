use thiserror::Error;

/// Quote retrieval failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataSourceError {
    #[error("Market data unavailable for {0}")]
    Unavailable(String),

    #[error("Invalid quote for {token_id}: {reason}")]
    InvalidQuote { token_id: String, reason: String },

    #[error("Market data request timed out")]
    Timeout,
}

/// Upstream order gateway failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Order submission failed: {0}")]
    Submission(String),

    #[error("Order cancellation failed: {0}")]
    Cancellation(String),

    #[error("Gateway connection failed: {0}")]
    Connection(String),

    #[error("Gateway call timed out after {0}ms")]
    Timeout(u64),
}

/// Credential retrieval failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("No API credentials stored for {0}")]
    NotFound(String),

    #[error("Failed to decrypt API credentials: {0}")]
    Decryption(String),
}

/// Audit sink failures (always swallowed by callers)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("Audit sink unavailable: {0}")]
    Unavailable(String),
}
