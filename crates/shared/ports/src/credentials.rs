use async_trait::async_trait;
use std::fmt;

use crate::CredentialError;

/// Decrypted venue API credentials
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub passphrase: String,
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// Port for stored venue credentials (live mode only)
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load and decrypt the credentials of a user
    async fn credentials(&self, user_id: &str) -> Result<ApiCredentials, CredentialError>;
}
