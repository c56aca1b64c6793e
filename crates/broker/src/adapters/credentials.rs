use async_trait::async_trait;
use dashmap::DashMap;
use meridian_ports::{ApiCredentials, CredentialError, CredentialStore};
use std::sync::Arc;

/// Credentials held in memory, already decrypted
#[derive(Clone, Default)]
pub struct StaticCredentialStore {
    credentials: Arc<DashMap<String, ApiCredentials>>,
}

impl StaticCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user_id: &str, credentials: ApiCredentials) {
        self.credentials.insert(user_id.to_string(), credentials);
    }
}

#[async_trait]
impl CredentialStore for StaticCredentialStore {
    async fn credentials(&self, user_id: &str) -> Result<ApiCredentials, CredentialError> {
        self.credentials
            .get(user_id)
            .map(|c| c.value().clone())
            .ok_or_else(|| CredentialError::NotFound(user_id.to_string()))
    }
}
