use async_trait::async_trait;
use meridian_core::Quote;

use crate::DataSourceError;

/// Port for live quotes
///
/// Implementations report failures instead of inventing prices; the
/// execution simulator decides whether to fall back.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Current top of book for an outcome token
    async fn get_quote(&self, token_id: &str) -> Result<Quote, DataSourceError>;

    /// Source name for logging
    fn name(&self) -> &str {
        "MarketDataSource"
    }
}
