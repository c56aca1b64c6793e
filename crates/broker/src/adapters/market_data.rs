use async_trait::async_trait;
use dashmap::DashMap;
use meridian_core::Quote;
use meridian_ports::{DataSourceError, MarketDataSource};
use std::sync::Arc;

/// Quotes set by hand; unknown tokens are reported unavailable
#[derive(Clone, Default)]
pub struct StaticMarketData {
    quotes: Arc<DashMap<String, Quote>>,
}

impl StaticMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(self, token_id: &str, quote: Quote) -> Self {
        self.set_quote(token_id, quote);
        self
    }

    pub fn set_quote(&self, token_id: &str, quote: Quote) {
        self.quotes.insert(token_id.to_string(), quote);
    }

    pub fn remove_quote(&self, token_id: &str) {
        self.quotes.remove(token_id);
    }
}

#[async_trait]
impl MarketDataSource for StaticMarketData {
    async fn get_quote(&self, token_id: &str) -> Result<Quote, DataSourceError> {
        let quote = self
            .quotes
            .get(token_id)
            .map(|q| q.value().clone())
            .ok_or_else(|| DataSourceError::Unavailable(token_id.to_string()))?;

        if quote.bid > quote.ask {
            return Err(DataSourceError::InvalidQuote {
                token_id: token_id.to_string(),
                reason: format!("bid {} above ask {}", quote.bid, quote.ask),
            });
        }
        Ok(quote)
    }

    fn name(&self) -> &str {
        "StaticMarketData"
    }
}
