use async_trait::async_trait;
use futures::future::join_all;

use crate::market_data::market_data_constants::QUOTE_FETCH_BATCH_SIZE;
use crate::market_data::market_data_errors::MarketDataError;
use crate::market_data::market_data_model::{DataSource, ProviderQuote, SymbolInfo};

/// Contract for an external quote provider. One HTTP call per invocation,
/// no retries here; failure policy lives with the caller.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Source tag stamped on observations ingested live from this provider.
    fn source(&self) -> DataSource;

    /// Current quote for one symbol. Non-positive or absent prices and
    /// timestamps are rejected as `InvalidData` at this boundary.
    async fn fetch_quote(&self, symbol: &str) -> Result<ProviderQuote, MarketDataError>;

    /// Tradable symbols listed on an exchange. Entries without a symbol are
    /// dropped.
    async fn fetch_symbols(&self, exchange: &str) -> Result<Vec<SymbolInfo>, MarketDataError>;

    /// Fetch current quotes for multiple symbols in parallel batches.
    async fn fetch_quotes(
        &self,
        symbols: &[String],
    ) -> Vec<(String, Result<ProviderQuote, MarketDataError>)> {
        let mut results = Vec::with_capacity(symbols.len());

        for chunk in symbols.chunks(QUOTE_FETCH_BATCH_SIZE) {
            let futures: Vec<_> = chunk
                .iter()
                .map(|symbol| {
                    let symbol_clone = symbol.clone();
                    async move {
                        let quote = self.fetch_quote(&symbol_clone).await;
                        (symbol_clone, quote)
                    }
                })
                .collect();

            results.extend(join_all(futures).await);
        }

        results
    }
}
