pub(crate) mod market_data_constants;
pub(crate) mod market_data_errors;
pub(crate) mod market_data_model;
pub(crate) mod providers;

// Re-export the public interface
pub use market_data_constants::*;
pub use market_data_model::{DataSource, ProviderConfig, ProviderQuote, SymbolInfo};

// Re-export provider types
pub use providers::finnhub_provider::FinnhubProvider;
pub use providers::market_data_provider::MarketDataProvider;

// Re-export error types for convenience
pub use market_data_errors::MarketDataError;
