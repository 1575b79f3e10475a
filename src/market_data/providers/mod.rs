pub(crate) mod finnhub_provider;
pub(crate) mod market_data_provider;

pub use finnhub_provider::FinnhubProvider;
pub use market_data_provider::MarketDataProvider;
