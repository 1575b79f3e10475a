use thiserror::Error;

use crate::assets::assets_errors::AssetError;
use crate::market_data::MarketDataError;
use crate::prices::prices_errors::PriceError;

/// Result type for ingestion operations
pub type Result<T> = std::result::Result<T, IngestionError>;

/// Errors that can occur while ingesting quotes
#[derive(Error, Debug)]
pub enum IngestionError {
    /// The provider failed and no prior observation exists to carry forward
    #[error("No data available: {0}")]
    NoDataAvailable(String),

    #[error("Provider error: {0}")]
    Provider(#[from] MarketDataError),

    #[error("Asset error: {0}")]
    Asset(String),

    #[error("Price store error: {0}")]
    Price(String),
}

impl From<AssetError> for IngestionError {
    fn from(err: AssetError) -> Self {
        IngestionError::Asset(err.to_string())
    }
}

impl From<PriceError> for IngestionError {
    fn from(err: PriceError) -> Self {
        IngestionError::Price(err.to_string())
    }
}
