use thiserror::Error;

/// Custom error type for provider-facing operations
#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("Invalid data from provider: {0}")]
    InvalidData(String),
    #[error("Provider unreachable: {0}")]
    Unreachable(String),
    #[error("Provider rate limit exceeded")]
    RateLimited,
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for MarketDataError {
    fn from(err: reqwest::Error) -> Self {
        if err.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) {
            MarketDataError::RateLimited
        } else if err.is_decode() {
            MarketDataError::InvalidData(err.to_string())
        } else {
            MarketDataError::Unreachable(err.to_string())
        }
    }
}

/// Result type for market data operations
pub type Result<T> = std::result::Result<T, MarketDataError>;
