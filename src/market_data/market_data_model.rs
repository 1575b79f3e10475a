use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::market_data_constants::{
    DATA_SOURCE_FALLBACK, DATA_SOURCE_FINNHUB, DATA_SOURCE_MANUAL, DEFAULT_HTTP_TIMEOUT_SECS,
    ENV_FINNHUB_API_KEY, ENV_FINNHUB_BASE_URL, FINNHUB_BASE_URL,
};
use super::market_data_errors::{MarketDataError, Result};

/// Provenance tag written on every persisted observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    Finnhub,
    Fallback,
    Manual,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Finnhub => DATA_SOURCE_FINNHUB,
            DataSource::Fallback => DATA_SOURCE_FALLBACK,
            DataSource::Manual => DATA_SOURCE_MANUAL,
        }
    }
}

impl From<DataSource> for String {
    fn from(source: DataSource) -> Self {
        source.as_str().to_string()
    }
}

impl From<&str> for DataSource {
    fn from(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            DATA_SOURCE_FINNHUB => DataSource::Finnhub,
            DATA_SOURCE_FALLBACK => DataSource::Fallback,
            _ => DataSource::Manual,
        }
    }
}

/// Normalized quote returned by a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderQuote {
    pub symbol: String,
    pub price: Decimal,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub previous_close: Option<Decimal>,
    pub change_percent: Option<Decimal>,
    pub volume: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

/// One tradable symbol as listed by the provider for an exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    pub display_symbol: Option<String>,
    pub description: Option<String>,
    pub security_type: Option<String>,
    pub currency: Option<String>,
}

/// Connection settings for the quote provider, injected at construction
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: FINNHUB_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(ENV_FINNHUB_API_KEY).map_err(|_| {
            MarketDataError::InvalidData(format!("{} is not set", ENV_FINNHUB_API_KEY))
        })?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var(ENV_FINNHUB_BASE_URL) {
            config.base_url = base_url;
        }
        Ok(config)
    }
}
