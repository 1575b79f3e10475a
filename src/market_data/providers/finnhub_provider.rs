use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::warn;
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::market_data_provider::MarketDataProvider;
use crate::market_data::market_data_errors::MarketDataError;
use crate::market_data::market_data_model::{
    DataSource, ProviderConfig, ProviderQuote, SymbolInfo,
};

/// Raw quote payload as returned by the provider's /quote endpoint
#[derive(Deserialize, Debug)]
struct FinnhubQuoteResponse {
    #[serde(rename = "c")]
    current: Option<f64>,
    #[serde(rename = "h")]
    high: Option<f64>,
    #[serde(rename = "l")]
    low: Option<f64>,
    #[serde(rename = "o")]
    open: Option<f64>,
    #[serde(rename = "pc")]
    previous_close: Option<f64>,
    #[serde(rename = "dp")]
    change_percent: Option<f64>,
    #[serde(rename = "v")]
    volume: Option<f64>,
    #[serde(rename = "t")]
    timestamp: Option<i64>,
}

#[derive(Deserialize, Debug)]
struct FinnhubSymbolEntry {
    symbol: Option<String>,
    #[serde(rename = "displaySymbol")]
    display_symbol: Option<String>,
    description: Option<String>,
    #[serde(rename = "type")]
    security_type: Option<String>,
    currency: Option<String>,
}

pub struct FinnhubProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FinnhubProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, MarketDataError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MarketDataError::Unreachable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url,
            api_key: config.api_key,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, MarketDataError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("token", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited);
        }
        if !status.is_success() {
            return Err(MarketDataError::Unreachable(format!(
                "{} returned status {}",
                path, status
            )));
        }

        Ok(response.json::<T>().await?)
    }
}

/// Validates and normalizes a raw quote payload. The upstream API reports
/// unknown symbols as all-zero bodies instead of an HTTP error, so zero
/// prices and epoch-zero timestamps are rejected here.
fn quote_from_response(
    symbol: &str,
    response: FinnhubQuoteResponse,
) -> Result<ProviderQuote, MarketDataError> {
    let price = match response.current {
        Some(p) if p > 0.0 => Decimal::from_f64(p).ok_or_else(|| {
            MarketDataError::InvalidData(format!("unrepresentable price {} for {}", p, symbol))
        })?,
        other => {
            warn!("Invalid price {:?} received for symbol: {}", other, symbol);
            return Err(MarketDataError::InvalidData(format!(
                "missing or non-positive price for {}",
                symbol
            )));
        }
    };

    let timestamp = match response.timestamp {
        Some(t) if t > 0 => DateTime::<Utc>::from_timestamp(t, 0).ok_or_else(|| {
            MarketDataError::InvalidData(format!("out-of-range timestamp {} for {}", t, symbol))
        })?,
        other => {
            warn!("Invalid timestamp {:?} received for symbol: {}", other, symbol);
            return Err(MarketDataError::InvalidData(format!(
                "missing or non-positive timestamp for {}",
                symbol
            )));
        }
    };

    Ok(ProviderQuote {
        symbol: symbol.to_string(),
        price,
        open: response.open.and_then(Decimal::from_f64),
        high: response.high.and_then(Decimal::from_f64),
        low: response.low.and_then(Decimal::from_f64),
        previous_close: response.previous_close.and_then(Decimal::from_f64),
        change_percent: response.change_percent.and_then(Decimal::from_f64),
        volume: response.volume.map(|v| v as i64),
        timestamp,
    })
}

fn symbols_from_entries(entries: Vec<FinnhubSymbolEntry>) -> Vec<SymbolInfo> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let symbol = entry.symbol.filter(|s| !s.trim().is_empty())?;
            Some(SymbolInfo {
                symbol,
                display_symbol: entry.display_symbol,
                description: entry.description,
                security_type: entry.security_type,
                currency: entry.currency,
            })
        })
        .collect()
}

#[async_trait]
impl MarketDataProvider for FinnhubProvider {
    fn source(&self) -> DataSource {
        DataSource::Finnhub
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<ProviderQuote, MarketDataError> {
        let response = self
            .get_json::<FinnhubQuoteResponse>("/quote", &[("symbol", symbol)])
            .await?;

        quote_from_response(symbol, response)
    }

    async fn fetch_symbols(&self, exchange: &str) -> Result<Vec<SymbolInfo>, MarketDataError> {
        let entries = self
            .get_json::<Vec<FinnhubSymbolEntry>>("/stock/symbol", &[("exchange", exchange)])
            .await?;

        Ok(symbols_from_entries(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quote_from_full_response() {
        let response: FinnhubQuoteResponse = serde_json::from_str(
            r#"{"c": 261.74, "h": 263.31, "l": 260.68, "o": 261.07, "pc": 259.45, "dp": 0.8827, "t": 1582641000}"#,
        )
        .unwrap();

        let quote = quote_from_response("AAPL", response).unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.price, dec!(261.74));
        assert_eq!(quote.high, Some(dec!(263.31)));
        assert_eq!(quote.low, Some(dec!(260.68)));
        assert_eq!(quote.previous_close, Some(dec!(259.45)));
        assert_eq!(quote.change_percent, Some(dec!(0.8827)));
        assert_eq!(quote.timestamp.timestamp(), 1582641000);
        assert_eq!(quote.volume, None);
    }

    #[test]
    fn test_zero_price_rejected() {
        let response: FinnhubQuoteResponse =
            serde_json::from_str(r#"{"c": 0, "h": 0, "l": 0, "o": 0, "pc": 0, "t": 0}"#).unwrap();

        let err = quote_from_response("UNKNOWN", response).unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidData(_)));
    }

    #[test]
    fn test_missing_price_rejected() {
        let response: FinnhubQuoteResponse = serde_json::from_str(r#"{}"#).unwrap();

        let err = quote_from_response("AAPL", response).unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidData(_)));
    }

    #[test]
    fn test_zero_timestamp_rejected() {
        let response: FinnhubQuoteResponse =
            serde_json::from_str(r#"{"c": 15.5, "t": 0}"#).unwrap();

        let err = quote_from_response("AAPL", response).unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidData(_)));
    }

    #[test]
    fn test_negative_price_rejected() {
        let response: FinnhubQuoteResponse =
            serde_json::from_str(r#"{"c": -1.25, "t": 1582641000}"#).unwrap();

        let err = quote_from_response("AAPL", response).unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidData(_)));
    }

    #[test]
    fn test_symbols_without_ticker_dropped() {
        let entries: Vec<FinnhubSymbolEntry> = serde_json::from_str(
            r#"[
                {"symbol": "AAPL", "displaySymbol": "AAPL", "description": "APPLE INC", "type": "Common Stock", "currency": "USD"},
                {"symbol": "", "description": "EMPTY"},
                {"description": "NO SYMBOL AT ALL"}
            ]"#,
        )
        .unwrap();

        let symbols = symbols_from_entries(entries);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].symbol, "AAPL");
        assert_eq!(symbols[0].description.as_deref(), Some("APPLE INC"));
        assert_eq!(symbols[0].security_type.as_deref(), Some("Common Stock"));
    }
}
