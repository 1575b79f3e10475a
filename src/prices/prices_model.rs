use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::prices_errors::{PriceError, Result};
use crate::market_data::{DataSource, ProviderQuote, DATA_SOURCE_FALLBACK};

/// Domain model representing one persisted price record for an asset at a
/// point in time from a given source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceObservation {
    pub id: String,
    pub asset_id: String,
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub volume: Option<i64>,
    pub change_percent: Option<Decimal>,
    pub high24h: Option<Decimal>,
    pub low24h: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

impl PriceObservation {
    /// Synthesizes a carry-forward record from this observation, keeping the
    /// last known values under a fresh timestamp and the fallback source tag.
    pub fn to_fallback(&self, timestamp: DateTime<Utc>) -> NewPriceObservation {
        NewPriceObservation {
            asset_id: self.asset_id.clone(),
            timestamp,
            price: self.price,
            volume: self.volume,
            change_percent: self.change_percent,
            high24h: self.high24h,
            low24h: self.low24h,
            market_cap: self.market_cap,
            source: DATA_SOURCE_FALLBACK.to_string(),
        }
    }
}

/// Input model for recording a new price observation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewPriceObservation {
    pub asset_id: String,
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub volume: Option<i64>,
    pub change_percent: Option<Decimal>,
    pub high24h: Option<Decimal>,
    pub low24h: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub source: String,
}

impl NewPriceObservation {
    /// Builds an observation from a provider quote for a resolved asset
    pub fn from_quote(asset_id: &str, quote: &ProviderQuote, source: DataSource) -> Self {
        Self {
            asset_id: asset_id.to_string(),
            timestamp: quote.timestamp,
            price: quote.price,
            volume: quote.volume,
            change_percent: quote.change_percent,
            high24h: quote.high,
            low24h: quote.low,
            market_cap: None,
            source: source.as_str().to_string(),
        }
    }

    /// Validates the observation data
    pub fn validate(&self) -> Result<()> {
        if self.asset_id.trim().is_empty() {
            return Err(PriceError::InvalidData(
                "Asset id cannot be empty".to_string(),
            ));
        }
        if self.price <= Decimal::ZERO {
            return Err(PriceError::InvalidData(format!(
                "Price must be positive, got {}",
                self.price
            )));
        }
        if self.source.trim().is_empty() {
            return Err(PriceError::InvalidData(
                "Source tag cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Database model for price observations
#[derive(
    Queryable,
    QueryableByName,
    Identifiable,
    Insertable,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::prices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PriceDB {
    pub id: String,
    pub asset_id: String,
    pub timestamp: NaiveDateTime,
    pub price: String,
    pub volume: Option<i64>,
    pub change_percent: Option<String>,
    pub high24h: Option<String>,
    pub low24h: Option<String>,
    pub market_cap: Option<String>,
    pub source: String,
    pub created_at: NaiveDateTime,
}

// Conversion implementations
impl From<PriceDB> for PriceObservation {
    fn from(db: PriceDB) -> Self {
        Self {
            id: db.id,
            asset_id: db.asset_id,
            timestamp: Utc.from_utc_datetime(&db.timestamp),
            price: Decimal::from_str(&db.price).unwrap_or_default(),
            volume: db.volume,
            change_percent: db
                .change_percent
                .and_then(|v| Decimal::from_str(&v).ok()),
            high24h: db.high24h.and_then(|v| Decimal::from_str(&v).ok()),
            low24h: db.low24h.and_then(|v| Decimal::from_str(&v).ok()),
            market_cap: db.market_cap.and_then(|v| Decimal::from_str(&v).ok()),
            source: db.source,
            created_at: Utc.from_utc_datetime(&db.created_at),
        }
    }
}

impl From<NewPriceObservation> for PriceDB {
    fn from(domain: NewPriceObservation) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            asset_id: domain.asset_id,
            timestamp: domain.timestamp.naive_utc(),
            price: domain.price.to_string(),
            volume: domain.volume,
            change_percent: domain.change_percent.map(|v| v.to_string()),
            high24h: domain.high24h.map(|v| v.to_string()),
            low24h: domain.low24h.map(|v| v.to_string()),
            market_cap: domain.market_cap.map(|v| v.to_string()),
            source: domain.source,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// Query model for range reads over an asset's observations. Both bounds are
/// optional; ordering defaults to newest first.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    #[serde(default)]
    pub ascending: bool,
}

/// One page of observations together with the total row count for the query
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePage {
    pub data: Vec<PriceObservation>,
    pub total_count: i64,
    pub page: i64,
    pub page_size: i64,
}

/// Aggregate price statistics over a time window
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceStatistics {
    pub asset_id: String,
    pub range: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub avg_price: Decimal,
    pub count: i64,
}

/// One entry in a candle series. Observations record a single price, so
/// every leg of the candle carries that price.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Option<i64>,
}

impl From<&PriceObservation> for Candle {
    fn from(observation: &PriceObservation) -> Self {
        Self {
            timestamp: observation.timestamp,
            open: observation.price,
            high: observation.price,
            low: observation.price,
            close: observation.price,
            volume: observation.volume,
        }
    }
}

/// Supported statistics windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    Day,
    Week,
    Month,
}

impl TimeRange {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "day" | "1d" | "24h" => Ok(TimeRange::Day),
            "week" | "1w" | "7d" => Ok(TimeRange::Week),
            "month" | "1m" | "30d" => Ok(TimeRange::Month),
            other => Err(PriceError::InvalidData(format!(
                "Unknown time range: {}",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Day => "day",
            TimeRange::Week => "week",
            TimeRange::Month => "month",
        }
    }

    pub fn window(&self) -> Duration {
        match self {
            TimeRange::Day => Duration::days(1),
            TimeRange::Week => Duration::days(7),
            TimeRange::Month => Duration::days(30),
        }
    }
}

/// Fields the movers query can rank observations by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopField {
    ChangePercent,
    Price,
    Volume,
}

impl TopField {
    /// SQL expression the movers query orders by. Decimal columns are stored
    /// as text, so they are cast for numeric ordering.
    pub(crate) fn order_expr(&self) -> &'static str {
        match self {
            TopField::ChangePercent => "CAST(p.change_percent AS REAL)",
            TopField::Price => "CAST(p.price AS REAL)",
            TopField::Volume => "p.volume",
        }
    }

    pub(crate) fn filter_expr(&self) -> &'static str {
        match self {
            TopField::ChangePercent => "p.change_percent IS NOT NULL",
            TopField::Price => "p.price IS NOT NULL",
            TopField::Volume => "p.volume IS NOT NULL",
        }
    }
}
