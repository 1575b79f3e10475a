use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::assets_constants::*;
use super::assets_errors::{AssetError, Result};
use crate::market_data::SymbolInfo;
use crate::prices::prices_model::PriceObservation;

/// Domain model representing a tracked asset
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input model for registering a new asset
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewAsset {
    pub symbol: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl NewAsset {
    /// Validates the new asset data
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(AssetError::InvalidData(
                "Asset symbol cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<SymbolInfo> for NewAsset {
    fn from(info: SymbolInfo) -> Self {
        let category = category_from_security_type(info.security_type.as_deref());
        Self {
            name: info.description.clone().filter(|d| !d.trim().is_empty()),
            description: info.security_type,
            category: Some(category.to_string()),
            symbol: info.symbol,
        }
    }
}

/// Maps a provider security type to an asset category
pub fn category_from_security_type(security_type: Option<&str>) -> &'static str {
    let Some(security_type) = security_type else {
        return CATEGORY_STOCK;
    };

    let lowered = security_type.to_lowercase();
    if lowered.contains("crypto") {
        CATEGORY_CRYPTO
    } else if lowered.contains("forex") || lowered.contains("currency") {
        CATEGORY_FOREX
    } else if lowered.contains("metal") {
        CATEGORY_METAL
    } else if lowered.contains("commodity") {
        CATEGORY_COMMODITY
    } else {
        CATEGORY_STOCK
    }
}

/// Input model for updating an existing asset. Absent fields are left
/// unchanged; the symbol is immutable.
#[derive(Debug, Clone, Serialize, Deserialize, Default, AsChangeset)]
#[serde(rename_all = "camelCase")]
#[diesel(table_name = crate::schema::assets)]
pub struct UpdateAsset {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateAsset {
    /// Validates the asset update data
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(AssetError::InvalidData(
                    "Asset name cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Database model for assets
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::assets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AssetDB {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// Conversion implementations
impl From<AssetDB> for Asset {
    fn from(db: AssetDB) -> Self {
        Self {
            id: db.id,
            symbol: db.symbol,
            name: db.name,
            description: db.description,
            category: db.category,
            is_active: db.is_active,
            created_at: Utc.from_utc_datetime(&db.created_at),
            updated_at: Utc.from_utc_datetime(&db.updated_at),
        }
    }
}

impl From<NewAsset> for AssetDB {
    fn from(domain: NewAsset) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            name: domain.name.unwrap_or_else(|| domain.symbol.clone()),
            symbol: domain.symbol,
            description: domain.description,
            category: domain
                .category
                .unwrap_or_else(|| CATEGORY_STOCK.to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Detail view of an asset joined with its most recent observation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetOverview {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub current_price: Option<Decimal>,
    pub volume: Option<i64>,
    pub change_percent: Option<Decimal>,
    pub high24h: Option<Decimal>,
    pub low24h: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub price_timestamp: Option<DateTime<Utc>>,
    pub source: Option<String>,
}

impl AssetOverview {
    pub fn new(asset: Asset, latest: Option<PriceObservation>) -> Self {
        let mut overview = Self {
            id: asset.id,
            symbol: asset.symbol,
            name: asset.name,
            description: asset.description,
            category: asset.category,
            is_active: asset.is_active,
            created_at: asset.created_at,
            updated_at: asset.updated_at,
            current_price: None,
            volume: None,
            change_percent: None,
            high24h: None,
            low24h: None,
            market_cap: None,
            price_timestamp: None,
            source: None,
        };

        if let Some(latest) = latest {
            overview.current_price = Some(latest.price);
            overview.volume = latest.volume;
            overview.change_percent = latest.change_percent;
            overview.high24h = latest.high24h;
            overview.low24h = latest.low24h;
            overview.market_cap = latest.market_cap;
            overview.price_timestamp = Some(latest.timestamp);
            overview.source = Some(latest.source);
        }

        overview
    }
}

/// Listing-view entry pairing a provider symbol with its live quote and the
/// locally tracked asset id when one exists
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStock {
    pub symbol: String,
    pub name: Option<String>,
    pub asset_id: Option<String>,
    pub price: Option<Decimal>,
    pub high24h: Option<Decimal>,
    pub low24h: Option<Decimal>,
    pub change_percent: Option<Decimal>,
    pub timestamp: Option<DateTime<Utc>>,
}
