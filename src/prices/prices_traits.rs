use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::prices_errors::Result;
use super::prices_model::{
    Candle, NewPriceObservation, PricePage, PriceObservation, PriceRangeQuery, PriceStatistics,
    TopField,
};

/// Trait defining the contract for price repository implementations
#[async_trait]
pub trait PriceRepositoryTrait: Send + Sync {
    fn get_latest(&self, asset_id: &str) -> Result<Option<PriceObservation>>;
    fn get_latest_before(
        &self,
        asset_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<PriceObservation>>;
    fn find_by_key(
        &self,
        asset_id: &str,
        timestamp: DateTime<Utc>,
        source: &str,
    ) -> Result<Option<PriceObservation>>;
    fn get_range(&self, asset_id: &str, query: PriceRangeQuery) -> Result<PricePage>;
    fn get_since(&self, asset_id: &str, from: DateTime<Utc>) -> Result<Vec<PriceObservation>>;
    fn get_top_by_field(
        &self,
        field: TopField,
        limit: i64,
        ascending: bool,
    ) -> Result<Vec<PriceObservation>>;
    async fn insert(&self, observation: NewPriceObservation) -> Result<PriceObservation>;
    async fn delete_before(&self, asset_id: Option<&str>, cutoff: DateTime<Utc>) -> Result<usize>;
    async fn delete_all_for_asset(&self, asset_id: &str) -> Result<usize>;
}

/// Trait defining the contract for price service implementations
#[async_trait]
pub trait PriceServiceTrait: Send + Sync {
    fn get_latest(&self, asset_id: &str) -> Result<Option<PriceObservation>>;
    fn latest_price(&self, asset_ref: &str) -> Result<PriceObservation>;
    fn latest_price_before(
        &self,
        asset_ref: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<PriceObservation>>;
    async fn add_price(&self, input: NewPriceObservation) -> Result<PriceObservation>;
    fn percent_change(&self, asset_ref: &str, window_hours: i64) -> Result<Decimal>;
    fn history(&self, asset_ref: &str, query: PriceRangeQuery) -> Result<PricePage>;
    fn statistics(&self, asset_ref: &str, range: &str) -> Result<PriceStatistics>;
    fn candles(&self, asset_ref: &str, range: &str, limit: Option<i64>) -> Result<Vec<Candle>>;
    fn top_by_field(
        &self,
        field: TopField,
        limit: Option<i64>,
        ascending: bool,
    ) -> Result<Vec<PriceObservation>>;
    fn top_gainers(&self, limit: Option<i64>) -> Result<Vec<PriceObservation>>;
    fn top_losers(&self, limit: Option<i64>) -> Result<Vec<PriceObservation>>;
    async fn delete_before(
        &self,
        asset_ref: Option<&str>,
        cutoff: DateTime<Utc>,
    ) -> Result<usize>;
    async fn delete_all_for_asset(&self, asset_id: &str) -> Result<usize>;
}
