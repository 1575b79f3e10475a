use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use log::{debug, info};
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use super::prices_constants::{
    AVERAGE_PRICE_SCALE, DEFAULT_PAGE_SIZE, DEFAULT_TOP_LIMIT, LATEST_PRICE_CACHE_TTL_SECS,
    MAX_PAGE_SIZE, PERCENT_CHANGE_SCALE,
};
use super::prices_errors::{PriceError, Result};
use super::prices_model::{
    Candle, NewPriceObservation, PricePage, PriceObservation, PriceRangeQuery, PriceStatistics,
    TimeRange, TopField,
};
use super::prices_traits::{PriceRepositoryTrait, PriceServiceTrait};
use crate::assets::assets_traits::AssetServiceTrait;
use crate::market_data::DATA_SOURCE_MANUAL;

struct CachedPrice {
    observation: PriceObservation,
    cached_at: Instant,
}

/// Service exposing read and write operations over the price store
pub struct PriceService {
    asset_service: Arc<dyn AssetServiceTrait>,
    repository: Arc<dyn PriceRepositoryTrait>,
    latest_cache: DashMap<String, CachedPrice>,
    cache_ttl: StdDuration,
}

impl PriceService {
    pub fn new(
        asset_service: Arc<dyn AssetServiceTrait>,
        repository: Arc<dyn PriceRepositoryTrait>,
    ) -> Self {
        Self {
            asset_service,
            repository,
            latest_cache: DashMap::new(),
            cache_ttl: StdDuration::from_secs(LATEST_PRICE_CACHE_TTL_SECS),
        }
    }

    fn invalidate_cache(&self, asset_id: &str) {
        self.latest_cache.remove(asset_id);
    }

    /// Returns the most recent observation for an asset id, serving repeat
    /// lookups from a short-lived cache.
    pub fn get_latest(&self, asset_id: &str) -> Result<Option<PriceObservation>> {
        if let Some(entry) = self.latest_cache.get(asset_id) {
            if entry.cached_at.elapsed() < self.cache_ttl {
                return Ok(Some(entry.observation.clone()));
            }
        }

        let latest = self.repository.get_latest(asset_id)?;
        if let Some(observation) = &latest {
            self.latest_cache.insert(
                asset_id.to_string(),
                CachedPrice {
                    observation: observation.clone(),
                    cached_at: Instant::now(),
                },
            );
        }

        Ok(latest)
    }

    pub fn latest_price(&self, asset_ref: &str) -> Result<PriceObservation> {
        let asset = self.asset_service.resolve(asset_ref)?;
        self.get_latest(&asset.id)?.ok_or_else(|| {
            PriceError::NotFound(format!("No price recorded for asset {}", asset.symbol))
        })
    }

    pub fn latest_price_before(
        &self,
        asset_ref: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<PriceObservation>> {
        let asset = self.asset_service.resolve(asset_ref)?;
        self.repository.get_latest_before(&asset.id, cutoff)
    }

    /// Records an observation. Callers that do not set a source get the
    /// manual-entry tag.
    pub async fn add_price(&self, mut input: NewPriceObservation) -> Result<PriceObservation> {
        if input.source.trim().is_empty() {
            input.source = DATA_SOURCE_MANUAL.to_string();
        }

        let observation = self.repository.insert(input).await?;
        self.invalidate_cache(&observation.asset_id);
        debug!(
            "Recorded {} observation for asset {} at {}",
            observation.source, observation.asset_id, observation.timestamp
        );

        Ok(observation)
    }

    /// Percent change between the latest observation and the most recent one
    /// older than the window.
    pub fn percent_change(&self, asset_ref: &str, window_hours: i64) -> Result<Decimal> {
        if window_hours <= 0 {
            return Err(PriceError::InvalidData(format!(
                "Window must be a positive number of hours, got {}",
                window_hours
            )));
        }

        let asset = self.asset_service.resolve(asset_ref)?;
        let current = self.get_latest(&asset.id)?.ok_or_else(|| {
            PriceError::NotFound(format!("No price recorded for asset {}", asset.symbol))
        })?;

        // No observation older than the window: compare the latest against
        // itself, which reads as 0% for newly tracked assets.
        let cutoff = Utc::now() - Duration::hours(window_hours);
        let baseline = self
            .repository
            .get_latest_before(&asset.id, cutoff)?
            .unwrap_or_else(|| current.clone());

        Ok(compute_percent_change(current.price, baseline.price))
    }

    pub fn history(&self, asset_ref: &str, query: PriceRangeQuery) -> Result<PricePage> {
        let asset = self.asset_service.resolve(asset_ref)?;
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Err(PriceError::InvalidData(
                    "Range start is after range end".to_string(),
                ));
            }
        }

        self.repository.get_range(&asset.id, query)
    }

    /// Min/max/average price over a keyword window. An empty window yields
    /// zero-valued statistics.
    pub fn statistics(&self, asset_ref: &str, range: &str) -> Result<PriceStatistics> {
        let range = TimeRange::parse(range)?;
        let asset = self.asset_service.resolve(asset_ref)?;

        let to = Utc::now();
        let from = to - range.window();
        let observations = self.repository.get_since(&asset.id, from)?;

        if observations.is_empty() {
            return Ok(PriceStatistics {
                asset_id: asset.id,
                range: range.as_str().to_string(),
                from,
                to,
                min_price: Decimal::ZERO,
                max_price: Decimal::ZERO,
                avg_price: Decimal::ZERO,
                count: 0,
            });
        }

        let mut min_price = observations[0].price;
        let mut max_price = observations[0].price;
        let mut sum = Decimal::ZERO;
        for observation in &observations {
            min_price = min_price.min(observation.price);
            max_price = max_price.max(observation.price);
            sum += observation.price;
        }

        let count = observations.len() as i64;
        let avg_price = (sum / Decimal::from(count))
            .round_dp_with_strategy(AVERAGE_PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero);

        Ok(PriceStatistics {
            asset_id: asset.id,
            range: range.as_str().to_string(),
            from,
            to,
            min_price,
            max_price,
            avg_price,
            count,
        })
    }

    /// Candle series over a keyword window, capped to the most recent
    /// `limit` observations and returned oldest first.
    pub fn candles(
        &self,
        asset_ref: &str,
        range: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Candle>> {
        let range = TimeRange::parse(range)?;
        let asset = self.asset_service.resolve(asset_ref)?;
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE) as usize;

        let from = Utc::now() - range.window();
        let observations = self.repository.get_since(&asset.id, from)?;

        let skip = observations.len().saturating_sub(limit);
        Ok(observations[skip..].iter().map(Candle::from).collect())
    }

    pub fn top_by_field(
        &self,
        field: TopField,
        limit: Option<i64>,
        ascending: bool,
    ) -> Result<Vec<PriceObservation>> {
        let limit = limit.unwrap_or(DEFAULT_TOP_LIMIT).clamp(1, MAX_PAGE_SIZE);
        self.repository.get_top_by_field(field, limit, ascending)
    }

    pub fn top_gainers(&self, limit: Option<i64>) -> Result<Vec<PriceObservation>> {
        self.top_by_field(TopField::ChangePercent, limit, false)
    }

    pub fn top_losers(&self, limit: Option<i64>) -> Result<Vec<PriceObservation>> {
        self.top_by_field(TopField::ChangePercent, limit, true)
    }

    pub async fn delete_before(
        &self,
        asset_ref: Option<&str>,
        cutoff: DateTime<Utc>,
    ) -> Result<usize> {
        match asset_ref {
            Some(asset_ref) => {
                let asset = self.asset_service.resolve(asset_ref)?;
                let deleted = self.repository.delete_before(Some(&asset.id), cutoff).await?;
                self.invalidate_cache(&asset.id);
                info!(
                    "Deleted {} observations for asset {} before {}",
                    deleted, asset.symbol, cutoff
                );
                Ok(deleted)
            }
            None => {
                let deleted = self.repository.delete_before(None, cutoff).await?;
                self.latest_cache.clear();
                info!("Deleted {} observations before {}", deleted, cutoff);
                Ok(deleted)
            }
        }
    }

    pub async fn delete_all_for_asset(&self, asset_id: &str) -> Result<usize> {
        let deleted = self.repository.delete_all_for_asset(asset_id).await?;
        self.invalidate_cache(asset_id);
        Ok(deleted)
    }
}

fn compute_percent_change(current: Decimal, baseline: Decimal) -> Decimal {
    if baseline.is_zero() {
        return Decimal::ZERO;
    }

    ((current - baseline) / baseline * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(PERCENT_CHANGE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[async_trait]
impl PriceServiceTrait for PriceService {
    fn get_latest(&self, asset_id: &str) -> Result<Option<PriceObservation>> {
        self.get_latest(asset_id)
    }

    fn latest_price(&self, asset_ref: &str) -> Result<PriceObservation> {
        self.latest_price(asset_ref)
    }

    fn latest_price_before(
        &self,
        asset_ref: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<PriceObservation>> {
        self.latest_price_before(asset_ref, cutoff)
    }

    async fn add_price(&self, input: NewPriceObservation) -> Result<PriceObservation> {
        self.add_price(input).await
    }

    fn percent_change(&self, asset_ref: &str, window_hours: i64) -> Result<Decimal> {
        self.percent_change(asset_ref, window_hours)
    }

    fn history(&self, asset_ref: &str, query: PriceRangeQuery) -> Result<PricePage> {
        self.history(asset_ref, query)
    }

    fn statistics(&self, asset_ref: &str, range: &str) -> Result<PriceStatistics> {
        self.statistics(asset_ref, range)
    }

    fn candles(&self, asset_ref: &str, range: &str, limit: Option<i64>) -> Result<Vec<Candle>> {
        self.candles(asset_ref, range, limit)
    }

    fn top_by_field(
        &self,
        field: TopField,
        limit: Option<i64>,
        ascending: bool,
    ) -> Result<Vec<PriceObservation>> {
        self.top_by_field(field, limit, ascending)
    }

    fn top_gainers(&self, limit: Option<i64>) -> Result<Vec<PriceObservation>> {
        self.top_gainers(limit)
    }

    fn top_losers(&self, limit: Option<i64>) -> Result<Vec<PriceObservation>> {
        self.top_losers(limit)
    }

    async fn delete_before(
        &self,
        asset_ref: Option<&str>,
        cutoff: DateTime<Utc>,
    ) -> Result<usize> {
        self.delete_before(asset_ref, cutoff).await
    }

    async fn delete_all_for_asset(&self, asset_id: &str) -> Result<usize> {
        self.delete_all_for_asset(asset_id).await
    }
}
