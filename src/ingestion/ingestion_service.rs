use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use super::ingestion_constants::{BATCH_PACING_MS, DEFAULT_DISCOVERY_LIMIT};
use super::ingestion_errors::{IngestionError, Result};
use super::ingestion_model::{DiscoveryReport, IngestOutcome, IngestResult, RefreshReport};
use super::ingestion_traits::IngestionServiceTrait;
use crate::assets::assets_errors::AssetError;
use crate::assets::assets_model::{Asset, NewAsset};
use crate::assets::assets_traits::AssetServiceTrait;
use crate::market_data::{MarketDataProvider, SymbolInfo, DEFAULT_EXCHANGE};
use crate::prices::prices_errors::PriceError;
use crate::prices::prices_model::NewPriceObservation;
use crate::prices::prices_traits::PriceServiceTrait;

/// Service orchestrating quote fetches into stored observations.
///
/// Each attempt runs the same state machine: fetch a live quote, fall back
/// to the last known price when the provider fails, persist through the
/// dedup key. Provider calls happen outside any database transaction.
pub struct IngestionService {
    asset_service: Arc<dyn AssetServiceTrait>,
    price_service: Arc<dyn PriceServiceTrait>,
    provider: Arc<dyn MarketDataProvider>,
    pacing: Duration,
}

impl IngestionService {
    pub fn new(
        asset_service: Arc<dyn AssetServiceTrait>,
        price_service: Arc<dyn PriceServiceTrait>,
        provider: Arc<dyn MarketDataProvider>,
    ) -> Self {
        Self {
            asset_service,
            price_service,
            provider,
            pacing: Duration::from_millis(BATCH_PACING_MS),
        }
    }

    /// Overrides the inter-call delay used by batch runs.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Ingests one asset by reference. Unknown symbols are registered on
    /// first sighting.
    pub async fn ingest_asset(&self, symbol_or_id: &str) -> Result<IngestResult> {
        let asset = match self.asset_service.resolve(symbol_or_id) {
            Ok(asset) => asset,
            Err(AssetError::NotFound(_)) => {
                self.asset_service.get_or_create(symbol_or_id, None).await?
            }
            Err(e) => return Err(e.into()),
        };

        self.ingest_resolved(&asset).await
    }

    async fn ingest_resolved(&self, asset: &Asset) -> Result<IngestResult> {
        match self.provider.fetch_quote(&asset.symbol).await {
            Ok(quote) => {
                let observation =
                    NewPriceObservation::from_quote(&asset.id, &quote, self.provider.source());
                self.persist(asset, observation, IngestOutcome::Live).await
            }
            Err(e) => {
                warn!(
                    "Provider fetch failed for {}: {}; trying fallback",
                    asset.symbol, e
                );
                self.fallback(asset).await
            }
        }
    }

    /// Carries the last known price forward under a fresh timestamp and the
    /// fallback source tag. Fails with NoDataAvailable when the asset has
    /// never been priced.
    async fn fallback(&self, asset: &Asset) -> Result<IngestResult> {
        match self.price_service.get_latest(&asset.id)? {
            Some(last) => {
                info!(
                    "Carrying last known price {} forward for {}",
                    last.price, asset.symbol
                );
                let observation = last.to_fallback(Utc::now());
                self.persist(asset, observation, IngestOutcome::Fallback)
                    .await
            }
            None => Err(IngestionError::NoDataAvailable(format!(
                "provider failed and no prior observation exists for {}",
                asset.symbol
            ))),
        }
    }

    async fn persist(
        &self,
        asset: &Asset,
        observation: NewPriceObservation,
        outcome: IngestOutcome,
    ) -> Result<IngestResult> {
        match self.price_service.add_price(observation).await {
            Ok(stored) => Ok(IngestResult {
                asset: asset.clone(),
                outcome,
                observation: Some(stored),
            }),
            // Same (asset, timestamp, source) already recorded; an
            // idempotent re-fetch within the same timestamp bucket.
            Err(PriceError::Duplicate(_)) => {
                debug!("Observation already recorded for {}", asset.symbol);
                Ok(IngestResult {
                    asset: asset.clone(),
                    outcome: IngestOutcome::Skipped,
                    observation: None,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Discovers new symbols on an exchange and ingests a first price for
    /// each. Existing symbols are filtered out before the limit is applied,
    /// so the limit always counts new assets. One symbol failing never
    /// aborts the batch; the run only fails when the listing fetch does.
    pub async fn discover_and_ingest(
        &self,
        exchange: Option<&str>,
        limit: Option<usize>,
    ) -> Result<DiscoveryReport> {
        let exchange = exchange.unwrap_or(DEFAULT_EXCHANGE);
        let limit = limit.unwrap_or(DEFAULT_DISCOVERY_LIMIT);

        let symbols = self.provider.fetch_symbols(exchange).await?;
        let mut report = DiscoveryReport::new(symbols.len());

        let existing: HashSet<String> = self
            .asset_service
            .get_assets()?
            .into_iter()
            .map(|a| a.symbol.to_uppercase())
            .collect();

        let candidates: Vec<SymbolInfo> = symbols
            .into_iter()
            .filter(|info| !existing.contains(&info.symbol.to_uppercase()))
            .take(limit)
            .collect();

        info!(
            "Discovery on {}: {} candidates, {} new symbols selected",
            exchange,
            report.total_candidates,
            candidates.len()
        );

        let mut first = true;
        for info in candidates {
            if !first {
                sleep(self.pacing).await;
            }
            first = false;

            let symbol = info.symbol.clone();
            let hints = NewAsset::from(info);
            let asset = match self.asset_service.get_or_create(&symbol, Some(hints)).await {
                Ok(asset) => {
                    report.created.push(asset.symbol.clone());
                    asset
                }
                Err(e) => {
                    warn!("Failed to register {}: {}", symbol, e);
                    report.failed.push(symbol);
                    continue;
                }
            };

            match self.ingest_resolved(&asset).await {
                Ok(result) => match result.outcome {
                    IngestOutcome::Skipped => report.skipped.push(asset.symbol.clone()),
                    _ => report.priced.push(asset.symbol.clone()),
                },
                Err(e) => {
                    warn!("Ingestion failed for {}: {}", asset.symbol, e);
                    report.failed.push(asset.symbol.clone());
                }
            }
        }

        Ok(report)
    }

    /// Re-ingests every active asset, pacing provider calls.
    pub async fn refresh_tracked(&self) -> Result<RefreshReport> {
        let assets = self.asset_service.list_active_assets()?;
        let mut report = RefreshReport::new(assets.len());

        let mut first = true;
        for asset in assets {
            if !first {
                sleep(self.pacing).await;
            }
            first = false;

            match self.ingest_resolved(&asset).await {
                Ok(result) => match result.outcome {
                    IngestOutcome::Skipped => report.skipped.push(asset.symbol.clone()),
                    _ => report.updated.push(asset.symbol.clone()),
                },
                Err(e) => {
                    warn!("Refresh failed for {}: {}", asset.symbol, e);
                    report.failed.push(asset.symbol.clone());
                }
            }
        }

        info!(
            "Refreshed {} assets: {} updated, {} skipped, {} failed",
            report.total_assets,
            report.updated.len(),
            report.skipped.len(),
            report.failed.len()
        );

        Ok(report)
    }
}

#[async_trait]
impl IngestionServiceTrait for IngestionService {
    async fn ingest_asset(&self, symbol_or_id: &str) -> Result<IngestResult> {
        self.ingest_asset(symbol_or_id).await
    }

    async fn discover_and_ingest(
        &self,
        exchange: Option<&str>,
        limit: Option<usize>,
    ) -> Result<DiscoveryReport> {
        self.discover_and_ingest(exchange, limit).await
    }

    async fn refresh_tracked(&self) -> Result<RefreshReport> {
        self.refresh_tracked().await
    }
}
