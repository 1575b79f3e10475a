use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

use super::assets_constants::DEFAULT_MARKET_STOCKS_LIMIT;
use super::assets_errors::{AssetError, Result};
use super::assets_model::{Asset, AssetOverview, MarketStock, NewAsset, UpdateAsset};
use super::assets_traits::{AssetRepositoryTrait, AssetServiceTrait};
use crate::market_data::{MarketDataProvider, ProviderQuote, DEFAULT_EXCHANGE};
use crate::prices::prices_traits::PriceRepositoryTrait;

lazy_static! {
    static ref ASSET_ID_RE: Regex = Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"
    )
    .unwrap();
}

/// Service for managing the asset registry
pub struct AssetService {
    asset_repository: Arc<dyn AssetRepositoryTrait>,
    price_repository: Arc<dyn PriceRepositoryTrait>,
    provider: Arc<dyn MarketDataProvider>,
}

impl AssetService {
    pub fn new(
        asset_repository: Arc<dyn AssetRepositoryTrait>,
        price_repository: Arc<dyn PriceRepositoryTrait>,
        provider: Arc<dyn MarketDataProvider>,
    ) -> Self {
        Self {
            asset_repository,
            price_repository,
            provider,
        }
    }

    /// Resolves a caller-supplied reference. Id-shaped input is tried as an
    /// id first; anything else, or an unknown id, falls back to a symbol
    /// lookup.
    pub fn resolve(&self, symbol_or_id: &str) -> Result<Asset> {
        let reference = symbol_or_id.trim();
        if reference.is_empty() {
            return Err(AssetError::InvalidData(
                "Asset reference cannot be empty".to_string(),
            ));
        }

        if ASSET_ID_RE.is_match(reference) {
            match self.asset_repository.get_by_id(reference) {
                Ok(asset) => return Ok(asset),
                Err(AssetError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        self.asset_repository
            .get_by_symbol(reference)?
            .ok_or_else(|| AssetError::NotFound(format!("Asset {} not found", reference)))
    }

    /// Returns the asset registered under the symbol, creating it on first
    /// sighting. Losing a creation race against a concurrent caller is not
    /// an error; the winner's row is re-read and returned.
    pub async fn get_or_create(&self, symbol: &str, hints: Option<NewAsset>) -> Result<Asset> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(AssetError::InvalidData(
                "Asset symbol cannot be empty".to_string(),
            ));
        }

        if let Some(existing) = self.asset_repository.get_by_symbol(symbol)? {
            return Ok(existing);
        }

        let mut new_asset = hints.unwrap_or_default();
        new_asset.symbol = symbol.to_string();

        match self.asset_repository.create(new_asset).await {
            Ok(asset) => {
                debug!("Registered new asset {} ({})", asset.symbol, asset.id);
                Ok(asset)
            }
            Err(AssetError::AlreadyExists(_)) => self
                .asset_repository
                .get_by_symbol(symbol)?
                .ok_or_else(|| AssetError::NotFound(format!("Asset {} not found", symbol))),
            Err(e) => Err(e),
        }
    }

    pub async fn create_asset(&self, new_asset: NewAsset) -> Result<Asset> {
        self.asset_repository.create(new_asset).await
    }

    pub async fn update_asset(&self, asset_id: &str, payload: UpdateAsset) -> Result<Asset> {
        self.asset_repository.update(asset_id, payload).await
    }

    pub async fn delete_asset(&self, asset_id: &str) -> Result<usize> {
        self.asset_repository.delete(asset_id).await
    }

    pub fn get_asset(&self, asset_id: &str) -> Result<Asset> {
        self.asset_repository.get_by_id(asset_id)
    }

    pub fn get_assets(&self) -> Result<Vec<Asset>> {
        self.asset_repository.list()
    }

    pub fn list_active_assets(&self) -> Result<Vec<Asset>> {
        self.asset_repository.list_active()
    }

    /// Detail view joining asset metadata with the latest observation. The
    /// price fields stay empty for assets that have never been priced.
    pub fn asset_overview(&self, symbol_or_id: &str) -> Result<AssetOverview> {
        let asset = self.resolve(symbol_or_id)?;
        let latest = self
            .price_repository
            .get_latest(&asset.id)
            .map_err(|e| AssetError::DatabaseError(e.to_string()))?;

        Ok(AssetOverview::new(asset, latest))
    }

    /// Listing view over an exchange's symbols with live quotes attached.
    /// Reads only; nothing is registered or persisted here.
    pub async fn market_stocks(
        &self,
        exchange: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<MarketStock>> {
        let exchange = exchange.unwrap_or(DEFAULT_EXCHANGE);
        let mut symbols = self
            .provider
            .fetch_symbols(exchange)
            .await
            .map_err(|e| AssetError::MarketDataError(e.to_string()))?;
        symbols.truncate(limit.unwrap_or(DEFAULT_MARKET_STOCKS_LIMIT));

        let tickers: Vec<String> = symbols.iter().map(|s| s.symbol.clone()).collect();
        let quote_map: HashMap<String, ProviderQuote> = self
            .provider
            .fetch_quotes(&tickers)
            .await
            .into_iter()
            .filter_map(|(symbol, result)| match result {
                Ok(quote) => Some((symbol, quote)),
                Err(e) => {
                    warn!("Quote fetch failed for {}: {}", symbol, e);
                    None
                }
            })
            .collect();

        let id_by_symbol: HashMap<String, String> = self
            .asset_repository
            .list()?
            .into_iter()
            .map(|a| (a.symbol.to_uppercase(), a.id))
            .collect();

        let stocks = symbols
            .into_iter()
            .map(|info| {
                let quote = quote_map.get(&info.symbol);
                MarketStock {
                    asset_id: id_by_symbol.get(&info.symbol.to_uppercase()).cloned(),
                    name: info.description,
                    price: quote.map(|q| q.price),
                    high24h: quote.and_then(|q| q.high),
                    low24h: quote.and_then(|q| q.low),
                    change_percent: quote.and_then(|q| q.change_percent),
                    timestamp: quote.map(|q| q.timestamp),
                    symbol: info.symbol,
                }
            })
            .collect();

        Ok(stocks)
    }
}

#[async_trait]
impl AssetServiceTrait for AssetService {
    fn resolve(&self, symbol_or_id: &str) -> Result<Asset> {
        self.resolve(symbol_or_id)
    }

    async fn get_or_create(&self, symbol: &str, hints: Option<NewAsset>) -> Result<Asset> {
        self.get_or_create(symbol, hints).await
    }

    async fn create_asset(&self, new_asset: NewAsset) -> Result<Asset> {
        self.create_asset(new_asset).await
    }

    async fn update_asset(&self, asset_id: &str, payload: UpdateAsset) -> Result<Asset> {
        self.update_asset(asset_id, payload).await
    }

    async fn delete_asset(&self, asset_id: &str) -> Result<usize> {
        self.delete_asset(asset_id).await
    }

    fn get_asset(&self, asset_id: &str) -> Result<Asset> {
        self.get_asset(asset_id)
    }

    fn get_assets(&self) -> Result<Vec<Asset>> {
        self.get_assets()
    }

    fn list_active_assets(&self) -> Result<Vec<Asset>> {
        self.list_active_assets()
    }

    fn asset_overview(&self, symbol_or_id: &str) -> Result<AssetOverview> {
        self.asset_overview(symbol_or_id)
    }

    async fn market_stocks(
        &self,
        exchange: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<MarketStock>> {
        self.market_stocks(exchange, limit).await
    }
}
