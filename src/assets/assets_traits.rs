use async_trait::async_trait;

use super::assets_errors::Result;
use super::assets_model::{Asset, AssetOverview, MarketStock, NewAsset, UpdateAsset};

/// Trait defining the contract for asset repository implementations
#[async_trait]
pub trait AssetRepositoryTrait: Send + Sync {
    fn get_by_id(&self, asset_id: &str) -> Result<Asset>;
    fn get_by_symbol(&self, symbol: &str) -> Result<Option<Asset>>;
    fn list(&self) -> Result<Vec<Asset>>;
    fn list_active(&self) -> Result<Vec<Asset>>;
    fn list_symbols(&self) -> Result<Vec<String>>;
    async fn create(&self, new_asset: NewAsset) -> Result<Asset>;
    async fn update(&self, asset_id: &str, payload: UpdateAsset) -> Result<Asset>;
    async fn delete(&self, asset_id: &str) -> Result<usize>;
}

/// Trait defining the contract for asset service implementations
#[async_trait]
pub trait AssetServiceTrait: Send + Sync {
    /// Resolves a caller-supplied reference to an asset, trying the id
    /// shape first and falling back to a symbol lookup.
    fn resolve(&self, symbol_or_id: &str) -> Result<Asset>;
    async fn get_or_create(&self, symbol: &str, hints: Option<NewAsset>) -> Result<Asset>;
    async fn create_asset(&self, new_asset: NewAsset) -> Result<Asset>;
    async fn update_asset(&self, asset_id: &str, payload: UpdateAsset) -> Result<Asset>;
    async fn delete_asset(&self, asset_id: &str) -> Result<usize>;
    fn get_asset(&self, asset_id: &str) -> Result<Asset>;
    fn get_assets(&self) -> Result<Vec<Asset>>;
    fn list_active_assets(&self) -> Result<Vec<Asset>>;
    fn asset_overview(&self, symbol_or_id: &str) -> Result<AssetOverview>;
    async fn market_stocks(
        &self,
        exchange: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<MarketStock>>;
}
