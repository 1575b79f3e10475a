use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;

use super::assets_errors::{AssetError, Result};
use super::assets_model::{Asset, AssetDB, NewAsset, UpdateAsset};
use super::assets_traits::AssetRepositoryTrait;
use crate::db::{get_connection, DbPool};
use crate::schema::{assets, prices};

/// Repository for managing asset records
pub struct AssetRepository {
    pool: Arc<DbPool>,
}

impl AssetRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    pub fn get_by_id(&self, asset_id: &str) -> Result<Asset> {
        let mut conn = get_connection(&self.pool)?;
        let asset_db = assets::table
            .find(asset_id)
            .first::<AssetDB>(&mut conn)
            .optional()?;

        asset_db
            .map(Asset::from)
            .ok_or_else(|| AssetError::NotFound(format!("Asset {} not found", asset_id)))
    }

    /// Looks an asset up by symbol. The symbol column carries a NOCASE
    /// collation, so the comparison is case-insensitive.
    pub fn get_by_symbol(&self, symbol: &str) -> Result<Option<Asset>> {
        let mut conn = get_connection(&self.pool)?;
        let asset_db = assets::table
            .filter(assets::symbol.eq(symbol))
            .first::<AssetDB>(&mut conn)
            .optional()?;

        Ok(asset_db.map(Asset::from))
    }

    pub fn list(&self) -> Result<Vec<Asset>> {
        let mut conn = get_connection(&self.pool)?;
        let asset_dbs = assets::table
            .order(assets::symbol.asc())
            .load::<AssetDB>(&mut conn)?;

        Ok(asset_dbs.into_iter().map(Asset::from).collect())
    }

    pub fn list_active(&self) -> Result<Vec<Asset>> {
        let mut conn = get_connection(&self.pool)?;
        let asset_dbs = assets::table
            .filter(assets::is_active.eq(true))
            .order(assets::symbol.asc())
            .load::<AssetDB>(&mut conn)?;

        Ok(asset_dbs.into_iter().map(Asset::from).collect())
    }

    pub fn list_symbols(&self) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        let symbols = assets::table
            .select(assets::symbol)
            .load::<String>(&mut conn)?;

        Ok(symbols)
    }

    pub fn insert(&self, new_asset: NewAsset) -> Result<Asset> {
        new_asset.validate()?;

        let asset_db = AssetDB::from(new_asset);
        let mut conn = get_connection(&self.pool)?;
        let inserted = diesel::insert_into(assets::table)
            .values(&asset_db)
            .get_result::<AssetDB>(&mut conn)?;

        Ok(Asset::from(inserted))
    }

    pub fn update_asset(&self, asset_id: &str, payload: UpdateAsset) -> Result<Asset> {
        payload.validate()?;

        let mut conn = get_connection(&self.pool)?;
        let now = chrono::Utc::now().naive_utc();
        let updated = diesel::update(assets::table.find(asset_id))
            .set((&payload, assets::updated_at.eq(now)))
            .get_result::<AssetDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    AssetError::NotFound(format!("Asset {} not found", asset_id))
                }
                _ => AssetError::from(e),
            })?;

        Ok(Asset::from(updated))
    }

    /// Deletes an asset together with all of its stored prices.
    pub fn delete_asset(&self, asset_id: &str) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;
        conn.transaction(|conn| {
            diesel::delete(prices::table.filter(prices::asset_id.eq(asset_id)))
                .execute(conn)?;

            let deleted = diesel::delete(assets::table.find(asset_id)).execute(conn)?;
            if deleted == 0 {
                return Err(AssetError::NotFound(format!(
                    "Asset {} not found",
                    asset_id
                )));
            }

            Ok(deleted)
        })
    }
}

#[async_trait]
impl AssetRepositoryTrait for AssetRepository {
    fn get_by_id(&self, asset_id: &str) -> Result<Asset> {
        self.get_by_id(asset_id)
    }

    fn get_by_symbol(&self, symbol: &str) -> Result<Option<Asset>> {
        self.get_by_symbol(symbol)
    }

    fn list(&self) -> Result<Vec<Asset>> {
        self.list()
    }

    fn list_active(&self) -> Result<Vec<Asset>> {
        self.list_active()
    }

    fn list_symbols(&self) -> Result<Vec<String>> {
        self.list_symbols()
    }

    async fn create(&self, new_asset: NewAsset) -> Result<Asset> {
        self.insert(new_asset)
    }

    async fn update(&self, asset_id: &str, payload: UpdateAsset) -> Result<Asset> {
        self.update_asset(asset_id, payload)
    }

    async fn delete(&self, asset_id: &str) -> Result<usize> {
        self.delete_asset(asset_id)
    }
}
