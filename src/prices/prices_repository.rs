use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use std::sync::Arc;

use super::prices_constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use super::prices_errors::Result;
use super::prices_model::{
    NewPriceObservation, PriceDB, PricePage, PriceObservation, PriceRangeQuery, TopField,
};
use super::prices_traits::PriceRepositoryTrait;
use crate::db::{get_connection, DbPool};
use crate::schema::prices;

/// Repository for managing price observation records
pub struct PriceRepository {
    pool: Arc<DbPool>,
}

impl PriceRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// Returns the most recent observation for an asset. Ties on timestamp
    /// are broken by insertion time.
    pub fn get_latest(&self, asset_id: &str) -> Result<Option<PriceObservation>> {
        let mut conn = get_connection(&self.pool)?;
        let price_db = prices::table
            .filter(prices::asset_id.eq(asset_id))
            .order((prices::timestamp.desc(), prices::created_at.desc()))
            .first::<PriceDB>(&mut conn)
            .optional()?;

        Ok(price_db.map(PriceObservation::from))
    }

    /// Returns the most recent observation strictly before the cutoff.
    pub fn get_latest_before(
        &self,
        asset_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<PriceObservation>> {
        let mut conn = get_connection(&self.pool)?;
        let price_db = prices::table
            .filter(prices::asset_id.eq(asset_id))
            .filter(prices::timestamp.lt(cutoff.naive_utc()))
            .order((prices::timestamp.desc(), prices::created_at.desc()))
            .first::<PriceDB>(&mut conn)
            .optional()?;

        Ok(price_db.map(PriceObservation::from))
    }

    pub fn find_by_key(
        &self,
        asset_id: &str,
        timestamp: DateTime<Utc>,
        source: &str,
    ) -> Result<Option<PriceObservation>> {
        let mut conn = get_connection(&self.pool)?;
        let price_db = prices::table
            .filter(prices::asset_id.eq(asset_id))
            .filter(prices::timestamp.eq(timestamp.naive_utc()))
            .filter(prices::source.eq(source))
            .first::<PriceDB>(&mut conn)
            .optional()?;

        Ok(price_db.map(PriceObservation::from))
    }

    /// Pages through an asset's observations. Either bound may be absent,
    /// collapsing the four query shapes into one.
    pub fn get_range(&self, asset_id: &str, query: PriceRangeQuery) -> Result<PricePage> {
        let mut conn = get_connection(&self.pool)?;

        let build_query = || {
            let mut filtered = prices::table
                .filter(prices::asset_id.eq(asset_id))
                .into_boxed();
            if let Some(from) = query.from {
                filtered = filtered.filter(prices::timestamp.ge(from.naive_utc()));
            }
            if let Some(to) = query.to {
                filtered = filtered.filter(prices::timestamp.le(to.naive_utc()));
            }
            filtered
        };

        let total_count = build_query().count().get_result::<i64>(&mut conn)?;

        let page = query.page.unwrap_or(1).max(1);
        let page_size = query
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        let mut rows_query = build_query();
        rows_query = if query.ascending {
            rows_query.order((prices::timestamp.asc(), prices::created_at.asc()))
        } else {
            rows_query.order((prices::timestamp.desc(), prices::created_at.desc()))
        };

        let rows = rows_query
            .offset((page - 1) * page_size)
            .limit(page_size)
            .load::<PriceDB>(&mut conn)?;

        Ok(PricePage {
            data: rows.into_iter().map(PriceObservation::from).collect(),
            total_count,
            page,
            page_size,
        })
    }

    /// Returns all observations at or after the given time, oldest first.
    pub fn get_since(
        &self,
        asset_id: &str,
        from: DateTime<Utc>,
    ) -> Result<Vec<PriceObservation>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = prices::table
            .filter(prices::asset_id.eq(asset_id))
            .filter(prices::timestamp.ge(from.naive_utc()))
            .order((prices::timestamp.asc(), prices::created_at.asc()))
            .load::<PriceDB>(&mut conn)?;

        Ok(rows.into_iter().map(PriceObservation::from).collect())
    }

    /// Ranks assets by a field of their most recent observation. One row per
    /// asset; rows missing the ranking field are skipped.
    pub fn get_top_by_field(
        &self,
        field: TopField,
        limit: i64,
        ascending: bool,
    ) -> Result<Vec<PriceObservation>> {
        let mut conn = get_connection(&self.pool)?;
        let direction = if ascending { "ASC" } else { "DESC" };
        let sql = format!(
            "SELECT p.* FROM ( \
                SELECT *, ROW_NUMBER() OVER ( \
                    PARTITION BY asset_id ORDER BY timestamp DESC, created_at DESC \
                ) AS row_num FROM prices \
            ) p \
            WHERE p.row_num = 1 AND {} \
            ORDER BY {} {} \
            LIMIT ?",
            field.filter_expr(),
            field.order_expr(),
            direction
        );

        let rows = diesel::sql_query(sql)
            .bind::<BigInt, _>(limit)
            .load::<PriceDB>(&mut conn)?;

        Ok(rows.into_iter().map(PriceObservation::from).collect())
    }

    pub fn insert_observation(
        &self,
        observation: NewPriceObservation,
    ) -> Result<PriceObservation> {
        observation.validate()?;

        let price_db = PriceDB::from(observation);
        let mut conn = get_connection(&self.pool)?;
        let inserted = diesel::insert_into(prices::table)
            .values(&price_db)
            .get_result::<PriceDB>(&mut conn)?;

        Ok(PriceObservation::from(inserted))
    }

    /// Retention cleanup. Scoped to one asset when an id is given, otherwise
    /// applied across all assets.
    pub fn delete_observations_before(
        &self,
        asset_id: Option<&str>,
        cutoff: DateTime<Utc>,
    ) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;
        let deleted = match asset_id {
            Some(asset_id) => diesel::delete(
                prices::table
                    .filter(prices::asset_id.eq(asset_id))
                    .filter(prices::timestamp.lt(cutoff.naive_utc())),
            )
            .execute(&mut conn)?,
            None => diesel::delete(
                prices::table.filter(prices::timestamp.lt(cutoff.naive_utc())),
            )
            .execute(&mut conn)?,
        };

        Ok(deleted)
    }

    pub fn delete_observations_for_asset(&self, asset_id: &str) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;
        let deleted = diesel::delete(prices::table.filter(prices::asset_id.eq(asset_id)))
            .execute(&mut conn)?;

        Ok(deleted)
    }
}

#[async_trait]
impl PriceRepositoryTrait for PriceRepository {
    fn get_latest(&self, asset_id: &str) -> Result<Option<PriceObservation>> {
        self.get_latest(asset_id)
    }

    fn get_latest_before(
        &self,
        asset_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<PriceObservation>> {
        self.get_latest_before(asset_id, cutoff)
    }

    fn find_by_key(
        &self,
        asset_id: &str,
        timestamp: DateTime<Utc>,
        source: &str,
    ) -> Result<Option<PriceObservation>> {
        self.find_by_key(asset_id, timestamp, source)
    }

    fn get_range(&self, asset_id: &str, query: PriceRangeQuery) -> Result<PricePage> {
        self.get_range(asset_id, query)
    }

    fn get_since(&self, asset_id: &str, from: DateTime<Utc>) -> Result<Vec<PriceObservation>> {
        self.get_since(asset_id, from)
    }

    fn get_top_by_field(
        &self,
        field: TopField,
        limit: i64,
        ascending: bool,
    ) -> Result<Vec<PriceObservation>> {
        self.get_top_by_field(field, limit, ascending)
    }

    async fn insert(&self, observation: NewPriceObservation) -> Result<PriceObservation> {
        self.insert_observation(observation)
    }

    async fn delete_before(
        &self,
        asset_id: Option<&str>,
        cutoff: DateTime<Utc>,
    ) -> Result<usize> {
        self.delete_observations_before(asset_id, cutoff)
    }

    async fn delete_all_for_asset(&self, asset_id: &str) -> Result<usize> {
        self.delete_observations_for_asset(asset_id)
    }
}
