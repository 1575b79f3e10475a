use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use pricewatch_core::assets::{AssetRepository, AssetService};
use pricewatch_core::db;
use pricewatch_core::ingestion::{IngestOutcome, IngestionError, IngestionService};
use pricewatch_core::market_data::{
    DataSource, MarketDataError, MarketDataProvider, ProviderQuote, SymbolInfo,
    DATA_SOURCE_FALLBACK, DATA_SOURCE_FINNHUB, DATA_SOURCE_MANUAL,
};
use pricewatch_core::prices::{
    NewPriceObservation, PriceRangeQuery, PriceRepository, PriceService,
};

mod common;

/// Provider whose quotes and listings are scripted per test.
#[derive(Default)]
struct ScriptedProvider {
    quotes: Mutex<HashMap<String, Decimal>>,
    symbols: Mutex<Vec<SymbolInfo>>,
    quote_timestamp: Mutex<Option<DateTime<Utc>>>,
}

impl ScriptedProvider {
    fn set_quote(&self, symbol: &str, price: Decimal) {
        self.quotes
            .lock()
            .unwrap()
            .insert(symbol.to_string(), price);
    }

    fn clear_quotes(&self) {
        self.quotes.lock().unwrap().clear();
    }

    fn set_symbols(&self, symbols: &[&str]) {
        *self.symbols.lock().unwrap() = symbols
            .iter()
            .map(|s| SymbolInfo {
                symbol: s.to_string(),
                display_symbol: Some(s.to_string()),
                description: Some(format!("{} Inc", s)),
                security_type: Some("Common Stock".to_string()),
                currency: Some("USD".to_string()),
            })
            .collect();
    }

    fn set_quote_timestamp(&self, timestamp: DateTime<Utc>) {
        *self.quote_timestamp.lock().unwrap() = Some(timestamp);
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedProvider {
    fn source(&self) -> DataSource {
        DataSource::Finnhub
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<ProviderQuote, MarketDataError> {
        let price = self
            .quotes
            .lock()
            .unwrap()
            .get(symbol)
            .copied()
            .ok_or_else(|| MarketDataError::Unreachable(format!("no quote for {}", symbol)))?;
        let timestamp = self.quote_timestamp.lock().unwrap().unwrap_or_else(Utc::now);

        Ok(ProviderQuote {
            symbol: symbol.to_string(),
            price,
            open: None,
            high: Some(price + dec!(1)),
            low: Some(price - dec!(1)),
            previous_close: None,
            change_percent: Some(dec!(1.5)),
            volume: Some(1_000),
            timestamp,
        })
    }

    async fn fetch_symbols(&self, _exchange: &str) -> Result<Vec<SymbolInfo>, MarketDataError> {
        Ok(self.symbols.lock().unwrap().clone())
    }
}

fn build_stack(
    pool: Arc<db::DbPool>,
    provider: Arc<ScriptedProvider>,
) -> (Arc<AssetService>, Arc<PriceService>, IngestionService) {
    let asset_repository = Arc::new(AssetRepository::new(pool.clone()));
    let price_repository = Arc::new(PriceRepository::new(pool));
    let asset_service = Arc::new(AssetService::new(
        asset_repository,
        price_repository.clone(),
        provider.clone(),
    ));
    let price_service = Arc::new(PriceService::new(
        asset_service.clone(),
        price_repository,
    ));
    let ingestion = IngestionService::new(
        asset_service.clone(),
        price_service.clone(),
        provider,
    )
    .with_pacing(std::time::Duration::ZERO);

    (asset_service, price_service, ingestion)
}

#[tokio::test]
async fn test_ingest_registers_symbol_and_stores_live_quote() {
    let (_dir, pool) = common::setup_db();
    let provider = Arc::new(ScriptedProvider::default());
    provider.set_quote("AAPL", dec!(175.43));
    let (asset_service, price_service, ingestion) = build_stack(pool, provider);

    let result = ingestion.ingest_asset("AAPL").await.unwrap();
    assert_eq!(result.outcome, IngestOutcome::Live);
    assert_eq!(result.asset.symbol, "AAPL");

    let stored = result.observation.unwrap();
    assert_eq!(stored.price, dec!(175.43));
    assert_eq!(stored.source, DATA_SOURCE_FINNHUB);
    assert_eq!(stored.volume, Some(1_000));

    // The symbol was registered on first sighting
    let asset = asset_service.resolve("aapl").unwrap();
    assert_eq!(asset.id, result.asset.id);
    assert_eq!(
        price_service.latest_price("AAPL").unwrap().id,
        stored.id
    );
}

#[tokio::test]
async fn test_provider_outage_carries_last_price_forward() {
    let (_dir, pool) = common::setup_db();
    let provider = Arc::new(ScriptedProvider::default());
    provider.set_quote("BTC-USD", dec!(64000.55));
    let (_asset_service, price_service, ingestion) = build_stack(pool, provider.clone());

    let live = ingestion.ingest_asset("BTC-USD").await.unwrap();
    assert_eq!(live.outcome, IngestOutcome::Live);
    let live_timestamp = live.observation.unwrap().timestamp;

    provider.clear_quotes();
    let fallback = ingestion.ingest_asset("BTC-USD").await.unwrap();
    assert_eq!(fallback.outcome, IngestOutcome::Fallback);

    let carried = fallback.observation.unwrap();
    assert_eq!(carried.price, dec!(64000.55));
    assert_eq!(carried.source, DATA_SOURCE_FALLBACK);
    assert!(carried.timestamp > live_timestamp);

    // The cached latest was invalidated by the fallback write
    let latest = price_service.latest_price("BTC-USD").unwrap();
    assert_eq!(latest.source, DATA_SOURCE_FALLBACK);
    assert_eq!(
        price_service
            .history("BTC-USD", PriceRangeQuery::default())
            .unwrap()
            .total_count,
        2
    );
}

#[tokio::test]
async fn test_outage_with_no_history_reports_no_data() {
    let (_dir, pool) = common::setup_db();
    let provider = Arc::new(ScriptedProvider::default());
    let (asset_service, price_service, ingestion) = build_stack(pool, provider);

    let result = ingestion.ingest_asset("GOOG").await;
    assert!(matches!(result, Err(IngestionError::NoDataAvailable(_))));

    // Registration is not rolled back; only the price write failed
    let asset = asset_service.resolve("GOOG").unwrap();
    assert!(price_service.get_latest(&asset.id).unwrap().is_none());
}

#[tokio::test]
async fn test_refetch_in_same_timestamp_bucket_is_skipped() {
    let (_dir, pool) = common::setup_db();
    let provider = Arc::new(ScriptedProvider::default());
    provider.set_quote("AAPL", dec!(175.43));
    provider.set_quote_timestamp(Utc.with_ymd_and_hms(2025, 3, 18, 14, 30, 0).unwrap());
    let (_asset_service, price_service, ingestion) = build_stack(pool, provider);

    let first = ingestion.ingest_asset("AAPL").await.unwrap();
    assert_eq!(first.outcome, IngestOutcome::Live);

    let second = ingestion.ingest_asset("AAPL").await.unwrap();
    assert_eq!(second.outcome, IngestOutcome::Skipped);
    assert!(second.observation.is_none());

    assert_eq!(
        price_service
            .history("AAPL", PriceRangeQuery::default())
            .unwrap()
            .total_count,
        1
    );
}

#[tokio::test]
async fn test_discovery_limits_new_symbols_and_isolates_failures() {
    let (_dir, pool) = common::setup_db();
    let provider = Arc::new(ScriptedProvider::default());
    provider.set_symbols(&["AAPL", "BBB", "CCC", "DDD"]);
    provider.set_quote("AAPL", dec!(175.43));
    provider.set_quote("BBB", dec!(12.80));
    provider.set_quote("DDD", dec!(3.14));
    let (asset_service, price_service, ingestion) = build_stack(pool, provider);

    // AAPL is already tracked, so the limit must apply to BBB and CCC only
    asset_service.get_or_create("AAPL", None).await.unwrap();

    let report = ingestion
        .discover_and_ingest(None, Some(2))
        .await
        .unwrap();

    assert_eq!(report.total_candidates, 4);
    assert_eq!(report.created, vec!["BBB", "CCC"]);
    assert_eq!(report.priced, vec!["BBB"]);
    assert!(report.skipped.is_empty());
    // CCC has no quote and no history, yet its failure did not abort the run
    assert_eq!(report.failed, vec!["CCC"]);

    assert_eq!(
        price_service.latest_price("BBB").unwrap().price,
        dec!(12.80)
    );
    let ccc = asset_service.resolve("CCC").unwrap();
    assert_eq!(ccc.name, "CCC Inc");
    assert!(price_service.get_latest(&ccc.id).unwrap().is_none());
    assert!(asset_service.resolve("DDD").is_err());
}

#[tokio::test]
async fn test_refresh_covers_every_tracked_asset() {
    let (_dir, pool) = common::setup_db();
    let provider = Arc::new(ScriptedProvider::default());
    provider.set_quote("AAPL", dec!(175.43));
    let (asset_service, price_service, ingestion) = build_stack(pool, provider);

    let aapl = asset_service.get_or_create("AAPL", None).await.unwrap();
    let msft = asset_service.get_or_create("MSFT", None).await.unwrap();
    let goog = asset_service.get_or_create("GOOG", None).await.unwrap();

    // MSFT has history to fall back on; GOOG has nothing
    price_service
        .add_price(NewPriceObservation {
            asset_id: msft.id.clone(),
            timestamp: Utc::now() - Duration::hours(24),
            price: dec!(410.00),
            source: DATA_SOURCE_MANUAL.to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let report = ingestion.refresh_tracked().await.unwrap();
    assert_eq!(report.total_assets, 3);
    assert_eq!(report.updated, vec!["AAPL", "MSFT"]);
    assert!(report.skipped.is_empty());
    assert_eq!(report.failed, vec!["GOOG"]);

    assert_eq!(
        price_service.get_latest(&aapl.id).unwrap().unwrap().source,
        DATA_SOURCE_FINNHUB
    );
    let carried = price_service.get_latest(&msft.id).unwrap().unwrap();
    assert_eq!(carried.price, dec!(410.00));
    assert_eq!(carried.source, DATA_SOURCE_FALLBACK);
    assert!(price_service.get_latest(&goog.id).unwrap().is_none());
}

#[tokio::test]
async fn test_query_engine_over_recorded_history() {
    let (_dir, pool) = common::setup_db();
    let provider = Arc::new(ScriptedProvider::default());
    let (asset_service, price_service, _ingestion) = build_stack(pool, provider);

    let asset = asset_service.get_or_create("AAPL", None).await.unwrap();
    let now = Utc::now();

    price_service
        .add_price(NewPriceObservation {
            asset_id: asset.id.clone(),
            timestamp: now - Duration::hours(48),
            price: dec!(170),
            source: String::new(),
            ..Default::default()
        })
        .await
        .unwrap();
    price_service
        .add_price(NewPriceObservation {
            asset_id: asset.id.clone(),
            timestamp: now - Duration::hours(1),
            price: dec!(175),
            source: DATA_SOURCE_MANUAL.to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    // Blank source defaults to the manual tag
    let seeded = price_service
        .latest_price_before("AAPL", now - Duration::hours(24))
        .unwrap()
        .unwrap();
    assert_eq!(seeded.source, DATA_SOURCE_MANUAL);

    // (175 - 170) / 170 * 100, rounded half-up to four places
    assert_eq!(
        price_service.percent_change("AAPL", 24).unwrap(),
        dec!(2.9412)
    );

    let stats = price_service.statistics("AAPL", "day").unwrap();
    assert_eq!(stats.count, 1);
    assert_eq!(stats.min_price, dec!(175));
    assert_eq!(stats.max_price, dec!(175));
    assert_eq!(stats.avg_price, dec!(175));

    let week = price_service.statistics("AAPL", "1w").unwrap();
    assert_eq!(week.count, 2);
    assert_eq!(week.min_price, dec!(170));
    assert_eq!(week.max_price, dec!(175));
    assert_eq!(week.avg_price, dec!(172.5));

    let candles = price_service.candles("AAPL", "week", None).unwrap();
    assert_eq!(candles.len(), 2);
    assert_eq!(candles[0].close, dec!(170));
    assert_eq!(candles[1].open, dec!(175));

    let page = price_service
        .history(
            "AAPL",
            PriceRangeQuery {
                page_size: Some(1),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(page.total_count, 2);
    assert_eq!(page.data[0].price, dec!(175));
}
