use async_trait::async_trait;
use chrono::Utc;
use rust_decimal_macros::dec;
use std::sync::Arc;

use pricewatch_core::assets::{
    AssetError, AssetRepository, AssetService, NewAsset, UpdateAsset, CATEGORY_CRYPTO,
    CATEGORY_STOCK,
};
use pricewatch_core::market_data::{
    DataSource, MarketDataError, MarketDataProvider, ProviderQuote, SymbolInfo,
    DATA_SOURCE_MANUAL,
};
use pricewatch_core::prices::{NewPriceObservation, PriceRepository};

mod common;

/// Provider stub for tests that never touch the network.
struct StubProvider;

#[async_trait]
impl MarketDataProvider for StubProvider {
    fn source(&self) -> DataSource {
        DataSource::Finnhub
    }

    async fn fetch_quote(
        &self,
        symbol: &str,
    ) -> Result<ProviderQuote, MarketDataError> {
        Err(MarketDataError::Unreachable(format!(
            "no live quotes in tests: {}",
            symbol
        )))
    }

    async fn fetch_symbols(
        &self,
        _exchange: &str,
    ) -> Result<Vec<SymbolInfo>, MarketDataError> {
        Ok(Vec::new())
    }
}

fn new_asset(symbol: &str) -> NewAsset {
    NewAsset {
        symbol: symbol.to_string(),
        ..Default::default()
    }
}

#[test]
fn test_symbol_uniqueness_is_case_insensitive() {
    let (_dir, pool) = common::setup_db();
    let repository = AssetRepository::new(pool);

    repository.insert(new_asset("AAPL")).unwrap();
    let result = repository.insert(new_asset("aapl"));
    assert!(matches!(result, Err(AssetError::AlreadyExists(_))));
}

#[test]
fn test_get_by_symbol_ignores_case() {
    let (_dir, pool) = common::setup_db();
    let repository = AssetRepository::new(pool);

    let created = repository.insert(new_asset("BTC-USD")).unwrap();
    let found = repository.get_by_symbol("btc-usd").unwrap();
    assert_eq!(found.map(|a| a.id), Some(created.id));
    assert!(repository.get_by_symbol("ETH-USD").unwrap().is_none());
}

#[test]
fn test_insert_defaults_and_explicit_fields() {
    let (_dir, pool) = common::setup_db();
    let repository = AssetRepository::new(pool);

    let defaulted = repository.insert(new_asset("AAPL")).unwrap();
    assert_eq!(defaulted.name, "AAPL");
    assert_eq!(defaulted.category, CATEGORY_STOCK);
    assert!(defaulted.is_active);

    let explicit = repository
        .insert(NewAsset {
            symbol: "BTC-USD".to_string(),
            name: Some("Bitcoin".to_string()),
            description: Some("Crypto pair".to_string()),
            category: Some(CATEGORY_CRYPTO.to_string()),
        })
        .unwrap();
    assert_eq!(explicit.name, "Bitcoin");
    assert_eq!(explicit.category, CATEGORY_CRYPTO);
}

#[test]
fn test_update_leaves_absent_fields_untouched() {
    let (_dir, pool) = common::setup_db();
    let repository = AssetRepository::new(pool);

    let created = repository
        .insert(NewAsset {
            symbol: "AAPL".to_string(),
            name: Some("Apple".to_string()),
            description: Some("Common Stock".to_string()),
            category: None,
        })
        .unwrap();

    let updated = repository
        .update_asset(
            &created.id,
            UpdateAsset {
                name: Some("Apple Inc".to_string()),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(updated.name, "Apple Inc");
    assert!(!updated.is_active);
    assert_eq!(updated.description.as_deref(), Some("Common Stock"));
    assert_eq!(updated.category, CATEGORY_STOCK);
    assert_eq!(updated.symbol, "AAPL");
}

#[test]
fn test_update_unknown_asset_errors() {
    let (_dir, pool) = common::setup_db();
    let repository = AssetRepository::new(pool);

    let result = repository.update_asset(
        "missing-id",
        UpdateAsset {
            name: Some("Whatever".to_string()),
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(AssetError::NotFound(_))));
}

#[test]
fn test_list_active_filters_inactive_assets() {
    let (_dir, pool) = common::setup_db();
    let repository = AssetRepository::new(pool);

    let kept = repository.insert(new_asset("AAPL")).unwrap();
    let retired = repository.insert(new_asset("MSFT")).unwrap();
    repository
        .update_asset(
            &retired.id,
            UpdateAsset {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

    let active = repository.list_active().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, kept.id);
    assert_eq!(repository.list().unwrap().len(), 2);
}

#[test]
fn test_delete_asset_cascades_observations() {
    let (_dir, pool) = common::setup_db();
    let assets = AssetRepository::new(pool.clone());
    let prices = PriceRepository::new(pool);

    let asset = assets.insert(new_asset("AAPL")).unwrap();
    let now = Utc::now();
    prices
        .insert_observation(NewPriceObservation {
            asset_id: asset.id.clone(),
            timestamp: now,
            price: dec!(175.43),
            source: DATA_SOURCE_MANUAL.to_string(),
            ..Default::default()
        })
        .unwrap();

    assets.delete_asset(&asset.id).unwrap();
    assert!(matches!(
        assets.get_by_id(&asset.id),
        Err(AssetError::NotFound(_))
    ));
    assert!(prices.get_latest(&asset.id).unwrap().is_none());
}

#[test]
fn test_observation_requires_known_asset() {
    let (_dir, pool) = common::setup_db();
    let prices = PriceRepository::new(pool);

    let result = prices.insert_observation(NewPriceObservation {
        asset_id: "no-such-asset".to_string(),
        timestamp: Utc::now(),
        price: dec!(1),
        source: DATA_SOURCE_MANUAL.to_string(),
        ..Default::default()
    });

    assert!(matches!(
        result,
        Err(pricewatch_core::prices::PriceError::ConstraintViolation(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_get_or_create_yields_one_row() {
    let (_dir, pool) = common::setup_db();
    let asset_repository = Arc::new(AssetRepository::new(pool.clone()));
    let price_repository = Arc::new(PriceRepository::new(pool));
    let service = Arc::new(AssetService::new(
        asset_repository,
        price_repository,
        Arc::new(StubProvider),
    ));

    let first = {
        let service = service.clone();
        tokio::spawn(async move { service.get_or_create("NVDA", None).await })
    };
    let second = {
        let service = service.clone();
        tokio::spawn(async move { service.get_or_create("nvda", None).await })
    };

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();
    assert_eq!(first.id, second.id);

    let all = service.get_assets().unwrap();
    assert_eq!(all.len(), 1);
}
