use async_trait::async_trait;

use super::ingestion_errors::Result;
use super::ingestion_model::{DiscoveryReport, IngestResult, RefreshReport};

/// Trait defining the contract for ingestion service implementations
#[async_trait]
pub trait IngestionServiceTrait: Send + Sync {
    async fn ingest_asset(&self, symbol_or_id: &str) -> Result<IngestResult>;
    async fn discover_and_ingest(
        &self,
        exchange: Option<&str>,
        limit: Option<usize>,
    ) -> Result<DiscoveryReport>;
    async fn refresh_tracked(&self) -> Result<RefreshReport>;
}
