pub(crate) mod ingestion_constants;
pub(crate) mod ingestion_errors;
pub(crate) mod ingestion_model;
pub(crate) mod ingestion_service;
pub(crate) mod ingestion_traits;


pub use ingestion_constants::*;
pub use ingestion_errors::IngestionError;
pub use ingestion_model::{DiscoveryReport, IngestOutcome, IngestResult, RefreshReport};
pub use ingestion_service::IngestionService;
pub use ingestion_traits::IngestionServiceTrait;
