pub mod db;

pub mod assets;
pub mod ingestion;
pub mod market_data;
pub mod prices;

pub mod errors;
pub mod schema;

pub use errors::{Error, Result};
pub use ingestion::*;
pub use prices::*;
