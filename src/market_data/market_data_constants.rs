/// Data source identifiers
pub const DATA_SOURCE_FINNHUB: &str = "FINNHUB";
pub const DATA_SOURCE_FALLBACK: &str = "FALLBACK";
pub const DATA_SOURCE_MANUAL: &str = "MANUAL";

/// Default provider endpoint
pub const FINNHUB_BASE_URL: &str = "https://finnhub.io/api/v1";

/// Environment variables read by `ProviderConfig::from_env`
pub const ENV_FINNHUB_API_KEY: &str = "FINNHUB_API_KEY";
pub const ENV_FINNHUB_BASE_URL: &str = "FINNHUB_BASE_URL";

/// Default values
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_EXCHANGE: &str = "US";
pub const QUOTE_FETCH_BATCH_SIZE: usize = 10;
