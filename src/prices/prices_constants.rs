/// Default page size for range queries
pub const DEFAULT_PAGE_SIZE: i64 = 100;

/// Hard cap applied to caller-supplied page sizes
pub const MAX_PAGE_SIZE: i64 = 1000;

/// Default number of rows returned by the movers queries
pub const DEFAULT_TOP_LIMIT: i64 = 10;

/// Seconds a cached latest-price entry stays valid
pub const LATEST_PRICE_CACHE_TTL_SECS: u64 = 30;

/// Decimal places kept when rounding percent changes
pub const PERCENT_CHANGE_SCALE: u32 = 4;

/// Decimal places kept when rounding average prices
pub const AVERAGE_PRICE_SCALE: u32 = 8;
