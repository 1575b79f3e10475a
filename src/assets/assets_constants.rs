/// Asset category identifiers
pub const CATEGORY_STOCK: &str = "STOCK";
pub const CATEGORY_CRYPTO: &str = "CRYPTO";
pub const CATEGORY_METAL: &str = "METAL";
pub const CATEGORY_FOREX: &str = "FOREX";
pub const CATEGORY_COMMODITY: &str = "COMMODITY";

/// Default number of entries returned by the market stocks listing when the
/// caller does not pass a limit
pub const DEFAULT_MARKET_STOCKS_LIMIT: usize = 25;
