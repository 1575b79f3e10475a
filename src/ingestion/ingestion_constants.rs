/// Fixed delay between sequential provider calls during batch runs
pub const BATCH_PACING_MS: u64 = 1000;

/// Default number of new assets a discovery run registers
pub const DEFAULT_DISCOVERY_LIMIT: usize = 10;
