//! Protocol-wide constants and configuration defaults

/// Basis point denominator (10000 = 100%)
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Maximum confidence value in basis points
pub const MAX_CONFIDENCE_BPS: u16 = 10_000;

/// Prices are 8-decimal fixed point ($45.00 = 4_500_000_000)
pub const PRICE_SCALE: u64 = 100_000_000;

/// Precision of the per-maturity yield index
pub const YIELD_INDEX_SCALE: u128 = 1_000_000_000_000;

/// Oracle defaults
pub const DEFAULT_HEARTBEAT_SECONDS: i64 = 3_600;
pub const DEFAULT_MAX_DEVIATION_BPS: u16 = 2_000; // 20%
pub const DEFAULT_MIN_UPDATE_INTERVAL: i64 = 60;
pub const MAX_UPDATERS: usize = 16;

/// Ledger limits
pub const MAX_MATURITIES: usize = 32;

/// Pool limits
pub const MAX_FEE_BPS: u16 = 1_000; // 10%

/// Converter defaults (50% of the YT balance, 50% confidence)
pub const DEFAULT_CONVERSION_BPS: u16 = 5_000;
pub const DEFAULT_MIN_CONFIDENCE_BPS: u16 = 5_000;

pub const SECONDS_PER_DAY: i64 = 86_400;
