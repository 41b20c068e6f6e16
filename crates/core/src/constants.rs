/// Decimal precision for monetary amounts (cents)
pub const MONEY_DECIMAL_PRECISION: u32 = 2;

/// Decimal precision for stored goal weights
pub const WEIGHT_DECIMAL_PRECISION: u32 = 5;

/// Tolerance for `Σ weight ≈ 1` checks over a user's active goals
pub const WEIGHT_SUM_TOLERANCE: &str = "0.0001";

/// Maximum number of active goals a user may hold
pub const DEFAULT_MAX_ACTIVE_GOALS: usize = 5;

/// Annual growth rate assumed for saved balances
pub const DEFAULT_ANNUAL_GROWTH_RATE: &str = "0.02";

/// Search horizon for months-to-target projections (50 years)
pub const MAX_PROJECTION_MONTHS: u32 = 600;
