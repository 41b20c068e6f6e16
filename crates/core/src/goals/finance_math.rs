//! Annuity math under a fixed monthly growth rate.
//!
//! Every function here is pure. Balances grow by `(1 + r)` per month and a
//! level payment is added at the end of each month, so after `n` months a
//! balance `current` with payment `p` is worth
//! `current·(1+r)^n + p·((1+r)^n − 1)/r`.

use log::warn;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::constants::{MAX_PROJECTION_MONTHS, MONEY_DECIMAL_PRECISION};

/// Below this rate the annuity factor is exactly `n` at stored precision.
const NEGLIGIBLE_RATE: Decimal = dec!(0.000000000001);

/// Below this rate the annuity factor uses its second-order expansion.
const SERIES_RATE: Decimal = dec!(0.000001);

/// Slack when comparing a projected balance to its target, absorbing the
/// last-digit error of the 28-digit power computation.
const PROJECTION_TOLERANCE: Decimal = dec!(0.000001);

/// Monthly growth rate and projection horizon shared by all projections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionParams {
    pub monthly_rate: Decimal,
    /// Exclusive upper bound of the months-to-target search.
    pub horizon_months: u32,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            monthly_rate: monthly_rate_from_annual(dec!(0.02)),
            horizon_months: MAX_PROJECTION_MONTHS,
        }
    }
}

impl ProjectionParams {
    pub fn months_to_target(
        &self,
        target: Decimal,
        current: Decimal,
        monthly_payment: Decimal,
    ) -> Option<u32> {
        months_to_target_within(
            target,
            current,
            monthly_payment,
            self.monthly_rate,
            self.horizon_months,
        )
    }

    pub fn required_monthly_payment(&self, target: Decimal, current: Decimal, months: i64) -> Decimal {
        required_monthly_payment(target, current, months, self.monthly_rate)
    }
}

/// Converts an annual rate to its compounding monthly equivalent:
/// `(1 + annual)^(1/12) − 1`.
pub fn monthly_rate_from_annual(annual: Decimal) -> Decimal {
    if annual.is_zero() {
        return Decimal::ZERO;
    }
    let base = Decimal::ONE + annual;
    if base <= Decimal::ZERO {
        warn!("Annual rate {} implies a total loss; using a zero monthly rate", annual);
        return Decimal::ZERO;
    }
    match base.checked_powd(Decimal::ONE / Decimal::from(12)) {
        Some(monthly) => monthly - Decimal::ONE,
        None => {
            warn!("Could not derive a monthly rate from annual rate {}", annual);
            Decimal::ZERO
        }
    }
}

/// `(1 + r)^n`, or `None` on overflow.
pub fn growth_factor(months: u32, monthly_rate: Decimal) -> Option<Decimal> {
    (Decimal::ONE + monthly_rate).checked_powu(u64::from(months))
}

/// Future value of a unit payment stream: `((1+r)^n − 1)/r`.
///
/// Near `r = 0` the quotient is replaced by `n` (or `n + n(n−1)/2·r`) so no
/// division by a near-zero rate ever happens.
pub fn annuity_factor(months: u32, monthly_rate: Decimal) -> Decimal {
    let n = Decimal::from(months);
    let magnitude = monthly_rate.abs();
    if magnitude < NEGLIGIBLE_RATE {
        return n;
    }
    if magnitude < SERIES_RATE {
        return n + n * (n - Decimal::ONE) / Decimal::TWO * monthly_rate;
    }
    match growth_factor(months, monthly_rate) {
        Some(factor) => (factor - Decimal::ONE) / monthly_rate,
        None => Decimal::MAX,
    }
}

/// Smallest `n` in `[1, 600)` for which the balance reaches `target`.
///
/// `None` means "needs more funding": a non-positive payment or a target out
/// of reach within the horizon. It is never an error.
pub fn months_to_target(
    target: Decimal,
    current: Decimal,
    monthly_payment: Decimal,
    monthly_rate: Decimal,
) -> Option<u32> {
    months_to_target_within(
        target,
        current,
        monthly_payment,
        monthly_rate,
        MAX_PROJECTION_MONTHS,
    )
}

/// [`months_to_target`] with an explicit exclusive horizon.
pub fn months_to_target_within(
    target: Decimal,
    current: Decimal,
    monthly_payment: Decimal,
    monthly_rate: Decimal,
    horizon_months: u32,
) -> Option<u32> {
    if monthly_payment <= Decimal::ZERO {
        return None;
    }
    for n in 1..horizon_months {
        let factor = growth_factor(n, monthly_rate)?;
        let future_value = current * factor + monthly_payment * annuity_factor(n, monthly_rate);
        if future_value + PROJECTION_TOLERANCE >= target {
            return Some(n);
        }
    }
    None
}

/// Level monthly payment that reaches `target` in exactly `months` months.
///
/// Rounded up to the cent, so projecting the result back never lands later
/// than `months`. Zero when `months <= 0` or when the current balance alone
/// already reaches the target at that horizon; never negative.
pub fn required_monthly_payment(
    target: Decimal,
    current: Decimal,
    months: i64,
    monthly_rate: Decimal,
) -> Decimal {
    if months <= 0 {
        return Decimal::ZERO;
    }
    let months = match u32::try_from(months) {
        Ok(m) => m,
        Err(_) => return Decimal::ZERO,
    };
    let factor = match growth_factor(months, monthly_rate) {
        Some(f) => f,
        None => {
            warn!("Growth factor overflow over {} months; no contribution required", months);
            return Decimal::ZERO;
        }
    };

    let grown_current = current * factor;
    if grown_current >= target {
        return Decimal::ZERO;
    }

    let annuity = annuity_factor(months, monthly_rate);
    if annuity <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    ((target - grown_current) / annuity)
        .round_dp_with_strategy(MONEY_DECIMAL_PRECISION, RoundingStrategy::AwayFromZero)
}
