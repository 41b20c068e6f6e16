//! Tiered weight allocation and proportional reweighting.
//!
//! Weights are fractions of the monthly deposit. Unlocked goals draw on a
//! fixed per-tier pool; locked goals hold the fraction their `month_req`
//! already commits.

use std::collections::BTreeMap;
use std::str::FromStr;

use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::goals_errors::GoalError;
use super::goals_model::{Priority, SavingGoal};
use crate::constants::{WEIGHT_DECIMAL_PRECISION, WEIGHT_SUM_TOLERANCE};
use crate::errors::{Error, Result, ValidationError};

/// Base weight pool of a tier, in percent of the deposit.
pub fn tier_base_pool(priority: Priority) -> Decimal {
    match priority {
        Priority::High => dec!(50),
        Priority::Medium => dec!(30),
        Priority::Low => dec!(20),
    }
}

/// Number of goals a tier's pool is split between, however many are present.
pub fn tier_capacity(priority: Priority) -> u32 {
    match priority {
        Priority::High => 1,
        Priority::Medium => 2,
        Priority::Low => 2,
    }
}

/// Per-goal base share of a tier, in percent.
///
/// Identical for every goal of the tier; when fewer goals than the capacity
/// are present the unused share is redistributed by normalization, not handed
/// to the goals that are present.
pub fn base_share(priority: Priority) -> Decimal {
    tier_base_pool(priority) / Decimal::from(tier_capacity(priority))
}

/// Result of a tiered allocation, index-aligned with the input priorities.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightAllocation {
    pub weights: Vec<Decimal>,
    /// Fraction of the deposit already committed to locked goals.
    pub locked_fraction: Decimal,
    /// `1 − locked_fraction`, shared among the unlocked goals.
    pub unlocked_budget: Decimal,
    /// Sum of the base shares of all unlocked goals, in percent.
    pub total_present_weight: Decimal,
}

/// Computes the weights of the unlocked goals.
///
/// `locked_required` is `Σ month_req` of the locked goals and
/// `monthly_deposit` the user's total deposit. Each unlocked weight is
/// `(1 − locked_fraction) × base_share / Σ base_share`, rounded to 5 digits.
pub fn allocate_tier_weights(
    priorities: &[Priority],
    locked_required: Decimal,
    monthly_deposit: Decimal,
) -> Result<WeightAllocation> {
    if monthly_deposit <= Decimal::ZERO {
        return Err(Error::Validation(ValidationError::InvalidInput(format!(
            "Monthly deposit must be positive, got {}",
            monthly_deposit
        ))));
    }
    if locked_required > monthly_deposit {
        return Err(GoalError::InsufficientDeposit {
            locked_required,
            deposit: monthly_deposit,
        }
        .into());
    }

    let locked_fraction = locked_required / monthly_deposit;
    let unlocked_budget = Decimal::ONE - locked_fraction;

    let mut tier_counts: BTreeMap<i32, usize> = BTreeMap::new();
    for priority in priorities {
        *tier_counts.entry(priority.level()).or_default() += 1;
    }

    let total_present_weight: Decimal = priorities.iter().map(|p| base_share(*p)).sum();
    debug!(
        "Tier allocation: goals per tier {:?}, present weight {}%, locked fraction {}",
        tier_counts, total_present_weight, locked_fraction
    );

    let weights = if total_present_weight.is_zero() {
        Vec::new()
    } else {
        priorities
            .iter()
            .map(|p| {
                (unlocked_budget * base_share(*p) / total_present_weight)
                    .round_dp(WEIGHT_DECIMAL_PRECISION)
            })
            .collect()
    };

    Ok(WeightAllocation {
        weights,
        locked_fraction,
        unlocked_budget,
        total_present_weight,
    })
}

/// Sets every goal's weight to `month_req / Σ month_req`.
///
/// Falls back to an equal split when the total is zero. Returns `true` when
/// the fallback was used.
pub fn reweight_by_month_req(goals: &mut [SavingGoal]) -> bool {
    if goals.is_empty() {
        return false;
    }
    let total: Decimal = goals.iter().map(|g| g.month_req).sum();

    if total <= Decimal::ZERO {
        let equal = (Decimal::ONE / Decimal::from(goals.len())).round_dp(WEIGHT_DECIMAL_PRECISION);
        warn!(
            "Total monthly requirement is zero; splitting weight equally across {} goals",
            goals.len()
        );
        for goal in goals.iter_mut() {
            goal.weight = equal;
        }
        return true;
    }

    for goal in goals.iter_mut() {
        goal.weight = (goal.month_req / total).round_dp(WEIGHT_DECIMAL_PRECISION);
    }
    false
}

pub fn total_weight(goals: &[SavingGoal]) -> Decimal {
    goals.iter().map(|g| g.weight).sum()
}

/// Whether the weights of an active goal set sum to 1 within tolerance.
/// An empty set is trivially balanced.
pub fn is_weight_balanced(goals: &[SavingGoal]) -> bool {
    if goals.is_empty() {
        return true;
    }
    let tolerance = Decimal::from_str(WEIGHT_SUM_TOLERANCE).unwrap_or(dec!(0.0001));
    (total_weight(goals) - Decimal::ONE).abs() <= tolerance
}
