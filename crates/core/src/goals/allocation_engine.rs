//! Splits one incoming deposit across the goals still waiting for this
//! period's funding, then refreshes their projections and weights.

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, warn};
use rust_decimal::{Decimal, RoundingStrategy};

use super::finance_math::ProjectionParams;
use super::goals_model::{AllocationCase, AllocationLine, DepositAllocation, SavingGoal};
use super::weight_allocator::reweight_by_month_req;
use crate::constants::MONEY_DECIMAL_PRECISION;
use crate::errors::{Error, Result, ValidationError};
use crate::utils::time_utils::{add_months, months_between};

/// Splits `amount` in proportion to `weights` at cent precision.
///
/// Largest-remainder apportionment: every share is truncated to the cent and
/// the leftover cents go to the shares with the biggest truncated remainders
/// (ties to the earlier index). The parts sum exactly to a cent-precise
/// `amount` and are never negative. Non-positive weights count as zero; when
/// no weight is positive the split is equal.
pub fn apportion(amount: Decimal, weights: &[Decimal]) -> Vec<Decimal> {
    if weights.is_empty() {
        return Vec::new();
    }
    let n = weights.len();
    let positive_total: Decimal = weights.iter().filter(|w| **w > Decimal::ZERO).sum();

    let raw: Vec<Decimal> = if positive_total > Decimal::ZERO {
        weights
            .iter()
            .map(|w| amount * (*w).max(Decimal::ZERO) / positive_total)
            .collect()
    } else {
        let equal = amount / Decimal::from(n);
        vec![equal; n]
    };

    let mut parts: Vec<Decimal> = raw
        .iter()
        .map(|r| r.round_dp_with_strategy(MONEY_DECIMAL_PRECISION, RoundingStrategy::ToZero))
        .collect();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|a, b| {
        let rem_a = raw[*a] - parts[*a];
        let rem_b = raw[*b] - parts[*b];
        rem_b.cmp(&rem_a).then(a.cmp(b))
    });

    let cent = Decimal::new(1, MONEY_DECIMAL_PRECISION);
    let mut leftover = amount - parts.iter().sum::<Decimal>();
    let mut i = 0;
    while leftover >= cent {
        parts[order[i % n]] += cent;
        leftover -= cent;
        i += 1;
    }
    parts
}

/// Allocates `deposit_amount` over the active goals of one user.
///
/// Only goals that are active and not yet funded this period receive money.
/// When the deposit covers `Σ month_req` every pending goal gets its full
/// requirement and the surplus is split by weight; otherwise the whole
/// deposit is split by weight. Funded goals are then re-projected (locked:
/// new `month_req`; unlocked: new `target_date`), all active weights are
/// recomputed from `month_req`, and funded goals are marked `sent_money`.
///
/// The slice is only mutated on success.
pub fn allocate_deposit(
    active_goals: &mut [SavingGoal],
    deposit_amount: Decimal,
    params: &ProjectionParams,
    today: NaiveDate,
    now: NaiveDateTime,
) -> Result<DepositAllocation> {
    let deposit = deposit_amount.round_dp(MONEY_DECIMAL_PRECISION);
    if deposit <= Decimal::ZERO {
        return Err(Error::Validation(ValidationError::InvalidInput(format!(
            "Deposit amount must be positive, got {}",
            deposit_amount
        ))));
    }

    let pending: Vec<usize> = active_goals
        .iter()
        .enumerate()
        .filter(|(_, g)| g.is_pending_funding())
        .map(|(i, _)| i)
        .collect();

    if pending.is_empty() {
        debug!("No active goals pending allocation");
        return Ok(DepositAllocation::idle());
    }

    let total_required: Decimal = pending.iter().map(|i| active_goals[*i].month_req).sum();
    let weights: Vec<Decimal> = pending.iter().map(|i| active_goals[*i].weight).collect();

    let (case, amounts) = if deposit >= total_required {
        let surplus = apportion(deposit - total_required, &weights);
        let amounts = pending
            .iter()
            .zip(surplus)
            .map(|(i, extra)| active_goals[*i].month_req + extra)
            .collect::<Vec<_>>();
        (AllocationCase::Surplus, amounts)
    } else {
        (AllocationCase::Deficit, apportion(deposit, &weights))
    };
    debug!(
        "Deposit {} against required {}: {:?} across {} goals",
        deposit,
        total_required,
        case,
        pending.len()
    );

    let mut lines = Vec::with_capacity(pending.len());
    for (i, amount) in pending.iter().zip(amounts) {
        let goal = &mut active_goals[*i];
        goal.current_amount += amount;
        goal.sent_money = true;
        goal.updated_at = now;
        refresh_projection(goal, params, today);
        lines.push(AllocationLine {
            goal_id: goal.id.clone(),
            amount,
        });
    }

    reweight_by_month_req(active_goals);

    let total_allocated = lines.iter().map(|l| l.amount).sum();
    Ok(DepositAllocation {
        case,
        goals_funded: lines.len(),
        total_allocated,
        lines,
    })
}

/// Re-derives the floating side of a goal after its balance changed.
///
/// Locked goals get a new `month_req` for the months left until their fixed
/// date. Unlocked goals keep `month_req` and move `target_date`; an
/// unreachable projection leaves the date untouched.
pub fn refresh_projection(goal: &mut SavingGoal, params: &ProjectionParams, today: NaiveDate) {
    if goal.eta_lock {
        match goal.target_date {
            Some(target_date) => {
                let months_left = months_between(today, target_date);
                goal.month_req = params.required_monthly_payment(
                    goal.target_amount,
                    goal.current_amount,
                    months_left,
                );
            }
            None => warn!("Locked goal {} has no target date; keeping month_req", goal.id),
        }
        return;
    }

    match params.months_to_target(goal.target_amount, goal.current_amount, goal.month_req) {
        Some(eta) => match add_months(today, eta) {
            Some(date) => goal.target_date = Some(date),
            None => warn!("Projected date for goal {} is out of range", goal.id),
        },
        None => warn!(
            "Goal {} cannot reach {} within {} months at {} per month",
            goal.id, goal.target_amount, params.horizon_months, goal.month_req
        ),
    }
}
