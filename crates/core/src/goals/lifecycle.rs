//! Goal lifecycle planning: creation, pause and delete.
//!
//! The planners are pure. They take the user's current active goals, apply
//! one transition in memory and return every row that has to be written, so
//! the service can commit the whole result inside a single ledger scope.
//!
//! ```text
//!   ∅ ──create──▶ Active ──pause──▶ Paused
//!                   │
//!                   └────delete───▶ Deleted (row removed)
//! ```

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, warn};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::allocation_engine::refresh_projection;
use super::finance_math::ProjectionParams;
use super::goals_errors::GoalError;
use super::goals_model::{
    CreatedGoal, GoalProjection, GoalStatus, NewSavingGoal, Priority, SavingGoal,
};
use super::weight_allocator::{allocate_tier_weights, reweight_by_month_req};
use crate::config::GoalEngineConfig;
use crate::constants::{MONEY_DECIMAL_PRECISION, WEIGHT_DECIMAL_PRECISION};
use crate::errors::{Error, Result, ValidationError};
use crate::utils::time_utils::months_between;

/// Rows produced by a creation.
#[derive(Debug, Clone)]
pub struct CreationPlan {
    /// New goals followed by every re-weighted existing goal.
    pub goals: Vec<SavingGoal>,
    pub created: Vec<CreatedGoal>,
}

/// Rows produced by a pause or delete.
#[derive(Debug, Clone)]
pub struct RemovalPlan {
    /// The goal leaving the active set, already carrying its new status.
    pub removed: SavingGoal,
    /// Remaining active goals with renormalized weights.
    pub remaining: Vec<SavingGoal>,
}

/// Checks a status change against the lifecycle state machine.
pub fn ensure_transition(from: GoalStatus, to: GoalStatus) -> Result<()> {
    match (from, to) {
        (GoalStatus::Active, GoalStatus::Paused) | (GoalStatus::Active, GoalStatus::Deleted) => {
            Ok(())
        }
        _ => Err(Error::Validation(ValidationError::InvalidInput(format!(
            "Goal cannot move from {} to {}",
            from, to
        )))),
    }
}

/// Plans the creation of `requests` on top of the user's active goals.
///
/// All unlocked goals (existing and new) are re-weighted with the tiered
/// scheme, get `month_req = monthly_deposit × weight` and a projected target
/// date. New locked goals get the payment that reaches their fixed date;
/// every locked goal's weight is its share of the deposit.
pub fn plan_goal_creation(
    user_id: &str,
    existing_active: Vec<SavingGoal>,
    requests: &[NewSavingGoal],
    monthly_deposit: Decimal,
    config: &GoalEngineConfig,
    today: NaiveDate,
    now: NaiveDateTime,
) -> Result<CreationPlan> {
    if user_id.trim().is_empty() {
        return Err(Error::Validation(ValidationError::MissingField(
            "user_id".to_string(),
        )));
    }
    if requests.is_empty() {
        return Err(Error::Validation(ValidationError::InvalidInput(
            "At least one goal is required".to_string(),
        )));
    }
    if monthly_deposit <= Decimal::ZERO {
        return Err(Error::Validation(ValidationError::InvalidInput(format!(
            "Monthly deposit must be positive, got {}",
            monthly_deposit
        ))));
    }
    for request in requests {
        request.validate()?;
    }

    let requested = existing_active.len() + requests.len();
    if requested > config.max_active_goals {
        return Err(GoalError::CapacityExceeded {
            max: config.max_active_goals,
            requested,
        }
        .into());
    }

    let params = config.projection_params();
    let mut goals = Vec::with_capacity(requested);
    for request in requests {
        goals.push(build_new_goal(user_id, request, &params, today, now)?);
    }
    let new_ids: HashSet<String> = goals.iter().map(|g| g.id.clone()).collect();
    goals.extend(existing_active);

    let locked_required: Decimal = goals.iter().filter(|g| g.eta_lock).map(|g| g.month_req).sum();
    let unlocked: Vec<usize> = (0..goals.len()).filter(|i| !goals[*i].eta_lock).collect();
    let priorities: Vec<Priority> = unlocked.iter().map(|i| goals[*i].priority).collect();

    let allocation = allocate_tier_weights(&priorities, locked_required, monthly_deposit)?;

    for (i, weight) in unlocked.iter().zip(allocation.weights.iter()) {
        let goal = &mut goals[*i];
        goal.weight = *weight;
        goal.month_req = (monthly_deposit * *weight).round_dp(MONEY_DECIMAL_PRECISION);
        refresh_projection(goal, &params, today);
        goal.updated_at = now;
    }

    if unlocked.is_empty() {
        // Locked goals alone: normalize among themselves so the set still sums to 1.
        reweight_by_month_req(&mut goals);
    } else {
        for goal in goals.iter_mut().filter(|g| g.eta_lock) {
            goal.weight = (goal.month_req / monthly_deposit).round_dp(WEIGHT_DECIMAL_PRECISION);
            goal.updated_at = now;
        }
    }

    let mut created = Vec::with_capacity(new_ids.len());
    for goal in goals.iter_mut().filter(|g| new_ids.contains(&g.id)) {
        goal.initial_target_date = goal.target_date;
        created.push(CreatedGoal {
            goal_id: goal.id.clone(),
            goal_name: goal.goal_name.clone(),
            month_req: goal.month_req,
            weight: goal.weight,
            target_date: goal.target_date,
            eta_months: params.months_to_target(
                goal.target_amount,
                goal.current_amount,
                goal.month_req,
            ),
        });
    }

    debug!(
        "Planned {} new goal(s) for user {}: locked fraction {}, {} goal(s) re-weighted",
        created.len(),
        user_id,
        allocation.locked_fraction,
        goals.len()
    );

    Ok(CreationPlan { goals, created })
}

fn build_new_goal(
    user_id: &str,
    request: &NewSavingGoal,
    params: &ProjectionParams,
    today: NaiveDate,
    now: NaiveDateTime,
) -> Result<SavingGoal> {
    let mut goal = SavingGoal {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        goal_name: request.goal_name.trim().to_string(),
        goal_type: request.goal_type.clone(),
        priority: Priority::from_level(request.priority_level)?,
        target_amount: request.target_amount,
        current_amount: Decimal::ZERO,
        target_date: request.target_date,
        initial_target_date: request.target_date,
        eta_lock: request.eta_lock,
        weight: Decimal::ZERO,
        month_req: Decimal::ZERO,
        status: GoalStatus::Active,
        sent_money: false,
        created_at: now,
        updated_at: now,
    };

    if goal.eta_lock {
        let target_date = goal.target_date.ok_or_else(|| {
            Error::Validation(ValidationError::MissingField("target_date".to_string()))
        })?;
        let months_left = months_between(today, target_date);
        if months_left < 1 {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Locked goal '{}' needs a target date at least one month ahead",
                goal.goal_name
            ))));
        }
        goal.month_req =
            params.required_monthly_payment(goal.target_amount, goal.current_amount, months_left);
    }

    Ok(goal)
}

/// Plans taking `goal_id` out of the active set (pause or delete).
///
/// The remaining goals are renormalized in proportion to their existing
/// `month_req`, with an equal split when those are all zero.
pub fn plan_goal_removal(
    active_goals: Vec<SavingGoal>,
    goal_id: &str,
    next_status: GoalStatus,
    now: NaiveDateTime,
) -> Result<RemovalPlan> {
    let position = active_goals
        .iter()
        .position(|g| g.id == goal_id && g.is_active())
        .ok_or_else(|| GoalError::NotFound(goal_id.to_string()))?;

    let mut remaining = active_goals;
    let mut removed = remaining.remove(position);
    ensure_transition(removed.status, next_status)?;
    removed.status = next_status;
    removed.updated_at = now;

    if reweight_by_month_req(&mut remaining) {
        warn!(
            "Remaining goals after removing {} have no monthly requirement; split equally",
            goal_id
        );
    }
    for goal in remaining.iter_mut() {
        goal.updated_at = now;
    }

    Ok(RemovalPlan { removed, remaining })
}

/// Current weight, requirement and months-to-target of each goal.
pub fn project_goals(goals: &[SavingGoal], params: &ProjectionParams) -> Vec<GoalProjection> {
    goals
        .iter()
        .map(|g| GoalProjection {
            goal_id: g.id.clone(),
            goal_name: g.goal_name.clone(),
            weight: g.weight,
            month_req: g.month_req,
            eta_months: params.months_to_target(g.target_amount, g.current_amount, g.month_req),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goals::weight_allocator::{is_weight_balanced, total_weight};
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn now() -> NaiveDateTime {
        today().and_hms_opt(12, 0, 0).unwrap()
    }

    fn request(name: &str, priority_level: i32, target: Decimal) -> NewSavingGoal {
        NewSavingGoal {
            goal_name: name.to_string(),
            goal_type: "GENERAL".to_string(),
            priority_level,
            target_amount: target,
            target_date: None,
            eta_lock: false,
        }
    }

    fn locked_request(name: &str, target: Decimal, date: NaiveDate) -> NewSavingGoal {
        NewSavingGoal {
            target_date: Some(date),
            eta_lock: true,
            ..request(name, 1, target)
        }
    }

    fn create(
        existing: Vec<SavingGoal>,
        requests: &[NewSavingGoal],
        deposit: Decimal,
    ) -> Result<CreationPlan> {
        plan_goal_creation(
            "user-1",
            existing,
            requests,
            deposit,
            &GoalEngineConfig::default(),
            today(),
            now(),
        )
    }

    #[test]
    fn test_create_three_tiers() {
        let plan = create(
            Vec::new(),
            &[
                request("Motorbike", 1, dec!(20000000)),
                request("Trip", 2, dec!(10000000)),
                request("Laptop", 3, dec!(15000000)),
            ],
            dec!(3000000),
        )
        .unwrap();

        let weights: Vec<Decimal> = plan.created.iter().map(|c| c.weight).collect();
        assert_eq!(weights, vec![dec!(0.66667), dec!(0.2), dec!(0.13333)]);
        assert_eq!(plan.created[0].month_req, dec!(2000010.00));
        assert_eq!(plan.created[1].month_req, dec!(600000));
        assert!(is_weight_balanced(&plan.goals));

        for goal in &plan.goals {
            assert_eq!(goal.status, GoalStatus::Active);
            assert_eq!(goal.current_amount, Decimal::ZERO);
            assert!(!goal.sent_money);
            assert!(goal.target_date.is_some());
            assert_eq!(goal.initial_target_date, goal.target_date);
        }
        assert!(plan.created.iter().all(|c| c.eta_months.is_some()));
    }

    #[test]
    fn test_create_reweights_existing_unlocked_goals() {
        let first = create(Vec::new(), &[request("Trip", 2, dec!(1000))], dec!(100)).unwrap();
        assert_eq!(first.created[0].weight, dec!(1));

        let second = create(first.goals, &[request("House", 1, dec!(50000))], dec!(100)).unwrap();
        assert_eq!(second.goals.len(), 2);
        let trip = second.goals.iter().find(|g| g.goal_name == "Trip").unwrap();
        let house = second.goals.iter().find(|g| g.goal_name == "House").unwrap();
        // 15 / 65 and 50 / 65.
        assert_eq!(trip.weight, dec!(0.23077));
        assert_eq!(house.weight, dec!(0.76923));
        assert_eq!(trip.month_req, dec!(23.08));
        assert!(is_weight_balanced(&second.goals));
    }

    #[test]
    fn test_create_locked_goal_takes_its_share_first() {
        let plan = create(
            Vec::new(),
            &[
                locked_request(
                    "Tuition",
                    dec!(12000),
                    NaiveDate::from_ymd_opt(2027, 10, 1).unwrap(),
                ),
                request("Trip", 2, dec!(5000)),
            ],
            dec!(2000),
        )
        .unwrap();

        let tuition = plan.goals.iter().find(|g| g.eta_lock).unwrap();
        let trip = plan.goals.iter().find(|g| !g.eta_lock).unwrap();

        // Twelve months with growth needs slightly under 1000 a month.
        assert!(tuition.month_req < dec!(1000));
        assert!(tuition.month_req > dec!(985));
        assert_eq!(tuition.target_date, NaiveDate::from_ymd_opt(2027, 10, 1));
        assert_eq!(
            tuition.weight,
            (tuition.month_req / dec!(2000)).round_dp(5)
        );
        assert!((trip.weight - (Decimal::ONE - tuition.weight)).abs() <= dec!(0.0001));
        assert!((total_weight(&plan.goals) - Decimal::ONE).abs() <= dec!(0.0001));
    }

    #[test]
    fn test_create_only_locked_goals_normalizes_among_them() {
        let plan = create(
            Vec::new(),
            &[locked_request(
                "Tuition",
                dec!(1200),
                NaiveDate::from_ymd_opt(2027, 10, 1).unwrap(),
            )],
            dec!(5000),
        )
        .unwrap();
        assert_eq!(plan.goals[0].weight, dec!(1));
    }

    #[test]
    fn test_create_rejects_locked_requirement_above_deposit() {
        let err = create(
            Vec::new(),
            &[locked_request(
                "Car",
                dec!(100000),
                NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
            )],
            dec!(1000),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Goal(GoalError::InsufficientDeposit { .. })));
    }

    #[test]
    fn test_create_rejects_locked_date_in_current_month() {
        let err = create(
            Vec::new(),
            &[locked_request("Gift", dec!(100), today())],
            dec!(1000),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_create_enforces_capacity() {
        let requests: Vec<NewSavingGoal> = (0..6)
            .map(|i| request(&format!("Goal {}", i), 3, dec!(1000)))
            .collect();
        let err = create(Vec::new(), &requests, dec!(1000)).unwrap_err();
        assert!(matches!(
            err,
            Error::Goal(GoalError::CapacityExceeded { max: 5, requested: 6 })
        ));

        let five = create(Vec::new(), &requests[..5], dec!(1000)).unwrap();
        let err = create(five.goals, &requests[..1], dec!(1000)).unwrap_err();
        assert!(matches!(err, Error::Goal(GoalError::CapacityExceeded { .. })));
    }

    #[test]
    fn test_create_validates_input() {
        assert!(create(Vec::new(), &[], dec!(1000)).is_err());
        assert!(create(Vec::new(), &[request("Trip", 2, dec!(10))], Decimal::ZERO).is_err());
        assert!(create(Vec::new(), &[request("Trip", 4, dec!(10))], dec!(10)).is_err());
        assert!(plan_goal_creation(
            " ",
            Vec::new(),
            &[request("Trip", 2, dec!(10))],
            dec!(10),
            &GoalEngineConfig::default(),
            today(),
            now(),
        )
        .is_err());
    }

    #[test]
    fn test_removal_renormalizes_by_month_req() {
        let plan = create(
            Vec::new(),
            &[
                request("A", 1, dec!(10000)),
                request("B", 2, dec!(10000)),
                request("C", 3, dec!(10000)),
            ],
            dec!(1500),
        )
        .unwrap();
        let a_id = plan.goals.iter().find(|g| g.goal_name == "A").unwrap().id.clone();

        let removal = plan_goal_removal(plan.goals, &a_id, GoalStatus::Paused, now()).unwrap();
        assert_eq!(removal.removed.status, GoalStatus::Paused);
        assert_eq!(removal.remaining.len(), 2);
        // month_req 300 and 200 (0.2 and 0.13333 of 1500).
        let b = removal.remaining.iter().find(|g| g.goal_name == "B").unwrap();
        let c = removal.remaining.iter().find(|g| g.goal_name == "C").unwrap();
        assert_eq!(b.weight, dec!(0.6));
        assert_eq!(c.weight, dec!(0.4));
        assert!(is_weight_balanced(&removal.remaining));
    }

    #[test]
    fn test_removal_of_unknown_goal_is_not_found() {
        let plan = create(Vec::new(), &[request("A", 1, dec!(100))], dec!(10)).unwrap();
        let err = plan_goal_removal(plan.goals, "missing", GoalStatus::Deleted, now()).unwrap_err();
        assert!(matches!(err, Error::Goal(GoalError::NotFound(_))));
    }

    #[test]
    fn test_removal_of_last_goal_leaves_empty_set() {
        let plan = create(Vec::new(), &[request("A", 1, dec!(100))], dec!(10)).unwrap();
        let id = plan.goals[0].id.clone();
        let removal = plan_goal_removal(plan.goals, &id, GoalStatus::Deleted, now()).unwrap();
        assert!(removal.remaining.is_empty());
        assert_eq!(removal.removed.status, GoalStatus::Deleted);
    }

    #[test]
    fn test_transitions() {
        assert!(ensure_transition(GoalStatus::Active, GoalStatus::Paused).is_ok());
        assert!(ensure_transition(GoalStatus::Active, GoalStatus::Deleted).is_ok());
        assert!(ensure_transition(GoalStatus::Paused, GoalStatus::Active).is_err());
        assert!(ensure_transition(GoalStatus::Deleted, GoalStatus::Active).is_err());
        assert!(ensure_transition(GoalStatus::Active, GoalStatus::Active).is_err());
    }

    #[test]
    fn test_project_goals_reports_eta() {
        let plan = create(Vec::new(), &[request("A", 1, dec!(1000))], dec!(100)).unwrap();
        let projections = project_goals(&plan.goals, &ProjectionParams::default());
        assert_eq!(projections.len(), 1);
        assert_eq!(projections[0].month_req, dec!(100));
        assert_eq!(projections[0].eta_months, Some(10));
    }
}
