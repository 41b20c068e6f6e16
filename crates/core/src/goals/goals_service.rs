use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use rust_decimal::Decimal;

use super::allocation_engine;
use super::goals_errors::GoalError;
use super::goals_model::{
    AllocationCase, CreatedGoal, DepositAllocation, GoalCreationRequest, GoalProjection,
    GoalStatus, NewSavingGoal, SavingGoal,
};
use super::goals_traits::{GoalRepositoryTrait, GoalServiceTrait};
use super::lifecycle::{plan_goal_creation, plan_goal_removal, project_goals};
use super::weight_allocator::{is_weight_balanced, total_weight};
use crate::config::GoalEngineConfig;
use crate::errors::{Error, Result, ValidationError};
use crate::utils::time_utils::local_now;

type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Goal engine entry point. Every mutating operation runs as one job in the
/// repository's per-user scope.
pub struct GoalService<T: GoalRepositoryTrait> {
    goal_repo: Arc<T>,
    config: GoalEngineConfig,
    clock: Clock,
}

impl<T: GoalRepositoryTrait> GoalService<T> {
    pub fn new(goal_repo: Arc<T>, config: GoalEngineConfig) -> Self {
        GoalService {
            goal_repo,
            config,
            clock: Arc::new(local_now),
        }
    }

    /// Replaces the wall clock used for projections and timestamps.
    pub fn with_clock<C>(mut self, clock: C) -> Self
    where
        C: Fn() -> NaiveDateTime + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &GoalEngineConfig {
        &self.config
    }

    async fn remove_from_active_set(
        &self,
        user_id: &str,
        goal_id: &str,
        next_status: GoalStatus,
    ) -> Result<Vec<GoalProjection>> {
        require_user(user_id)?;
        let params = self.config.projection_params();
        let now = (self.clock)();
        let goal_id_for_job = goal_id.to_string();

        let projections = self
            .goal_repo
            .run_in_user_scope(user_id, move |ledger| {
                let active = ledger.list_active_goals()?;
                let plan = plan_goal_removal(active, &goal_id_for_job, next_status, now)?;

                if next_status == GoalStatus::Deleted {
                    ledger.remove_goal(&plan.removed.id)?;
                } else {
                    ledger.upsert_goal(&plan.removed)?;
                }
                for goal in &plan.remaining {
                    ledger.upsert_goal(goal)?;
                }
                warn_if_unbalanced(ledger.user_id(), &plan.remaining);

                Ok(project_goals(&plan.remaining, &params))
            })
            .await?;

        info!(
            "Goal {} of user {} is now {}; {} active goal(s) re-weighted",
            goal_id,
            user_id,
            next_status,
            projections.len()
        );
        Ok(projections)
    }
}

fn require_user(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(Error::Validation(ValidationError::MissingField(
            "user_id".to_string(),
        )));
    }
    Ok(())
}

fn warn_if_unbalanced(user_id: &str, active_goals: &[SavingGoal]) {
    if !is_weight_balanced(active_goals) {
        warn!(
            "Active goal weights of user {} sum to {}",
            user_id,
            total_weight(active_goals)
        );
    }
}

#[async_trait]
impl<T: GoalRepositoryTrait + Send + Sync> GoalServiceTrait for GoalService<T> {
    async fn create_goal(
        &self,
        user_id: &str,
        new_goal: NewSavingGoal,
        monthly_deposit: Decimal,
    ) -> Result<CreatedGoal> {
        let request = GoalCreationRequest {
            user_id: user_id.to_string(),
            monthly_deposit,
            goals: vec![new_goal],
        };
        self.create_goals(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Unexpected("Goal creation produced no result".to_string()))
    }

    async fn create_goals(&self, request: GoalCreationRequest) -> Result<Vec<CreatedGoal>> {
        let GoalCreationRequest {
            user_id,
            monthly_deposit,
            goals,
        } = request;
        require_user(&user_id)?;
        debug!(
            "Creating {} goal(s) for user {} with monthly deposit {}",
            goals.len(),
            user_id,
            monthly_deposit
        );

        let config = self.config.clone();
        let now = (self.clock)();
        let created = self
            .goal_repo
            .run_in_user_scope(&user_id, move |ledger| {
                let existing = ledger.list_active_goals()?;
                let plan = plan_goal_creation(
                    ledger.user_id(),
                    existing,
                    &goals,
                    monthly_deposit,
                    &config,
                    now.date(),
                    now,
                )?;
                for goal in &plan.goals {
                    ledger.upsert_goal(goal)?;
                }
                warn_if_unbalanced(ledger.user_id(), &plan.goals);
                Ok(plan.created)
            })
            .await?;

        info!("Created {} goal(s) for user {}", created.len(), user_id);
        Ok(created)
    }

    async fn allocate_deposit(
        &self,
        user_id: &str,
        deposit_amount: Decimal,
    ) -> Result<DepositAllocation> {
        require_user(user_id)?;
        let params = self.config.projection_params();
        let now = (self.clock)();

        let allocation = self
            .goal_repo
            .run_in_user_scope(user_id, move |ledger| {
                let mut active = ledger.list_active_goals()?;
                let allocation = allocation_engine::allocate_deposit(
                    &mut active,
                    deposit_amount,
                    &params,
                    now.date(),
                    now,
                )?;
                if allocation.case != AllocationCase::Idle {
                    for goal in &active {
                        ledger.upsert_goal(goal)?;
                    }
                    warn_if_unbalanced(ledger.user_id(), &active);
                }
                Ok(allocation)
            })
            .await?;

        info!(
            "Deposit of {} for user {}: {:?}, {} goal(s) funded, {} allocated",
            deposit_amount,
            user_id,
            allocation.case,
            allocation.goals_funded,
            allocation.total_allocated
        );
        Ok(allocation)
    }

    async fn pause_goal(&self, user_id: &str, goal_id: &str) -> Result<Vec<GoalProjection>> {
        self.remove_from_active_set(user_id, goal_id, GoalStatus::Paused)
            .await
    }

    async fn delete_goal(&self, user_id: &str, goal_id: &str) -> Result<Vec<GoalProjection>> {
        self.remove_from_active_set(user_id, goal_id, GoalStatus::Deleted)
            .await
    }

    async fn start_funding_period(&self, user_id: &str) -> Result<usize> {
        require_user(user_id)?;
        let now = (self.clock)();

        let reset = self
            .goal_repo
            .run_in_user_scope(user_id, move |ledger| {
                let mut reset = 0usize;
                for mut goal in ledger.list_active_goals()? {
                    if goal.sent_money {
                        goal.sent_money = false;
                        goal.updated_at = now;
                        ledger.upsert_goal(&goal)?;
                        reset += 1;
                    }
                }
                Ok(reset)
            })
            .await?;

        info!("Started a funding period for user {}: {} goal(s) reset", user_id, reset);
        Ok(reset)
    }

    fn get_goals(&self, user_id: &str, status: Option<GoalStatus>) -> Result<Vec<SavingGoal>> {
        self.goal_repo.load_goals(user_id, status)
    }

    fn get_goal(&self, user_id: &str, goal_id: &str) -> Result<SavingGoal> {
        self.goal_repo
            .load_goals(user_id, None)?
            .into_iter()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| GoalError::NotFound(goal_id.to_string()).into())
    }

    fn get_projections(&self, user_id: &str) -> Result<Vec<GoalProjection>> {
        let active = self.goal_repo.load_goals(user_id, Some(GoalStatus::Active))?;
        Ok(project_goals(&active, &self.config.projection_params()))
    }
}
