//! Goal ledger, repository and service traits.
//!
//! These traits describe goal persistence without any database-specific
//! types. A storage backend provides a [`GoalLedger`] view scoped to one
//! user and runs jobs against it atomically.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::goals_model::{
    CreatedGoal, DepositAllocation, GoalCreationRequest, GoalProjection, GoalStatus,
    NewSavingGoal, SavingGoal,
};
use crate::errors::Result;

/// Read/write view of one user's goals inside an atomic scope.
///
/// Every call sees the writes made earlier in the same scope. Nothing is
/// visible to other scopes until the job that owns the ledger returns `Ok`.
pub trait GoalLedger {
    /// The user this ledger is scoped to.
    fn user_id(&self) -> &str;

    /// Lists the user's goals, optionally filtered by status.
    fn list_goals(&mut self, status: Option<GoalStatus>) -> Result<Vec<SavingGoal>>;

    /// The user's active goals in creation order.
    fn list_active_goals(&mut self) -> Result<Vec<SavingGoal>> {
        self.list_goals(Some(GoalStatus::Active))
    }

    fn get_goal(&mut self, goal_id: &str) -> Result<Option<SavingGoal>>;

    /// Inserts or replaces a goal. Goals of another user are rejected.
    fn upsert_goal(&mut self, goal: &SavingGoal) -> Result<()>;

    /// Removes a goal row. Returns the number of removed rows.
    fn remove_goal(&mut self, goal_id: &str) -> Result<usize>;
}

/// Trait defining the contract for goal persistence.
///
/// Implementations guarantee that two scopes for the same user never
/// interleave, and that a job returning `Err` leaves no trace.
#[async_trait]
pub trait GoalRepositoryTrait: Send + Sync {
    /// Runs `job` against the user's ledger as one atomic unit.
    async fn run_in_user_scope<F, T>(&self, user_id: &str, job: F) -> Result<T>
    where
        F: FnOnce(&mut dyn GoalLedger) -> Result<T> + Send + 'static,
        T: Send + 'static;

    /// Reads committed goals outside any scope.
    fn load_goals(&self, user_id: &str, status: Option<GoalStatus>) -> Result<Vec<SavingGoal>>;
}

/// Trait defining the contract for goal engine operations.
#[async_trait]
pub trait GoalServiceTrait: Send + Sync {
    /// Creates one goal funded from `monthly_deposit`.
    async fn create_goal(
        &self,
        user_id: &str,
        new_goal: NewSavingGoal,
        monthly_deposit: Decimal,
    ) -> Result<CreatedGoal>;

    /// Creates several goals in one atomic step.
    async fn create_goals(&self, request: GoalCreationRequest) -> Result<Vec<CreatedGoal>>;

    /// Splits a deposit over the user's active, not yet funded goals.
    async fn allocate_deposit(&self, user_id: &str, deposit_amount: Decimal)
        -> Result<DepositAllocation>;

    /// Pauses an active goal and renormalizes the rest.
    async fn pause_goal(&self, user_id: &str, goal_id: &str) -> Result<Vec<GoalProjection>>;

    /// Deletes an active goal and renormalizes the rest.
    async fn delete_goal(&self, user_id: &str, goal_id: &str) -> Result<Vec<GoalProjection>>;

    /// Opens a new funding period by clearing `sent_money` on every active goal.
    /// Returns the number of goals reset.
    async fn start_funding_period(&self, user_id: &str) -> Result<usize>;

    fn get_goals(&self, user_id: &str, status: Option<GoalStatus>) -> Result<Vec<SavingGoal>>;

    fn get_goal(&self, user_id: &str, goal_id: &str) -> Result<SavingGoal>;

    /// Current projections of the user's active goals.
    fn get_projections(&self, user_id: &str) -> Result<Vec<GoalProjection>>;
}
