//! Goals module - savings goal models, engine, services, and traits.

mod allocation_engine;
mod finance_math;
mod goals_errors;
mod goals_model;
mod goals_service;
mod goals_traits;
mod lifecycle;
mod memory_repository;
mod weight_allocator;


pub use allocation_engine::{allocate_deposit, apportion, refresh_projection};
pub use finance_math::{
    annuity_factor, growth_factor, monthly_rate_from_annual, months_to_target,
    months_to_target_within, required_monthly_payment, ProjectionParams,
};
pub use goals_errors::GoalError;
pub use goals_model::{
    AllocationCase, AllocationLine, CreatedGoal, DepositAllocation, GoalCreationRequest,
    GoalProjection, GoalStatus, NewSavingGoal, Priority, SavingGoal,
};
pub use goals_service::GoalService;
pub use goals_traits::{GoalLedger, GoalRepositoryTrait, GoalServiceTrait};
pub use lifecycle::{
    ensure_transition, plan_goal_creation, plan_goal_removal, project_goals, CreationPlan,
    RemovalPlan,
};
pub use memory_repository::InMemoryGoalRepository;
pub use weight_allocator::{
    allocate_tier_weights, base_share, is_weight_balanced, reweight_by_month_req,
    tier_base_pool, tier_capacity, total_weight, WeightAllocation,
};
