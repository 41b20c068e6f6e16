//! SQLite storage for saving goals.

mod model;
mod repository;

pub use model::SavingGoalDB;
pub use repository::GoalRepository;
