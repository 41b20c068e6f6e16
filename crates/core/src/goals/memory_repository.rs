//! In-process goal ledger.
//!
//! Committed rows live in a concurrent map keyed by user. A scope takes the
//! user's async lock, works on a staged copy of that user's rows and swaps
//! the copy in only when the job succeeds. Different users never contend.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;
use tokio::sync::Mutex;

use super::goals_model::{GoalStatus, SavingGoal};
use super::goals_traits::{GoalLedger, GoalRepositoryTrait};
use crate::errors::{DatabaseError, Error, Result};

#[derive(Default)]
pub struct InMemoryGoalRepository {
    goals: DashMap<String, Vec<SavingGoal>>,
    user_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl InMemoryGoalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    fn committed_rows(&self, user_id: &str) -> Vec<SavingGoal> {
        self.goals
            .get(user_id)
            .map(|rows| rows.value().clone())
            .unwrap_or_default()
    }
}

/// Staged copy of one user's rows.
struct StagedLedger {
    user_id: String,
    rows: Vec<SavingGoal>,
}

impl GoalLedger for StagedLedger {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn list_goals(&mut self, status: Option<GoalStatus>) -> Result<Vec<SavingGoal>> {
        Ok(self
            .rows
            .iter()
            .filter(|g| status.map_or(true, |s| g.status == s))
            .cloned()
            .collect())
    }

    fn get_goal(&mut self, goal_id: &str) -> Result<Option<SavingGoal>> {
        Ok(self.rows.iter().find(|g| g.id == goal_id).cloned())
    }

    fn upsert_goal(&mut self, goal: &SavingGoal) -> Result<()> {
        if goal.user_id != self.user_id {
            return Err(Error::Database(DatabaseError::Internal(format!(
                "Goal {} belongs to user {}, not {}",
                goal.id, goal.user_id, self.user_id
            ))));
        }
        match self.rows.iter_mut().find(|g| g.id == goal.id) {
            Some(existing) => *existing = goal.clone(),
            None => self.rows.push(goal.clone()),
        }
        Ok(())
    }

    fn remove_goal(&mut self, goal_id: &str) -> Result<usize> {
        let before = self.rows.len();
        self.rows.retain(|g| g.id != goal_id);
        Ok(before - self.rows.len())
    }
}

#[async_trait]
impl GoalRepositoryTrait for InMemoryGoalRepository {
    async fn run_in_user_scope<F, T>(&self, user_id: &str, job: F) -> Result<T>
    where
        F: FnOnce(&mut dyn GoalLedger) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let mut ledger = StagedLedger {
            user_id: user_id.to_string(),
            rows: self.committed_rows(user_id),
        };
        match job(&mut ledger) {
            Ok(value) => {
                self.goals.insert(user_id.to_string(), ledger.rows);
                Ok(value)
            }
            Err(e) => {
                debug!("Discarding staged goal rows for user {}: {}", user_id, e);
                Err(e)
            }
        }
    }

    fn load_goals(&self, user_id: &str, status: Option<GoalStatus>) -> Result<Vec<SavingGoal>> {
        Ok(self
            .committed_rows(user_id)
            .into_iter()
            .filter(|g| status.map_or(true, |s| g.status == s))
            .collect())
    }
}
