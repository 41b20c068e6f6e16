use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;

use goalfund_core::errors::{DatabaseError, Error};
use goalfund_core::goals::{GoalLedger, GoalRepositoryTrait, GoalStatus, SavingGoal};
use goalfund_core::Result;

use super::model::SavingGoalDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::saving_goals;

fn query_goals(
    conn: &mut SqliteConnection,
    owner: &str,
    status_filter: Option<GoalStatus>,
) -> Result<Vec<SavingGoal>> {
    let mut query = saving_goals::table
        .filter(saving_goals::user_id.eq(owner))
        .select(SavingGoalDB::as_select())
        .into_boxed();
    if let Some(status) = status_filter {
        query = query.filter(saving_goals::status.eq(status.as_str()));
    }

    let rows = query
        .order((saving_goals::created_at.asc(), saving_goals::id.asc()))
        .load::<SavingGoalDB>(conn)
        .into_core()?;

    rows.into_iter()
        .map(|row| SavingGoal::try_from(row).map_err(Error::from))
        .collect()
}

/// Ledger view over the writer connection, bound to one user.
struct SqliteGoalLedger<'a> {
    conn: &'a mut SqliteConnection,
    user_id: String,
}

impl GoalLedger for SqliteGoalLedger<'_> {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn list_goals(&mut self, status: Option<GoalStatus>) -> Result<Vec<SavingGoal>> {
        query_goals(self.conn, &self.user_id, status)
    }

    fn get_goal(&mut self, goal_id: &str) -> Result<Option<SavingGoal>> {
        let row = saving_goals::table
            .filter(saving_goals::id.eq(goal_id))
            .filter(saving_goals::user_id.eq(&self.user_id))
            .select(SavingGoalDB::as_select())
            .first::<SavingGoalDB>(self.conn)
            .optional()
            .into_core()?;
        row.map(|r| SavingGoal::try_from(r).map_err(Error::from))
            .transpose()
    }

    fn upsert_goal(&mut self, goal: &SavingGoal) -> Result<()> {
        if goal.user_id != self.user_id {
            return Err(Error::Database(DatabaseError::Internal(format!(
                "Goal {} belongs to user {}, not {}",
                goal.id, goal.user_id, self.user_id
            ))));
        }
        if goal.status == GoalStatus::Deleted {
            return Err(Error::Database(DatabaseError::Internal(format!(
                "Deleted goal {} cannot be stored",
                goal.id
            ))));
        }

        let row = SavingGoalDB::from(goal);
        diesel::insert_into(saving_goals::table)
            .values(&row)
            .on_conflict(saving_goals::id)
            .do_update()
            .set(&row)
            .execute(self.conn)
            .into_core()?;
        Ok(())
    }

    fn remove_goal(&mut self, goal_id: &str) -> Result<usize> {
        diesel::delete(
            saving_goals::table
                .filter(saving_goals::id.eq(goal_id))
                .filter(saving_goals::user_id.eq(&self.user_id)),
        )
        .execute(self.conn)
        .into_core()
    }
}

pub struct GoalRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl GoalRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        GoalRepository { pool, writer }
    }
}

#[async_trait]
impl GoalRepositoryTrait for GoalRepository {
    /// Jobs run on the single writer connection inside an immediate
    /// transaction, so scopes never interleave and a failed job rolls back.
    async fn run_in_user_scope<F, T>(&self, user_id: &str, job: F) -> Result<T>
    where
        F: FnOnce(&mut dyn GoalLedger) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let scoped_user = user_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<T> {
                let mut ledger = SqliteGoalLedger {
                    conn,
                    user_id: scoped_user,
                };
                job(&mut ledger)
            })
            .await
    }

    fn load_goals(&self, user_id: &str, status: Option<GoalStatus>) -> Result<Vec<SavingGoal>> {
        let mut conn = get_connection(&self.pool)?;
        query_goals(&mut conn, user_id, status)
    }
}
