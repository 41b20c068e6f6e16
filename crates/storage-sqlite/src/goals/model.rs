//! Database models for saving goals.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::errors::StorageError;
use goalfund_core::goals::{GoalStatus, Priority, SavingGoal};

fn parse_decimal(value: &str, field_name: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(value).map_err(|e| {
        log::error!("Failed to parse {} '{}' as Decimal: {}", field_name, value, e);
        StorageError::Decode(format!("{} '{}': {}", field_name, value, e))
    })
}

/// Database row of a saving goal. Money and weights are stored as TEXT to
/// keep full decimal precision.
#[derive(Queryable, Selectable, Insertable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::saving_goals)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct SavingGoalDB {
    pub id: String,
    pub user_id: String,
    pub goal_name: String,
    pub goal_type: String,
    pub priority_level: i32,
    pub target_amount: String,
    pub current_amount: String,
    pub target_date: Option<NaiveDate>,
    pub initial_target_date: Option<NaiveDate>,
    pub eta_lock: bool,
    pub weight: String,
    pub month_req: String,
    pub status: String,
    pub sent_money: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<&SavingGoal> for SavingGoalDB {
    fn from(domain: &SavingGoal) -> Self {
        Self {
            id: domain.id.clone(),
            user_id: domain.user_id.clone(),
            goal_name: domain.goal_name.clone(),
            goal_type: domain.goal_type.clone(),
            priority_level: domain.priority.level(),
            target_amount: domain.target_amount.to_string(),
            current_amount: domain.current_amount.to_string(),
            target_date: domain.target_date,
            initial_target_date: domain.initial_target_date,
            eta_lock: domain.eta_lock,
            weight: domain.weight.to_string(),
            month_req: domain.month_req.to_string(),
            status: domain.status.as_str().to_string(),
            sent_money: domain.sent_money,
            created_at: domain.created_at,
            updated_at: domain.updated_at,
        }
    }
}

impl TryFrom<SavingGoalDB> for SavingGoal {
    type Error = StorageError;

    fn try_from(db: SavingGoalDB) -> Result<Self, Self::Error> {
        let priority = Priority::from_level(db.priority_level)
            .map_err(|e| StorageError::Decode(format!("goal {}: {}", db.id, e)))?;
        let status = GoalStatus::from_str(&db.status)
            .map_err(|e| StorageError::Decode(format!("goal {}: {}", db.id, e)))?;

        Ok(SavingGoal {
            target_amount: parse_decimal(&db.target_amount, "target_amount")?,
            current_amount: parse_decimal(&db.current_amount, "current_amount")?,
            weight: parse_decimal(&db.weight, "weight")?,
            month_req: parse_decimal(&db.month_req, "month_req")?,
            id: db.id,
            user_id: db.user_id,
            goal_name: db.goal_name,
            goal_type: db.goal_type,
            priority,
            target_date: db.target_date,
            initial_target_date: db.initial_target_date,
            eta_lock: db.eta_lock,
            status,
            sent_money: db.sent_money,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}
