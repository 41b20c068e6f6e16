//! Goals domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};

/// Priority tier of a goal. Level 1 is the highest priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn from_level(level: i32) -> Result<Self> {
        match level {
            1 => Ok(Priority::High),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::Low),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Priority level must be 1, 2 or 3, got {}",
                other
            )))),
        }
    }

    pub fn level(self) -> i32 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

impl TryFrom<i32> for Priority {
    type Error = Error;

    fn try_from(level: i32) -> Result<Self> {
        Priority::from_level(level)
    }
}

impl From<Priority> for i32 {
    fn from(priority: Priority) -> Self {
        priority.level()
    }
}

/// Lifecycle status of a goal.
///
/// `Deleted` goals are removed from the ledger, so only `Active` and
/// `Paused` are ever persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    Active,
    Paused,
    Deleted,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "ACTIVE",
            GoalStatus::Paused => "PAUSED",
            GoalStatus::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ACTIVE" => Ok(GoalStatus::Active),
            "PAUSED" => Ok(GoalStatus::Paused),
            "DELETED" => Ok(GoalStatus::Deleted),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown goal status '{}'",
                other
            )))),
        }
    }
}

/// Domain model representing one savings goal of a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavingGoal {
    pub id: String,
    pub user_id: String,
    pub goal_name: String,
    pub goal_type: String,
    pub priority: Priority,
    pub target_amount: Decimal,
    /// May exceed `target_amount`; overshoot is legal.
    pub current_amount: Decimal,
    pub target_date: Option<NaiveDate>,
    /// Target date at creation time. Never updated afterwards.
    pub initial_target_date: Option<NaiveDate>,
    /// When set the target date is fixed and `month_req` floats.
    pub eta_lock: bool,
    pub weight: Decimal,
    pub month_req: Decimal,
    pub status: GoalStatus,
    /// Whether the current funding period's deposit was applied.
    pub sent_money: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl SavingGoal {
    pub fn is_active(&self) -> bool {
        self.status == GoalStatus::Active
    }

    /// Active and still waiting for this period's deposit.
    pub fn is_pending_funding(&self) -> bool {
        self.is_active() && !self.sent_money
    }
}

/// Input model for creating a new goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSavingGoal {
    pub goal_name: String,
    pub goal_type: String,
    pub priority_level: i32,
    pub target_amount: Decimal,
    /// Required when `eta_lock` is set; informational otherwise.
    pub target_date: Option<NaiveDate>,
    pub eta_lock: bool,
}

impl NewSavingGoal {
    /// Validates the new goal data.
    pub fn validate(&self) -> Result<()> {
        if self.goal_name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "goal_name".to_string(),
            )));
        }
        if self.target_amount <= Decimal::ZERO {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Target amount must be positive, got {}",
                self.target_amount
            ))));
        }
        Priority::from_level(self.priority_level)?;
        if self.eta_lock && self.target_date.is_none() {
            return Err(Error::Validation(ValidationError::MissingField(
                "target_date".to_string(),
            )));
        }
        Ok(())
    }
}

/// Batch creation request: several goals sharing one monthly deposit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalCreationRequest {
    pub user_id: String,
    /// The user's total periodic income deposit.
    pub monthly_deposit: Decimal,
    pub goals: Vec<NewSavingGoal>,
}

/// Result of creating one goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedGoal {
    pub goal_id: String,
    pub goal_name: String,
    pub month_req: Decimal,
    pub weight: Decimal,
    pub target_date: Option<NaiveDate>,
    /// `None` when the target is unreachable within the projection horizon.
    pub eta_months: Option<u32>,
}

/// Weight and projection of a goal after the goal set changed shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalProjection {
    pub goal_id: String,
    pub goal_name: String,
    pub weight: Decimal,
    pub month_req: Decimal,
    pub eta_months: Option<u32>,
}

/// Which branch of the deposit split was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationCase {
    /// Nothing pending this period.
    Idle,
    /// Every goal got its `month_req`, the remainder was split by weight.
    Surplus,
    /// The deposit was split by weight only.
    Deficit,
}

/// Amount credited to one goal by a deposit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AllocationLine {
    pub goal_id: String,
    pub amount: Decimal,
}

/// Outcome of allocating one deposit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DepositAllocation {
    pub case: AllocationCase,
    pub goals_funded: usize,
    pub total_allocated: Decimal,
    pub lines: Vec<AllocationLine>,
}

impl DepositAllocation {
    pub fn idle() -> Self {
        Self {
            case: AllocationCase::Idle,
            goals_funded: 0,
            total_allocated: Decimal::ZERO,
            lines: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn new_goal() -> NewSavingGoal {
        NewSavingGoal {
            goal_name: "Emergency fund".to_string(),
            goal_type: "SAFETY".to_string(),
            priority_level: 1,
            target_amount: dec!(15000000),
            target_date: None,
            eta_lock: false,
        }
    }

    #[test]
    fn test_priority_levels() {
        assert_eq!(Priority::from_level(1).unwrap(), Priority::High);
        assert_eq!(Priority::from_level(3).unwrap(), Priority::Low);
        assert!(Priority::from_level(0).is_err());
        assert!(Priority::from_level(4).is_err());
        assert_eq!(Priority::Medium.level(), 2);
    }

    #[test]
    fn test_priority_serializes_as_level() {
        let json = serde_json::to_string(&Priority::Medium).unwrap();
        assert_eq!(json, "2");
        let parsed: Priority = serde_json::from_str("3").unwrap();
        assert_eq!(parsed, Priority::Low);
        assert!(serde_json::from_str::<Priority>("7").is_err());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("ACTIVE".parse::<GoalStatus>().unwrap(), GoalStatus::Active);
        assert_eq!(GoalStatus::Paused.to_string(), "PAUSED");
        assert!("archived".parse::<GoalStatus>().is_err());
    }

    #[test]
    fn test_new_goal_validation() {
        assert!(new_goal().validate().is_ok());

        let mut blank = new_goal();
        blank.goal_name = "  ".to_string();
        assert!(blank.validate().is_err());

        let mut zero = new_goal();
        zero.target_amount = Decimal::ZERO;
        assert!(zero.validate().is_err());

        let mut bad_priority = new_goal();
        bad_priority.priority_level = 9;
        assert!(bad_priority.validate().is_err());
    }

    #[test]
    fn test_locked_goal_requires_target_date() {
        let mut locked = new_goal();
        locked.eta_lock = true;
        assert!(matches!(
            locked.validate(),
            Err(Error::Validation(ValidationError::MissingField(ref f))) if f == "target_date"
        ));

        locked.target_date = NaiveDate::from_ymd_opt(2028, 1, 1);
        assert!(locked.validate().is_ok());
    }
}
