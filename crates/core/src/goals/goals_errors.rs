//! Goal engine error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Business-rule failures of goal operations.
#[derive(Error, Debug)]
pub enum GoalError {
    #[error("Cannot have more than {max} active goals (requested {requested})")]
    CapacityExceeded { max: usize, requested: usize },

    #[error("Monthly deposit {deposit} cannot cover locked goal requirements of {locked_required}")]
    InsufficientDeposit {
        locked_required: Decimal,
        deposit: Decimal,
    },

    #[error("Goal not found or no longer active: {0}")]
    NotFound(String),
}
