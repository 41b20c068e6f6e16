//! Goalfund Core - Domain entities, services, and traits.
//!
//! This crate contains the savings-goal engine: annuity math, tiered weight
//! allocation, deposit allocation and the goal lifecycle. It is
//! database-agnostic and defines the ledger traits that are implemented
//! by the `storage-sqlite` crate (and by the in-memory ledger in `goals`).

pub mod config;
pub mod constants;
pub mod errors;
pub mod goals;
pub mod utils;

pub use config::GoalEngineConfig;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
