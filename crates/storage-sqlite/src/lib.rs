//! SQLite storage implementation for the goalfund engine.
//!
//! This crate provides all database-related functionality using Diesel ORM
//! with SQLite. It implements the goal ledger traits defined in
//! `goalfund-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - The single writer actor that serializes every ledger scope
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place where Diesel dependencies exist. The core
//! engine is database-agnostic and works with traits.
//!
//! ```text
//!        core (engine, services)
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;

// Repository implementations
pub mod goals;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, spawn_writer, DbConnection,
    DbPool, WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use goals::GoalRepository;

// Re-export from goalfund-core for convenience
pub use goalfund_core::errors::{DatabaseError, Error, Result};
