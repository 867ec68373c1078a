//! # FM Tracker Database Crate
//!
//! This crate is the data-access layer. It hides the SQL behind the
//! [`Store`] trait so the API and the batch jobs never see a query.
//!
//! ## Public API
//!
//! - `connect`: The async function to establish the database connection pool.
//! - `run_migrations`: Applies the embedded schema migrations.
//! - `Store`: The data-access interface.
//! - `DbRepository`: The PostgreSQL implementation of `Store`.
//! - `MemoryStore`: An in-process implementation with the same constraints,
//!   used for ephemeral servers and tests.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod memory;
pub mod repository;
mod rows;
pub mod store;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use memory::MemoryStore;
pub use repository::DbRepository;
pub use store::Store;
