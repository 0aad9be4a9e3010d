//! # chat-db
//!
//! Storage layer implementing the [`MessageStore`](chat_core::MessageStore) port.
//!
//! ## Overview
//!
//! - Connection pool management
//! - Database models with SQLx `FromRow` derives
//! - Model → entity mappers
//! - `PgMessageStore`, the PostgreSQL-backed store
//! - `MemoryMessageStore`, an in-process store for development and tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chat_db::{create_pool, DatabaseConfig, PgMessageStore};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::from_env()).await?;
//!     let store = PgMessageStore::new(pool);
//!     // Hand the store to the relay hub...
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, create_pool_from_env, DatabaseConfig, PgPool};
pub use repositories::{MemoryMessageStore, PgMessageStore};
