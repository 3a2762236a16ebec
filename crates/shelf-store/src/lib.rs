//! shelf-store: Storage layer for the shelf library API
//!
//! This crate provides:
//! - A schema-less document database of named JSON collections
//! - Integer id assignment and whole-record replacement
//! - JSON-file persistence (`db.json`), rewritten after every mutation
//!
//! # Usage
//!
//! ```rust,ignore
//! use shelf_store::{Store, StoreConfig};
//!
//! let store = Store::open(StoreConfig::from_env()).await?;
//!
//! let author = store.insert("authors", record).await?;
//! let books = store.list("books").await?;
//! ```
//!
//! The rule layer never sees `Store` directly: it reads through
//! `Store::read()`, whose guard implements `shelf_core::CollectionSource`.

pub mod database;
pub mod error;
pub mod store;

pub use database::Database;
pub use error::{StoreError, StoreResult};
pub use store::{Store, StoreConfig};

// Re-export shelf-core for downstream crates
pub use shelf_core;
