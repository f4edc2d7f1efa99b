//! Storage housekeeping for an offline encyclopedia reader.
//!
//! The reader keeps a SQLite cache of feed content groups and cached article
//! metadata. This crate implements the maintenance pass that reclaims
//! storage: content groups older than the retention window are dropped, and
//! articles with no user state that no surviving group or preserved
//! navigation state references are deleted.

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod services;

pub use config::Config;
pub use db::Repository;
pub use error::{AppError, Result};
pub use events::{EventBus, StoreEvent};
pub use models::CleanupLevel;
pub use services::{Housekeeper, NavigationStateController};
