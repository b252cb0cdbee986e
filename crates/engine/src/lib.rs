//! Database engine for DialogDB
//!
//! This crate orchestrates the lower layers:
//! - Database: open/ephemeral construction, configuration, shared state
//! - QueryEngine: prefix-range pagination with delete-queue masking
//! - Table registry: create/list/drop tables and their rows
//! - Dialogs and messages, space membership, users, public entities
//!
//! The engine is the only component that knows which key ranges belong
//! together and which tenant lock guards which read-check-write sequence.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod database;
pub mod query;

mod dialogs;
mod entities;
mod spaces;
mod tables;
mod users;

pub use database::{Backend, Database, DatabaseConfig, FanoutConfig, CONFIG_FILE_NAME};
pub use query::{ListScope, Page, PageRequest, QueryEngine};
