//! Schema management for the canzona library database.
//!
//! This crate owns the SQLite schema of the music library: it creates a new
//! database directly at the current schema, detects the version of an
//! existing one (including databases written before the configuration table
//! was renamed), and upgrades it one registered step at a time.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod provider;
pub mod schema;
pub mod ticks;
pub mod version;

pub use error::{Error, Result};
pub use provider::{ConnectionProvider, SqliteFile};
pub use schema::{Migrator, MigrationOptions, Outcome, Status, Upgrade};
pub use version::{SchemaVersion, CURRENT_VERSION};
