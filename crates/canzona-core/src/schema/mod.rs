//! SQLite schema: creation, version detection, and migration.

pub mod bootstrap;
pub mod detect;
pub mod inspect;
pub mod migrations;
pub mod migrator;
pub mod rebuild;

pub use detect::{MarkerSource, VersionMarker};
pub use inspect::SchemaSnapshot;
pub use migrations::{Migration, Registry, MIGRATIONS, REGISTRY};
pub use migrator::{MigrationOptions, Migrator, Outcome, PendingStep, Status, Upgrade};
