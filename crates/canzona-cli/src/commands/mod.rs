pub mod config;
pub mod migrate;
pub mod schema;
pub mod status;

pub use migrate::run_migrate;
pub use schema::show_schema;
pub use status::show_status;

use canzona_core::{Migrator, SqliteFile};

use crate::config::Config;

fn migrator(config: &Config) -> Migrator<SqliteFile> {
    log::debug!("Using database {}", config.database_path.display());
    Migrator::new(SqliteFile::new(&config.database_path))
}
