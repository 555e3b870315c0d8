use anyhow::{Context, Result};
use canzona_core::schema::SchemaSnapshot;
use canzona_core::ConnectionProvider;

use crate::config::Config;

/// Capture the structure of the configured database.
pub fn snapshot(config: &Config) -> Result<SchemaSnapshot> {
    let migrator = super::migrator(config);
    let provider = migrator.provider();
    if !provider.database_exists() {
        anyhow::bail!("Database does not exist: {}", provider.location());
    }

    let conn = provider.acquire()?;
    SchemaSnapshot::capture(&conn).context("Failed to read database schema")
}

pub fn show_schema(config: &Config, pretty: bool) -> Result<()> {
    let snapshot = snapshot(config)?;
    let json = if pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{}", json);
    Ok(())
}
