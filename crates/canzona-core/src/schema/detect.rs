//! Reading and writing the persisted schema version.
//!
//! The version lives in the `Configuration` table under the
//! `DatabaseVersion` key. Databases at version 10 or older still carry the
//! table under its legacy name, `Configurations`, so detection tries both
//! names in order. Only a missing table moves on to the next name; any other
//! failure is reported as-is.

use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension};

use crate::error::{Error, Result};
use crate::version::SchemaVersion;

pub const CONFIGURATION_TABLE: &str = "Configuration";
pub const LEGACY_CONFIGURATION_TABLE: &str = "Configurations";
pub const VERSION_KEY: &str = "DatabaseVersion";

/// Which configuration table a version marker was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerSource {
    Current,
    Legacy,
}

const MARKER_TABLES: [(MarkerSource, &str); 2] = [
    (MarkerSource::Current, CONFIGURATION_TABLE),
    (MarkerSource::Legacy, LEGACY_CONFIGURATION_TABLE),
];

/// Outcome of looking for the version marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionMarker {
    Current(SchemaVersion),
    Legacy(SchemaVersion),
    NotFound,
}

impl VersionMarker {
    fn found(source: MarkerSource, version: SchemaVersion) -> Self {
        match source {
            MarkerSource::Current => Self::Current(version),
            MarkerSource::Legacy => Self::Legacy(version),
        }
    }

    pub const fn version(self) -> Option<SchemaVersion> {
        match self {
            Self::Current(v) | Self::Legacy(v) => Some(v),
            Self::NotFound => None,
        }
    }
}

/// Whether a table called `name` exists.
pub fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE)",
        [name],
        |row| row.get(0),
    )
}

fn parse_marker(table: &str, value: Value) -> Result<SchemaVersion> {
    let invalid = |shown: String| Error::VersionDetection {
        reason: format!("invalid {VERSION_KEY} value {shown} in {table}"),
    };
    match value {
        Value::Integer(n) => u32::try_from(n)
            .map(SchemaVersion::new)
            .map_err(|_| invalid(n.to_string())),
        Value::Text(text) => text.parse().map_err(|_| invalid(format!("'{text}'"))),
        other => Err(invalid(format!("{other:?}"))),
    }
}

/// Look for the version marker in the current table, then the legacy one.
pub fn read_marker(conn: &Connection) -> Result<VersionMarker> {
    for (source, table) in MARKER_TABLES {
        if !table_exists(conn, table)? {
            log::debug!("Configuration table {} not present", table);
            continue;
        }

        let value: Option<Value> = conn
            .query_row(
                &format!("SELECT Value FROM {table} WHERE Key = ?1"),
                [VERSION_KEY],
                |row| row.get(0),
            )
            .optional()?;

        let Some(value) = value else {
            return Err(Error::VersionDetection {
                reason: format!("{table} has no {VERSION_KEY} entry"),
            });
        };

        return Ok(VersionMarker::found(source, parse_marker(table, value)?));
    }

    Ok(VersionMarker::NotFound)
}

/// The installed schema version.
pub fn detect_version(conn: &Connection) -> Result<SchemaVersion> {
    read_marker(conn)?
        .version()
        .ok_or_else(|| Error::VersionDetection {
            reason: format!(
                "neither {CONFIGURATION_TABLE} nor {LEGACY_CONFIGURATION_TABLE} exists"
            ),
        })
}

/// Persist `version` in the current configuration table.
pub fn write_marker(conn: &Connection, version: SchemaVersion) -> rusqlite::Result<()> {
    let updated = conn.execute(
        &format!("UPDATE {CONFIGURATION_TABLE} SET Value = ?1 WHERE Key = ?2"),
        rusqlite::params![version.to_string(), VERSION_KEY],
    )?;
    if updated == 0 {
        conn.execute(
            &format!(
                "INSERT INTO {CONFIGURATION_TABLE} (ConfigurationID, Key, Value) VALUES (NULL, ?1, ?2)"
            ),
            rusqlite::params![VERSION_KEY, version.to_string()],
        )?;
    }
    Ok(())
}
