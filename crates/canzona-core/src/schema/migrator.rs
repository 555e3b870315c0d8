use serde::Serialize;

use crate::error::{Error, Result};
use crate::provider::ConnectionProvider;
use crate::version::{SchemaVersion, CURRENT_VERSION};

use super::migrations::{Migration, Registry, REGISTRY};
use super::{bootstrap, detect};

/// Tunables for an upgrade run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationOptions {
    /// Run `VACUUM` after steps that restructure tables.
    pub compact: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self { compact: true }
    }
}

/// Result of a completed upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Upgrade {
    pub from: SchemaVersion,
    pub to: SchemaVersion,
    /// Number of registered steps that ran.
    pub applied: usize,
}

/// What [`Migrator::run`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Upgraded(Upgrade),
    UpToDate(SchemaVersion),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingStep {
    pub version: SchemaVersion,
    pub name: &'static str,
}

/// Read-only view of where a database stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub exists: bool,
    pub installed: Option<SchemaVersion>,
    pub current: SchemaVersion,
    pub pending: Vec<PendingStep>,
}

/// Brings a database to [`CURRENT_VERSION`].
///
/// Each step gets its own connection and transaction. Steps are not atomic
/// as a group: when step `k` fails, steps before it stay committed while the
/// version marker keeps its old value, so re-running will try those steps
/// again.
#[derive(Debug)]
pub struct Migrator<P> {
    provider: P,
    registry: Registry<'static>,
    options: MigrationOptions,
}

impl<P: ConnectionProvider> Migrator<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            registry: REGISTRY,
            options: MigrationOptions::default(),
        }
    }

    /// Use a different step registry.
    #[must_use]
    pub fn with_registry(mut self, registry: Registry<'static>) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: MigrationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The installed schema version.
    ///
    /// A missing database is reported as a detection failure without
    /// creating the file.
    pub fn detect_version(&self) -> Result<SchemaVersion> {
        if !self.provider.database_exists() {
            return Err(Error::VersionDetection {
                reason: format!("no database at {}", self.provider.location()),
            });
        }
        self.provider
            .with_connection(|conn| detect::detect_version(conn))
    }

    pub fn needs_upgrade(&self) -> Result<bool> {
        Ok(self.detect_version()? < CURRENT_VERSION)
    }

    /// Create the current schema in a database that does not exist yet.
    pub fn initialize_new_database(&self) -> Result<()> {
        self.provider
            .with_connection(|conn| bootstrap::create_schema(conn).map_err(Error::Bootstrap))?;
        log::info!("New database created at {}", self.provider.location());
        Ok(())
    }

    /// Detect the installed version and upgrade from it.
    pub fn upgrade(&self) -> Result<Upgrade> {
        let from = self.detect_version()?;
        self.upgrade_from(from)
    }

    /// Apply every registered step after `from` and record
    /// [`CURRENT_VERSION`] as the installed version.
    pub fn upgrade_from(&self, from: SchemaVersion) -> Result<Upgrade> {
        if from > CURRENT_VERSION {
            return Err(Error::UnsupportedVersion {
                found: from,
                supported: CURRENT_VERSION,
            });
        }

        let applied = self.apply_steps(from, CURRENT_VERSION)?;

        self.provider
            .with_connection(|conn| Ok(detect::write_marker(conn, CURRENT_VERSION)?))?;

        log::info!(
            "Migrated from database version {} to {}",
            from,
            CURRENT_VERSION
        );

        Ok(Upgrade {
            from,
            to: CURRENT_VERSION,
            applied,
        })
    }

    /// Run the registered steps for every version in `(from, to]`, in order.
    ///
    /// Versions without a registered step are skipped. The version marker is
    /// not touched. Returns how many steps ran.
    pub fn apply_steps(&self, from: SchemaVersion, to: SchemaVersion) -> Result<usize> {
        let mut applied = 0;
        for version in from.successors_through(to) {
            match self.registry.find(version) {
                Some(step) => {
                    self.run_step(step)?;
                    applied += 1;
                }
                None => log::debug!("No migration registered for version {}", version),
            }
        }
        Ok(applied)
    }

    fn run_step(&self, step: &Migration) -> Result<()> {
        log::debug!("Applying migration {} ({})", step.version, step.name);

        let failed = |source: rusqlite::Error| Error::StepExecution {
            version: step.version,
            name: step.name,
            source,
        };

        self.provider.with_connection(|conn| {
            let tx = conn.transaction().map_err(failed)?;
            (step.up)(&tx).map_err(failed)?;
            tx.commit().map_err(failed)?;

            if step.compact && self.options.compact {
                conn.execute_batch("VACUUM;").map_err(failed)?;
            }
            Ok(())
        })
    }

    /// Startup entry point: create, upgrade, or leave the database alone.
    pub fn run(&self) -> Result<Outcome> {
        if !self.provider.database_exists() {
            self.initialize_new_database()?;
            return Ok(Outcome::Created);
        }

        let installed = self.detect_version()?;
        if installed < CURRENT_VERSION {
            return self.upgrade_from(installed).map(Outcome::Upgraded);
        }
        if installed > CURRENT_VERSION {
            return Err(Error::UnsupportedVersion {
                found: installed,
                supported: CURRENT_VERSION,
            });
        }
        Ok(Outcome::UpToDate(installed))
    }

    pub fn status(&self) -> Result<Status> {
        if !self.provider.database_exists() {
            return Ok(Status {
                exists: false,
                installed: None,
                current: CURRENT_VERSION,
                pending: Vec::new(),
            });
        }

        let installed = self.detect_version()?;
        let pending = self
            .registry
            .pending(installed, CURRENT_VERSION)
            .map(|m| PendingStep {
                version: m.version,
                name: m.name,
            })
            .collect();

        Ok(Status {
            exists: true,
            installed: Some(installed),
            current: CURRENT_VERSION,
            pending,
        })
    }
}
