use anyhow::{Context, Result};
use canzona_core::{MigrationOptions, Outcome};

use crate::config::Config;

/// Create or upgrade the configured database.
pub fn migrate(config: &Config, compact: bool) -> Result<Outcome> {
    let migrator = super::migrator(config).with_options(MigrationOptions { compact });
    migrator.run().with_context(|| {
        format!(
            "Failed to migrate database {}",
            config.database_path.display()
        )
    })
}

pub fn run_migrate(config: &Config, compact: bool) -> Result<()> {
    match migrate(config, compact)? {
        Outcome::Created => {
            println!("✓ Created {}", config.database_path.display());
        }
        Outcome::Upgraded(upgrade) => {
            println!(
                "✓ Upgraded {} from version {} to {} ({} steps)",
                config.database_path.display(),
                upgrade.from,
                upgrade.to,
                upgrade.applied
            );
        }
        Outcome::UpToDate(version) => {
            println!("Already at version {}", version);
        }
    }
    Ok(())
}
