use anyhow::{Context, Result};

use crate::config::Config;

pub fn show_status(config: &Config) -> Result<()> {
    let status = super::migrator(config)
        .status()
        .context("Failed to read database status")?;

    println!("\nCanzona Status\n");
    println!("  Database: {}", config.database_path.display());
    println!("  Schema version (this build): {}", status.current);

    let Some(installed) = status.installed else {
        println!("  Installed version: <no database>");
        println!("\n  Run `canzona migrate` to create it.");
        return Ok(());
    };

    println!("  Installed version: {}", installed);

    if installed > status.current {
        println!("\n  This database was written by a newer canzona and cannot be opened.");
    } else if status.pending.is_empty() {
        println!("\n  Up to date.");
    } else {
        println!("\n  Pending migrations:");
        for step in &status.pending {
            println!("    {:>2}  {}", step.version.get(), step.name);
        }
        println!("\n  Run `canzona migrate` to apply them.");
    }

    Ok(())
}
