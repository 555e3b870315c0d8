use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod commands;
mod config;

use config::Config;

#[derive(Debug, Parser)]
#[command(name = "canzona", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the database (default: ~/.local/share/canzona/library.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log every migration step
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Show the installed schema version and the steps an upgrade would run
    Status,
    /// Create or upgrade the database
    ///
    /// A missing database is created directly at the current schema. An
    /// existing one is upgraded one step at a time from its installed
    /// version. A database written by a newer canzona is left untouched and
    /// reported as an error.
    ///
    /// Each step commits on its own. If a step fails, the steps before it
    /// stay applied but the recorded version is not advanced; restore from a
    /// backup before retrying.
    Migrate {
        /// Skip VACUUM after steps that rebuild tables
        #[arg(long)]
        no_compact: bool,
    },
    /// Print the database's tables, columns and indexes as JSON
    Schema {
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Show the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Status => commands::show_status(&Config::load_with_db_path(cli.db)?)?,
        Commands::Migrate { no_compact } => {
            let config = Config::load_with_db_path(cli.db)?;
            commands::run_migrate(&config, config.compact && !no_compact)?;
        }
        Commands::Schema { pretty } => {
            commands::show_schema(&Config::load_with_db_path(cli.db)?, pretty)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config()?,
            ConfigAction::Path => commands::config::show_path()?,
            ConfigAction::Example => commands::config::show_example()?,
            ConfigAction::Init => commands::config::init_config()?,
        },
    }

    Ok(())
}
