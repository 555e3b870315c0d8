use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration for canzona.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (CANZONA_* prefix)
/// 3. Config file (~/.config/canzona/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Path to the library database.
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/library.db
    /// - ENV: CANZONA_DATABASE_PATH
    /// - Config: database_path = "/path/to/library.db"
    /// - Default: ~/.local/share/canzona/library.db
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,

    /// Run VACUUM after migrations that rebuild tables.
    ///
    /// Can be set via:
    /// - CLI: migrate --no-compact
    /// - Config: compact = false
    #[serde(default = "default_compact")]
    pub compact: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            compact: default_compact(),
        }
    }
}

impl Config {
    /// Load configuration from the default config file and environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from `config_path` (if it exists) and environment
    /// variables with the CANZONA_ prefix.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("canzona");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration, letting `--db` override the database path.
    pub fn load_with_db_path(db_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::load()?;
        if let Some(path) = db_path {
            config.database_path = path;
        }
        Ok(config)
    }
}

/// ~/.local/share/canzona/library.db (or platform equivalent)
fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("canzona")
        .join("library.db")
}

const fn default_compact() -> bool {
    true
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/canzona/config.toml
/// - macOS: ~/Library/Application Support/canzona/config.toml
/// - Windows: %APPDATA%\canzona\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("canzona")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Canzona Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (CANZONA_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Path to the library database
#
# Can also be set via:
# - CLI: canzona --db /custom/library.db migrate
# - Environment: CANZONA_DATABASE_PATH=/custom/library.db
#
# Default: Platform-specific data directory
#database_path = "/path/to/custom/library.db"

# Reclaim free pages with VACUUM after migrations that rebuild tables.
# Large libraries upgrade faster with this turned off.
compact = true
"#
}

/// Create the config file at `config_path` if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file_at(config_path: &Path) -> Result<bool> {
    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}

pub fn ensure_config_file() -> Result<bool> {
    ensure_config_file_at(&config_file_path())
}
