//! Configuration management CLI commands.
//!
//! `config get`, `config set`, `config reset`, `config list` and
//! `config path` read and edit `~/.peakvista/config.ini`. A file that fails
//! to parse is reported, never overwritten.

use std::path::Path;

use clap::Subcommand;
use peakvista::config::{config_file_path, ConfigError, ConfigFile, ConfigKey};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., fetch.max_attempts)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., fetch.max_attempts)
        key: String,

        /// Value to set (empty clears optional settings)
        value: String,
    },

    /// Restore a setting to its default value
    Reset {
        /// Configuration key in format section.key
        key: String,
    },

    /// List all configuration settings; `*` marks changed values
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand against the user's configuration file.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    let output = run_at(&config_file_path(), command)?;
    println!("{}", output);
    Ok(())
}

fn run_at(path: &Path, command: ConfigCommands) -> Result<String, CliError> {
    match command {
        ConfigCommands::Get { key } => {
            let key = parse_key(&key)?;
            let value = key.get(&ConfigFile::load_from(path)?);
            Ok(display_value(&value).to_string())
        }
        ConfigCommands::Set { key, value } => {
            let key = parse_key(&key)?;
            let mut config = ConfigFile::load_from(path)?;
            key.set(&mut config, &value)?;
            config.save_to(path)?;
            Ok(format!("Set {} = {}", key.name(), display_value(&key.get(&config))))
        }
        ConfigCommands::Reset { key } => {
            let key = parse_key(&key)?;
            let mut config = ConfigFile::load_from(path)?;
            let default = key.get(&ConfigFile::default());
            key.set(&mut config, &default)?;
            config.save_to(path)?;
            Ok(format!("Reset {} = {}", key.name(), display_value(&default)))
        }
        ConfigCommands::List => Ok(list(&ConfigFile::load_from(path)?)),
        ConfigCommands::Path => Ok(path.display().to_string()),
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|e: ConfigError| {
        CliError::Config(format!(
            "{}. Use 'peakvista config list' to see available keys.",
            e
        ))
    })
}

fn display_value(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}

fn list(config: &ConfigFile) -> String {
    let defaults = ConfigFile::default();
    let mut lines = Vec::new();
    let mut current_section = "";

    for key in ConfigKey::all() {
        if key.section() != current_section {
            if !current_section.is_empty() {
                lines.push(String::new());
            }
            current_section = key.section();
            lines.push(format!("[{}]", current_section));
        }

        let value = key.get(config);
        let marker = if value != key.get(&defaults) { "*" } else { " " };
        lines.push(format!(
            "{} {} = {}",
            marker,
            key.key_name(),
            display_value(&value)
        ));
    }

    lines.join("\n")
}
