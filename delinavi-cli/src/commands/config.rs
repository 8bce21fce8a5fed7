//! Configuration management CLI commands.
//!
//! `config get`, `config set`, `config list` and `config path`.

use clap::Subcommand;
use delinavi::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., leg.pass_radius_m)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., stops.arrival_policy)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => run_get(&key),
        ConfigCommands::Set { key, value } => run_set(&key, &value),
        ConfigCommands::List => run_list(),
        ConfigCommands::Path => run_path(),
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'delinavi config list' to see available keys.",
            key
        ))
    })
}

fn run_get(key: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;
    let config = ConfigFile::load()?;
    let value = config_key.get(&config);

    if value.is_empty() {
        println!("(not set)");
    } else {
        println!("{}", value);
    }
    Ok(())
}

/// Set a value, refusing edits that leave the file inconsistent.
fn run_set(key: &str, value: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;

    let mut config = ConfigFile::load()?;
    config_key.set(&mut config, value)?;
    config.guidance.validate()?;
    config.save()?;

    println!("Set {} = {}", config_key.name(), config_key.get(&config));
    Ok(())
}

fn run_list() -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    println!("# {}", config_file_path().display());
    print!("{}", render_settings(&config));
    Ok(())
}

/// Settings in INI layout, marking values that differ from the defaults.
fn render_settings(config: &ConfigFile) -> String {
    let defaults = ConfigFile::default();
    let mut out = String::new();
    let mut section = None;

    for key in ConfigKey::all() {
        if section != Some(key.section()) {
            section = Some(key.section());
            out.push_str(&format!("\n[{}]\n", key.section()));
        }
        let value = key.get(config);
        let changed = value != key.get(&defaults);
        out.push_str(&format!(
            "{} = {}{}\n",
            key.key_name(),
            value,
            if changed { "    ; changed" } else { "" }
        ));
    }
    out
}

fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_marks_changed_values() {
        let mut config = ConfigFile::default();
        config.guidance.voice.lang = "en-US".to_string();

        let text = render_settings(&config);
        assert!(text.contains("[voice]\n"));
        assert!(text.contains("lang = en-US    ; changed\n"));
        assert!(!text.contains("enabled = true    ; changed"));
        assert!(text.contains("[logging]\n"));
    }

    #[test]
    fn test_render_one_header_per_section() {
        let text = render_settings(&ConfigFile::default());
        assert_eq!(text.matches("[leg]").count(), 1);
        assert!(!text.contains("; changed"));
    }

    #[test]
    fn test_unknown_key_suggests_list() {
        let err = parse_key("leg.nope").unwrap_err();
        assert!(err.to_string().contains("delinavi config list"));
    }
}
