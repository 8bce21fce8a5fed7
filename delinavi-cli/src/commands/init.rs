//! Init command - write the configuration file.

use std::path::Path;

use delinavi::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Run the init command.
///
/// Existing values are kept; missing keys are written with their defaults.
/// A file that fails to load is left untouched and reported.
pub fn run() -> Result<(), CliError> {
    let path = config_file_path();
    let existed = init_at(&path)?;

    if existed {
        println!("Updated configuration file: {}", path.display());
    } else {
        println!("Created configuration file: {}", path.display());
    }
    println!();
    println!("Edit this file or use 'delinavi config set' to adjust guidance settings.");
    Ok(())
}

/// Fill in `path`. Returns whether the file already existed.
fn init_at(path: &Path) -> Result<bool, CliError> {
    let existed = path.exists();
    let config = ConfigFile::load_from(path)?;
    config.save_to(path)?;
    Ok(existed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("delinavi").join("config.ini");

        assert!(!init_at(&path).unwrap());
        assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_init_keeps_existing_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[voice]\nlang = en-US\n").unwrap();

        assert!(init_at(&path).unwrap());
        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.guidance.voice.lang, "en-US");

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("pass_radius_m"));
    }

    #[test]
    fn test_init_leaves_broken_file_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        let contents = "[voice]\nlang = en-US\n\n[leg]\npass_radius_m = oops\n";
        std::fs::write(&path, contents).unwrap();

        let err = init_at(&path).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), contents);
    }
}
