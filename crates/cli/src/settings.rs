//! Configuration file discovery.

use std::path::{Path, PathBuf};

use tracing::debug;

use cartons_recon::InventoryConfig;

use crate::error::CliError;

/// `<config dir>/cartons-inventory/config.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cartons-inventory").join("config.toml"))
}

/// Load the explicit config file, else the default one if present, else defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<InventoryConfig, CliError> {
    let path = match explicit {
        Some(path) => {
            if !path.is_file() {
                return Err(CliError::usage(format!("config file not found: {}", path.display())));
            }
            path.to_path_buf()
        }
        None => match default_config_path().filter(|p| p.is_file()) {
            Some(path) => path,
            None => return Ok(InventoryConfig::default()),
        },
    };

    let text = std::fs::read_to_string(&path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {e}", path.display())))?;
    let config = InventoryConfig::from_toml(&text)
        .map_err(|e| CliError::from(e).with_hint(format!("in {}", path.display())))?;
    debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::EXIT_USAGE;

    #[test]
    fn explicit_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[output]\ndelimiter = \",\"\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.output.delimiter, ',');
        assert_eq!(config.input.delimiter, '|');
    }

    #[test]
    fn missing_explicit_file_is_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
    }

    #[test]
    fn invalid_config_is_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[fields]\nsets = [\"priority\"]\nranges = [\"value\"]\n").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
        assert!(err.hint.unwrap().contains("config.toml"));
    }
}
