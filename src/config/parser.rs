use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// File name looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "cocktail-mirror.toml";

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use cocktail_mirror::config::load_config;
///
/// let config = load_config(Path::new("cocktail-mirror.toml")).unwrap();
/// println!("Data dir: {}", config.output.data_dir.display());
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Recorded in the progress ledger so that a run can notice the configuration
/// changed since the ledger was started.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(hash_content(&content))
}

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Resolves the configuration for a run
///
/// An explicit path must exist. Without one, `cocktail-mirror.toml` in the
/// working directory is used when present, otherwise the built-in defaults.
/// The hash is `None` when running on defaults.
pub fn resolve_config(path: Option<&Path>) -> Result<(Config, Option<String>), ConfigError> {
    if let Some(path) = path {
        let (config, hash) = load_config_with_hash(path)?;
        return Ok((config, Some(hash)));
    }

    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    if default_path.exists() {
        let (config, hash) = load_config_with_hash(default_path)?;
        return Ok((config, Some(hash)));
    }

    let config = Config::default();
    validate(&config)?;
    Ok((config, None))
}
