//! Configuration module for Cocktail-Mirror
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key is optional; the defaults mirror the public API into `./data`.
//!
//! # Example
//!
//! ```no_run
//! use cocktail_mirror::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("cocktail-mirror.toml")).unwrap();
//! println!("Request delay: {}ms", config.rate_limit.request_delay_ms);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, OutputConfig, RateLimitConfig, SourceConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_config, resolve_config,
    DEFAULT_CONFIG_FILE,
};
pub use validation::validate;
