//! Configuration system for jsonnav.
//!
//! `Options` is the record every navigation call carries: the path separator,
//! the broadcast marker and the field used to inject mapping keys during a
//! broadcast. `Config` wraps the options with the command-line settings and is
//! persisted as TOML under the user's config directory.
//!
//! # Example
//!
//! ```
//! use jsonnav::config::{Config, Options};
//!
//! let options = Options::default();
//! assert_eq!(options.separator, ".");
//! assert_eq!(options.broadcast_marker, "^");
//! assert_eq!(options.key_field, "__key");
//!
//! let slashed = Options::default().with_separator("/");
//! assert_eq!(slashed.separator, "/");
//!
//! let config = Config::default();
//! assert!(config.pretty);
//! ```

use crate::path::error::PathError;
use serde::{Deserialize, Serialize};

/// Default path separator.
pub const DEFAULT_SEPARATOR: &str = ".";
/// Default broadcast marker.
pub const DEFAULT_BROADCAST_MARKER: &str = "^";
/// Default key-injection field.
pub const DEFAULT_KEY_FIELD: &str = "__key";

/// Navigation options shared by a node and everything resolved from it.
///
/// # Fields
///
/// * `separator` - Splits a path string into segments (default: ".")
/// * `broadcast_marker` - Marks a segment whose result the rest of the path is
///   mapped over (default: "^")
/// * `key_field` - Field that receives the originating key when broadcasting
///   over a mapping (default: "__key")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    #[serde(default = "default_separator")]
    pub separator: String,

    #[serde(default = "default_broadcast_marker")]
    pub broadcast_marker: String,

    #[serde(default = "default_key_field")]
    pub key_field: String,
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

fn default_broadcast_marker() -> String {
    DEFAULT_BROADCAST_MARKER.to_string()
}

fn default_key_field() -> String {
    DEFAULT_KEY_FIELD.to_string()
}

impl Default for Options {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            broadcast_marker: default_broadcast_marker(),
            key_field: default_key_field(),
        }
    }
}

impl Options {
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_broadcast_marker(mut self, marker: impl Into<String>) -> Self {
        self.broadcast_marker = marker.into();
        self
    }

    pub fn with_key_field(mut self, key_field: impl Into<String>) -> Self {
        self.key_field = key_field.into();
        self
    }

    /// Checks that the options can drive a traversal.
    ///
    /// An empty separator cannot split a path and an empty marker would match
    /// every segment, so both are rejected.
    pub fn validate(&self) -> Result<(), PathError> {
        if self.separator.is_empty() {
            return Err(PathError::InvalidOptions {
                reason: "separator must not be empty".to_string(),
            });
        }
        if self.broadcast_marker.is_empty() {
            return Err(PathError::InvalidOptions {
                reason: "broadcast marker must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration for the jsonnav command-line tool.
///
/// # Fields
///
/// * `options` - Default navigation options, stored at the top level of the file
/// * `pretty` - Pretty-print JSON output (default: true)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub options: Options,

    /// Pretty-print JSON output
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_pretty() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            options: Options::default(),
            pretty: default_pretty(),
        }
    }
}

impl Config {
    /// Returns the path to the config file.
    ///
    /// Uses `~/.config/jsonnav/config.toml` on all platforms.
    pub fn config_path() -> Option<std::path::PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("jsonnav");
            path.push("config.toml");
            path
        })
    }

    /// Loads configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist or can't be read.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Loads configuration from a specific file, falling back to defaults.
    pub fn load_from(path: &std::path::Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("ignoring invalid config {}: {}", path.display(), err);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Saves configuration to the default config file.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&config_path)
    }

    /// Saves configuration to a specific file.
    pub fn save_to(&self, path: &std::path::Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }
}
