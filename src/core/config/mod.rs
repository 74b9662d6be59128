//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. The first config file found (see below)
//! 3. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! Searched in order, the first existing file wins:
//! 1. The path passed with `--config` (must exist)
//! 2. `$CGMETA_CONFIG` if set
//! 3. `./cgmeta.toml`
//! 4. `$XDG_CONFIG_HOME/cgmeta/config.toml`
//! 5. `~/.cgmeta/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use cgmeta::core::config::Config;
//!
//! let result = Config::load(None).unwrap();
//! let config = result.config;
//!
//! println!("Query files: {}", config.sql_dir().display());
//! println!("Metadata: {}", config.out_dir().display());
//! println!("Tool version: {}", config.tool_version());
//! ```

pub mod schema;

pub use schema::ToolConfig;

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "CGMETA_CONFIG";

/// Config file name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "cgmeta.toml";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid TOML for the schema.
    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    /// A config value failed validation.
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Where to look for a config file.
///
/// [`Config::load`] fills this from the process environment; tests build it
/// directly.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Path given on the command line.
    pub explicit: Option<PathBuf>,
    /// Value of `$CGMETA_CONFIG`.
    pub env_path: Option<PathBuf>,
    /// Working directory.
    pub cwd: Option<PathBuf>,
    /// Value of `$XDG_CONFIG_HOME`.
    pub xdg_config_home: Option<PathBuf>,
    /// Home directory.
    pub home: Option<PathBuf>,
}

impl ConfigSources {
    /// Sources from the process environment.
    pub fn from_env(explicit: Option<&Path>) -> Self {
        Self {
            explicit: explicit.map(Path::to_path_buf),
            env_path: std::env::var_os(CONFIG_ENV).map(PathBuf::from),
            cwd: std::env::current_dir().ok(),
            xdg_config_home: std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
            home: dirs::home_dir(),
        }
    }
}

/// Loaded configuration with defaults applied by the accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Values read from the config file
    pub file: ToolConfig,
    /// Path to the config file (if loaded)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed, or if
    /// `explicit` names a file that cannot be read. Missing config files are
    /// otherwise not an error (defaults are used).
    pub fn load(explicit: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        Self::load_from(&ConfigSources::from_env(explicit))
    }

    /// Load configuration from the given sources.
    pub fn load_from(sources: &ConfigSources) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();
        let (file, path) = Self::locate(sources, &mut warnings)?;

        file.validate()?;

        Ok(ConfigLoadResult {
            config: Config { file, path },
            warnings,
        })
    }

    fn locate(
        sources: &ConfigSources,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<(ToolConfig, Option<PathBuf>), ConfigError> {
        // 1. --config must exist
        if let Some(path) = &sources.explicit {
            let config = Self::read_config(path)?;
            return Ok((config, Some(path.clone())));
        }

        // 2. $CGMETA_CONFIG
        if let Some(path) = &sources.env_path {
            if path.exists() {
                let config = Self::read_config(path)?;
                return Ok((config, Some(path.clone())));
            }
            warnings.push(ConfigWarning {
                message: format!("${CONFIG_ENV} points to a missing file; ignoring it"),
                path: path.clone(),
            });
        }

        // 3. ./cgmeta.toml, 4. $XDG_CONFIG_HOME/cgmeta/config.toml, 5. ~/.cgmeta/config.toml
        let candidates = [
            sources.cwd.as_ref().map(|d| d.join(LOCAL_CONFIG_FILE)),
            sources
                .xdg_config_home
                .as_ref()
                .map(|d| d.join("cgmeta/config.toml")),
            sources.home.as_ref().map(|d| d.join(".cgmeta/config.toml")),
        ];

        for path in candidates.into_iter().flatten() {
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // No config found, use defaults
        Ok((ToolConfig::default(), None))
    }

    /// Read and parse a config file.
    fn read_config(path: &Path) -> Result<ToolConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Directory holding query files.
    ///
    /// Defaults to the working directory.
    pub fn sql_dir(&self) -> &Path {
        self.file.sql_dir.as_deref().unwrap_or(Path::new("."))
    }

    /// Directory of metadata documents.
    ///
    /// Defaults to the working directory.
    pub fn out_dir(&self) -> &Path {
        self.file.out_dir.as_deref().unwrap_or(Path::new("."))
    }

    /// Tool version stamped into new documents.
    ///
    /// Defaults to the version of this crate.
    pub fn tool_version(&self) -> &str {
        self.file
            .tool_version
            .as_deref()
            .unwrap_or(env!("CARGO_PKG_VERSION"))
    }

    /// Get the path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, contents: &str) -> PathBuf {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn load_empty_defaults() {
        let temp = TempDir::new().unwrap();
        let sources = ConfigSources {
            cwd: Some(temp.path().to_path_buf()),
            ..Default::default()
        };

        let result = Config::load_from(&sources).unwrap();
        let config = result.config;

        assert_eq!(config.sql_dir(), Path::new("."));
        assert_eq!(config.out_dir(), Path::new("."));
        assert_eq!(config.tool_version(), env!("CARGO_PKG_VERSION"));
        assert!(config.loaded_from().is_none());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn load_explicit() {
        let temp = TempDir::new().unwrap();
        let path = write(
            temp.path(),
            "custom.toml",
            r#"
            sql_dir = "queries"
            tool_version = "2.0.0"
            "#,
        );

        let sources = ConfigSources {
            explicit: Some(path.clone()),
            ..Default::default()
        };
        let config = Config::load_from(&sources).unwrap().config;

        assert_eq!(config.sql_dir(), Path::new("queries"));
        assert_eq!(config.out_dir(), Path::new("."));
        assert_eq!(config.tool_version(), "2.0.0");
        assert_eq!(config.loaded_from(), Some(path.as_path()));
    }

    #[test]
    fn explicit_must_exist() {
        let temp = TempDir::new().unwrap();
        let sources = ConfigSources {
            explicit: Some(temp.path().join("missing.toml")),
            ..Default::default()
        };
        assert!(matches!(
            Config::load_from(&sources),
            Err(ConfigError::ReadError { .. })
        ));
    }

    #[test]
    fn env_path_before_local_file() {
        let temp = TempDir::new().unwrap();
        let env_path = write(temp.path(), "env/config.toml", "out_dir = \"from-env\"");
        write(temp.path(), "cgmeta.toml", "out_dir = \"from-cwd\"");

        let sources = ConfigSources {
            env_path: Some(env_path),
            cwd: Some(temp.path().to_path_buf()),
            ..Default::default()
        };
        let config = Config::load_from(&sources).unwrap().config;
        assert_eq!(config.out_dir(), Path::new("from-env"));
    }

    #[test]
    fn missing_env_path_warns() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "cgmeta.toml", "out_dir = \"from-cwd\"");

        let sources = ConfigSources {
            env_path: Some(temp.path().join("nope.toml")),
            cwd: Some(temp.path().to_path_buf()),
            ..Default::default()
        };
        let result = Config::load_from(&sources).unwrap();

        assert_eq!(result.config.out_dir(), Path::new("from-cwd"));
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].message.contains(CONFIG_ENV));
    }

    #[test]
    fn xdg_before_home() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "xdg/cgmeta/config.toml", "sql_dir = \"xdg\"");
        write(temp.path(), "home/.cgmeta/config.toml", "sql_dir = \"home\"");

        let sources = ConfigSources {
            xdg_config_home: Some(temp.path().join("xdg")),
            home: Some(temp.path().join("home")),
            ..Default::default()
        };
        assert_eq!(
            Config::load_from(&sources).unwrap().config.sql_dir(),
            Path::new("xdg")
        );

        let sources = ConfigSources {
            home: Some(temp.path().join("home")),
            ..Default::default()
        };
        assert_eq!(
            Config::load_from(&sources).unwrap().config.sql_dir(),
            Path::new("home")
        );
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write(
            temp.path(),
            "cgmeta.toml",
            r#"
            sql_dir = "sql"
            unknown_field = true
            "#,
        );

        let sources = ConfigSources {
            explicit: Some(path),
            ..Default::default()
        };
        assert!(matches!(
            Config::load_from(&sources),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn invalid_value_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), "cgmeta.toml", "tool_version = \"\"");

        let sources = ConfigSources {
            explicit: Some(path),
            ..Default::default()
        };
        assert!(matches!(
            Config::load_from(&sources),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
