//! core::config::schema
//!
//! Configuration file schema.
//!
//! # Validation
//!
//! Values are validated after parsing: every value that is present must be
//! non-empty. Unknown keys are rejected by the parser.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Contents of a `cgmeta` configuration file.
///
/// # Example
///
/// ```toml
/// sql_dir = "sql"
/// out_dir = "generated/metadata"
/// tool_version = "1.4.0"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Directory holding `<name>.cssql` query files
    pub sql_dir: Option<PathBuf>,

    /// Directory metadata documents are written to and read from
    pub out_dir: Option<PathBuf>,

    /// Tool version stamped into written documents
    pub tool_version: Option<String>,
}

impl ToolConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, dir) in [("sql_dir", &self.sql_dir), ("out_dir", &self.out_dir)] {
            if dir.as_ref().is_some_and(|d| d.as_os_str().is_empty()) {
                return Err(ConfigError::InvalidValue(format!("{key} cannot be empty")));
            }
        }

        if let Some(version) = &self.tool_version {
            if version.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "tool_version cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}
