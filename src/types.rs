//! Common types used throughout the aMember client
//!
//! Small enums shared by the configuration, the database layer and the CLI.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Database Engine Kind
// ============================================================================

/// Backend holding the relational mirror
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    /// Live MySQL database, attached read-only
    #[default]
    Mysql,
    /// DuckDB file or `:memory:`
    Duckdb,
}

impl DatabaseKind {
    /// Default TCP port, when the engine has one
    pub fn default_port(self) -> Option<u16> {
        match self {
            DatabaseKind::Mysql => Some(3306),
            DatabaseKind::Duckdb => None,
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseKind::Mysql => write!(f, "mysql"),
            DatabaseKind::Duckdb => write!(f, "duckdb"),
        }
    }
}

// ============================================================================
// Output Format
// ============================================================================

/// How listings are printed
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One compact JSON document
    #[default]
    Json,
    /// Indented JSON
    Pretty,
}

impl OutputFormat {
    /// Render `value` in this format
    pub fn render<T: Serialize>(self, value: &T) -> serde_json::Result<String> {
        match self {
            OutputFormat::Json => serde_json::to_string(value),
            OutputFormat::Pretty => serde_json::to_string_pretty(value),
        }
    }
}
