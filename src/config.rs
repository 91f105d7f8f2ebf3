//! Client configuration
//!
//! Settings are read from a YAML or JSON file, then overridden from the
//! environment, then from command-line flags.

use crate::error::{Error, Result};
use crate::http::HttpClientConfig;
use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::types::DatabaseKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Environment variable overriding `api_url`
pub const ENV_API_URL: &str = "AMEMBER_API_URL";
/// Environment variable overriding `api_key`
pub const ENV_API_KEY: &str = "AMEMBER_API_KEY";
/// Environment variable overriding `database.connection_string`
pub const ENV_DB_URL: &str = "AMEMBER_DB_URL";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API root, e.g. `https://members.example.com/api`
    #[serde(default)]
    pub api_url: String,

    /// REST API key
    #[serde(default)]
    pub api_key: String,

    /// Rows requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout")]
    pub connect_timeout_secs: u64,

    /// User agent sent with every request
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Relational mirror settings
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: String::new(),
            page_size: default_page_size(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_timeout(),
            user_agent: None,
            headers: BTreeMap::new(),
            database: None,
        }
    }
}

impl Config {
    /// Load a config file; `.json` files are parsed as JSON, anything else as YAML
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Parse YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parse JSON
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Apply `AMEMBER_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from `lookup` (variable name → value)
    ///
    /// Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(url) = get(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(key) = get(ENV_API_KEY) {
            self.api_key = key;
        }
        if let Some(db_url) = get(ENV_DB_URL) {
            self.database
                .get_or_insert_with(DatabaseConfig::default)
                .connection_string = Some(db_url);
        }
    }

    /// Check the settings needed to talk to the API
    pub fn validate(&self) -> Result<()> {
        if self.api_url.is_empty() {
            return Err(Error::missing_field("api_url"));
        }
        Url::parse(&self.api_url)
            .map_err(|e| Error::invalid_value("api_url", e.to_string()))?;

        if self.api_key.is_empty() {
            return Err(Error::missing_field("api_key"));
        }
        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be greater than zero"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::invalid_value("timeout_secs", "must be greater than zero"));
        }

        if let Some(db) = &self.database {
            db.validate()?;
        }

        Ok(())
    }

    /// HTTP client settings derived from this config
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .base_url(&self.api_url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs));

        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }

        builder.build()
    }
}

// ============================================================================
// Database Config
// ============================================================================

/// Connection settings for the relational mirror
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Backend kind
    #[serde(default)]
    pub engine: DatabaseKind,

    /// Full connection string; takes precedence over the parts below
    #[serde(default)]
    pub connection_string: Option<String>,

    /// Host name
    #[serde(default)]
    pub host: Option<String>,

    /// Port (engine default when omitted)
    #[serde(default)]
    pub port: Option<u16>,

    /// User name
    #[serde(default)]
    pub user: Option<String>,

    /// Password
    #[serde(default)]
    pub password: Option<String>,

    /// Database name, or file path for DuckDB
    #[serde(default)]
    pub database: Option<String>,
}

impl DatabaseConfig {
    /// MySQL settings from a connection string
    pub fn mysql(connection_string: impl Into<String>) -> Self {
        Self {
            engine: DatabaseKind::Mysql,
            connection_string: Some(connection_string.into()),
            ..Self::default()
        }
    }

    /// DuckDB settings for a file path or `:memory:`
    pub fn duckdb(path: impl Into<String>) -> Self {
        Self {
            engine: DatabaseKind::Duckdb,
            database: Some(path.into()),
            ..Self::default()
        }
    }

    /// Connection string, built from the parts when not given directly
    pub fn connection_string(&self) -> String {
        if let Some(conn_str) = &self.connection_string {
            return conn_str.clone();
        }

        match self.engine {
            DatabaseKind::Mysql => {
                let host = self.host.as_deref().unwrap_or("localhost");
                let port = self
                    .port
                    .or(self.engine.default_port())
                    .unwrap_or_default();
                let user = encode_userinfo(self.user.as_deref().unwrap_or("root"));
                let password = encode_userinfo(self.password.as_deref().unwrap_or_default());
                let database = self.database.as_deref().unwrap_or("amember");
                format!("mysql://{user}:{password}@{host}:{port}/{database}")
            }
            DatabaseKind::Duckdb => self
                .database
                .clone()
                .unwrap_or_else(|| ":memory:".to_string()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.engine == DatabaseKind::Mysql
            && self.connection_string.is_none()
            && self.database.is_none()
        {
            return Err(Error::missing_field("database.database"));
        }
        Ok(())
    }
}

/// Percent-encode a user or password for the URI userinfo part
fn encode_userinfo(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
