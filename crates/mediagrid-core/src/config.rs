//! Configuration for the mediagrid control plane.
//!
//! Runtime settings come from a JSON config file naming the local host and
//! the database the cluster registry lives in. The database can be given
//! either as a structured object or as a compact `user:pass@host:port/dbname`
//! string. Tunables that are not meant to be user-configured live in the
//! constant structs below.

use crate::{GridError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Transport-level tunables.
pub struct TransportConfig;

impl TransportConfig {
    /// Timeout for establishing a TCP connection to a module endpoint.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
    /// Maximum size of a single RPC frame (16 MB).
    pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;
    /// Maximum concurrent connections accepted by an RPC server.
    pub const MAX_CONNECTIONS: usize = 64;
}

/// Database connection settings for the cluster registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for DbSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: "mediagrid".to_string(),
        }
    }
}

impl DbSettings {
    /// Parse the compact `user:pass@host:port/dbname` connection form.
    ///
    /// Password and port are optional: `admin@db-host/mediagrid` is valid.
    pub fn parse_compact(text: &str) -> Result<Self> {
        let re = Regex::new(r"^([^@]+)@([^/]+)/([^/]+)/?$").expect("static regex");
        let caps = re.captures(text).ok_or_else(|| GridError::Config {
            message: format!("invalid database setting: {text}"),
        })?;

        let mut settings = DbSettings {
            database: caps[3].to_string(),
            ..Default::default()
        };

        let userinfo = &caps[1];
        match userinfo.split_once(':') {
            Some((user, password)) => {
                settings.user = user.to_string();
                settings.password = password.to_string();
            }
            None => {
                settings.user = userinfo.to_string();
                settings.password = String::new();
            }
        }

        let conninfo = &caps[2];
        match conninfo.split_once(':') {
            Some((host, port)) => {
                settings.host = host.to_string();
                settings.port = port.parse().map_err(|_| GridError::Config {
                    message: format!("invalid database port: {port}"),
                })?;
            }
            None => {
                settings.host = conninfo.to_string();
            }
        }

        Ok(settings)
    }
}

/// A database field in the config file: structured or compact string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum DbField {
    Compact(String),
    Full(DbSettings),
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    host: String,
    database: DbField,
}

/// Top-level configuration: the local host name and the registry database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Name of the host this process runs on, as registered in the cluster.
    pub host: String,
    /// Connection settings for the cluster registry database.
    pub db: DbSettings,
}

impl Config {
    /// Build a config directly (tests, embedders).
    pub fn new(host: impl Into<String>, db: DbSettings) -> Self {
        Self {
            host: host.into(),
            db,
        }
    }

    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| GridError::Io {
            message: format!("failed to read config {}: {}", path.display(), e),
            source: Some(e),
        })?;
        Self::from_json(&raw)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(raw)?;
        if file.host.is_empty() {
            return Err(GridError::Config {
                message: "config is missing a host name".to_string(),
            });
        }
        let db = match file.database {
            DbField::Compact(text) => DbSettings::parse_compact(&text)?,
            DbField::Full(settings) => settings,
        };
        Ok(Self {
            host: file.host,
            db,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compact_full_form() {
        let db = DbSettings::parse_compact("admin:secret@db-host:3307/cluster").unwrap();
        assert_eq!(db.user, "admin");
        assert_eq!(db.password, "secret");
        assert_eq!(db.host, "db-host");
        assert_eq!(db.port, 3307);
        assert_eq!(db.database, "cluster");
    }

    #[test]
    fn test_parse_compact_defaults() {
        // user without password, host without port
        let db = DbSettings::parse_compact("admin@db-host/cluster").unwrap();
        assert_eq!(db.user, "admin");
        assert_eq!(db.password, "");
        assert_eq!(db.host, "db-host");
        assert_eq!(db.port, 3306);
    }

    #[test]
    fn test_parse_compact_rejects_garbage() {
        assert!(DbSettings::parse_compact("no-at-sign/db").is_err());
        assert!(DbSettings::parse_compact("user@host:notaport/db").is_err());
    }

    #[test]
    fn test_config_from_json_structured() {
        let config = Config::from_json(
            r#"{
                "host": "studio-1",
                "database": {"host": "db", "port": 3306, "user": "grid", "password": "pw", "database": "mediagrid"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.host, "studio-1");
        assert_eq!(config.db.user, "grid");
    }

    #[test]
    fn test_config_from_json_compact() {
        let config = Config::from_json(
            r#"{"host": "studio-1", "database": "grid:pw@db:3306/mediagrid"}"#,
        )
        .unwrap();
        assert_eq!(config.db.host, "db");
        assert_eq!(config.db.database, "mediagrid");
    }

    #[test]
    fn test_config_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mediagrid.json");
        std::fs::write(
            &path,
            r#"{"host": "studio-2", "database": "grid@localhost/mediagrid"}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.host, "studio-2");
        assert_eq!(config.db.user, "grid");

        assert!(Config::load(dir.path().join("missing.json")).is_err());
    }
}
