//! Connection settings.
//!
//! Settings are either assembled field by field (CLI flags, environment) or
//! parsed from an ADO-style connection string such as
//! `DataSource=localhost;Port=3050;Database=/data/app.fdb;User=SYSDBA;Password=masterkey`.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3050;
pub const DEFAULT_USER: &str = "SYSDBA";
pub const DEFAULT_PASSWORD: &str = "masterkey";

/// Where and as whom to connect.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    /// Database path (or alias) as seen by the server.
    pub database: String,
    pub user: String,
    pub password: String,
}

impl ConnectionConfig {
    /// Settings for `database` with default host and credentials.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database: database.into(),
            user: DEFAULT_USER.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_credentials(
        mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }
}

// Keeps the password out of logs.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

impl fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.host, self.port, self.database)
    }
}

impl FromStr for ConnectionConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut config = ConnectionConfig::new(String::new());

        for pair in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| Error::Config(format!("expected key=value, got {pair:?}")))?;
            let value = value.trim();
            let key = key.trim().to_ascii_lowercase();

            match key.as_str() {
                "datasource" | "data source" | "server" | "host" => {
                    config.host = value.to_string()
                }
                "port" => {
                    config.port = value
                        .parse()
                        .map_err(|e| Error::Config(format!("invalid port {value:?}: {e}")))?
                }
                "database" | "initial catalog" => config.database = value.to_string(),
                "user" | "userid" | "user id" | "uid" => config.user = value.to_string(),
                "password" | "pwd" => config.password = value.to_string(),
                other => tracing::debug!("Ignoring connection string key {other:?}"),
            }
        }

        if config.database.is_empty() {
            return Err(Error::Config(
                "connection string does not name a database".to_string(),
            ));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConnectionConfig::new("/data/app.fdb");
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 3050);
        assert_eq!(config.user, "SYSDBA");
        assert_eq!(config.password, "masterkey");
    }

    #[test]
    fn test_parse_full_connection_string() {
        let config: ConnectionConfig =
            "DataSource=db.local;Port=3051;Database=/srv/app.fdb;User=ADMIN;Password=secret"
                .parse()
                .unwrap();
        assert_eq!(
            config,
            ConnectionConfig::new("/srv/app.fdb")
                .with_host("db.local")
                .with_port(3051)
                .with_credentials("ADMIN", "secret")
        );
    }

    #[test]
    fn test_parse_key_aliases_and_unknown_keys() {
        let config: ConnectionConfig = " data source = srv ; Initial Catalog = app.fdb ; \
             User ID = u ; Pwd = p ; ServerType=0; ClientLibrary=fbclient.dll;"
            .parse()
            .unwrap();
        assert_eq!(config.host, "srv");
        assert_eq!(config.database, "app.fdb");
        assert_eq!(config.user, "u");
        assert_eq!(config.password, "p");
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_parse_keeps_defaults() {
        let config: ConnectionConfig = "Database=employee".parse().unwrap();
        assert_eq!(config, ConnectionConfig::new("employee"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "DataSource=localhost".parse::<ConnectionConfig>(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            "Database=x;Port=abc".parse::<ConnectionConfig>(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            "Database=x;garbage".parse::<ConnectionConfig>(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_debug_hides_password() {
        let config = ConnectionConfig::new("app.fdb").with_credentials("U", "hunter2");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert_eq!(config.to_string(), "localhost:3050/app.fdb");
    }
}
