//! dbmeta-sync library
//!
//! Keeps Firebird schema metadata (domains, tables and stored procedures) in
//! a JSON snapshot and recreates it in other databases.
//!
//! - `export-scripts` reads the catalog of a live database and writes
//!   `databaseMeta.json`.
//! - `build-db` creates a database file if needed and applies a snapshot to it.
//! - `update-db` applies a snapshot to an existing database.
//!
//! Applying is idempotent: domains and tables that already exist are left
//! untouched and procedures are replaced.
//!
//! # CLI Usage
//!
//! ```bash
//! dbmeta-sync export-scripts \
//!   --connection-string "DataSource=localhost;Database=/data/app.fdb;User=SYSDBA;Password=pw" \
//!   --output-dir ./scripts
//!
//! dbmeta-sync build-db --db-dir /data/fresh --scripts-dir ./scripts
//!
//! dbmeta-sync update-db --connection-string "Database=/data/app.fdb" \
//!   --scripts-dir ./scripts --dry-run
//! ```

use clap::Parser;
use dbmeta_firebird::config::{DEFAULT_HOST, DEFAULT_PASSWORD, DEFAULT_PORT, DEFAULT_USER};
use dbmeta_firebird::ConnectionConfig;

pub mod apply;
pub mod export;

pub use apply::{apply_snapshot, build_database, load_snapshot, update_database, DATABASE_FILE_NAME};
pub use export::{export_scripts, export_to_store};

/// Server settings used when no connection string is given.
#[derive(Parser, Clone)]
pub struct FirebirdOpts {
    /// Firebird server host
    #[arg(long, default_value = DEFAULT_HOST, env = "FIREBIRD_HOST")]
    pub firebird_host: String,

    /// Firebird server port
    #[arg(long, default_value_t = DEFAULT_PORT, env = "FIREBIRD_PORT")]
    pub firebird_port: u16,

    /// Firebird user
    #[arg(long, default_value = DEFAULT_USER, env = "FIREBIRD_USER")]
    pub firebird_user: String,

    /// Firebird password
    #[arg(long, default_value = DEFAULT_PASSWORD, env = "FIREBIRD_PASSWORD")]
    pub firebird_password: String,
}

impl FirebirdOpts {
    /// Connection settings for `database` on the configured server.
    pub fn config_for(&self, database: impl Into<String>) -> ConnectionConfig {
        ConnectionConfig::new(database)
            .with_host(self.firebird_host.clone())
            .with_port(self.firebird_port)
            .with_credentials(self.firebird_user.clone(), self.firebird_password.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        opts: FirebirdOpts,
    }

    #[test]
    fn test_firebird_opts_defaults() {
        let cli = TestCli::try_parse_from(["test"]).unwrap();
        let config = cli.opts.config_for("/data/app.fdb");
        assert_eq!(config.database, "/data/app.fdb");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.user, DEFAULT_USER);
    }

    #[test]
    fn test_firebird_opts_flags() {
        let cli = TestCli::try_parse_from([
            "test",
            "--firebird-host",
            "db.local",
            "--firebird-port",
            "3051",
            "--firebird-user",
            "ADMIN",
            "--firebird-password",
            "secret",
        ])
        .unwrap();
        let config = cli.opts.config_for("app.fdb");
        assert_eq!(config.host, "db.local");
        assert_eq!(config.port, 3051);
        assert_eq!(config.user, "ADMIN");
        assert_eq!(config.password, "secret");
    }
}
