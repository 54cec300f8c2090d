//! End-to-end tests against a running Firebird server.
//!
//! Set `FIREBIRD_TEST_DATABASE` to a database path on the server (plus the
//! usual `FIREBIRD_HOST`, `FIREBIRD_PORT`, `FIREBIRD_USER` and
//! `FIREBIRD_PASSWORD`) and run with `--ignored`.

use dbmeta_firebird::{ConnectionConfig, FirebirdClient, StatementExecutor};
use dbmeta_sync::{apply_snapshot, export_scripts, load_snapshot};
use tempfile::TempDir;

fn test_config() -> Option<ConnectionConfig> {
    let database = std::env::var("FIREBIRD_TEST_DATABASE").ok()?;
    let mut config = ConnectionConfig::new(database);
    if let Ok(host) = std::env::var("FIREBIRD_HOST") {
        config.host = host;
    }
    if let Some(port) = std::env::var("FIREBIRD_PORT").ok().and_then(|p| p.parse().ok()) {
        config.port = port;
    }
    if let Ok(user) = std::env::var("FIREBIRD_USER") {
        config.user = user;
    }
    if let Ok(password) = std::env::var("FIREBIRD_PASSWORD") {
        config.password = password;
    }
    Some(config)
}

#[test]
#[ignore = "requires a Firebird server"]
fn test_export_and_reapply_is_clean() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("dbmeta_firebird=debug,dbmeta_sync=debug")
        .try_init();

    let Some(config) = test_config() else {
        eprintln!("FIREBIRD_TEST_DATABASE not set, skipping");
        return Ok(());
    };

    let mut client = FirebirdClient::connect(&config)?;
    client.execute(
        "EXECUTE BLOCK AS\nBEGIN\n  \
         IF (NOT EXISTS(SELECT 1 FROM RDB$FIELDS WHERE RDB$FIELD_NAME = 'E2E_AGE')) THEN\n    \
         EXECUTE STATEMENT 'CREATE DOMAIN E2E_AGE AS SMALLINT NOT NULL';\nEND",
    )?;
    drop(client);

    let temp_dir = TempDir::new()?;
    export_scripts(&config, temp_dir.path())?;

    let snapshot = load_snapshot(temp_dir.path())?.expect("snapshot was just written");
    let age = snapshot.get_domain("E2E_AGE").expect("domain exported");
    assert_eq!(age.data_type, "SMALLINT");
    assert!(age.not_null);

    let mut client = FirebirdClient::connect(&config)?;
    let report = apply_snapshot(&mut client, &snapshot);
    assert!(report.is_clean(), "{:?}", report.failures);
    Ok(())
}
