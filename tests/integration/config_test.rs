//! Configuration file and command-line integration tests.

use clap::Parser;
use sqlrun::cli::Cli;
use sqlrun::config::Config;
use sqlrun::error::ExecutorError;
use sqlrun::query::SqlExecutor;
use std::fs;
use tempfile::tempdir;

#[tokio::test]
async fn test_named_connection_and_defaults_from_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[defaults]
include_columns = false

[connections.scratch]
url = "  sqlite::memory:  "
"#,
    )
    .unwrap();

    let cli = Cli::parse_from([
        "sqlrun",
        "--config",
        config_path.to_str().unwrap(),
        "-c",
        "scratch",
    ]);
    let config = Config::load_from_file(&cli.config_path()).unwrap();
    let options = cli
        .to_options("SELECT 1 AS id, 'a' AS name".to_string(), &config)
        .unwrap();

    assert!(!options.include_columns);
    let outcome = SqlExecutor::new().run(&options).await.unwrap();
    assert_eq!(outcome.text, r#"[[1,"a"]]"#);
}

#[tokio::test]
async fn test_passthrough_from_flags() {
    let cli = Cli::parse_from([
        "sqlrun",
        "--url",
        "sqlite::memory:",
        "--passthrough",
        "--add-error",
    ]);
    let options = cli
        .to_options("SELECT nope FROM nowhere".to_string(), &Config::default())
        .unwrap();

    let outcome = SqlExecutor::new().run(&options).await.unwrap();
    assert!(outcome.text.contains("no such table: nowhere"));
    assert!(outcome.text.ends_with("\n\nQuery: SELECT nope FROM nowhere"));
}

#[tokio::test]
async fn test_flag_overrides_passthrough_enabled_in_config() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        "[defaults]\npassthrough = true\ninclude_columns = false\n",
    )
    .unwrap();

    let cli = Cli::parse_from([
        "sqlrun",
        "--config",
        config_path.to_str().unwrap(),
        "--url",
        "sqlite::memory:",
        "--no-passthrough",
        "--columns",
    ]);
    let config = Config::load_from_file(&cli.config_path()).unwrap();

    let options = cli.to_options("SELECT 1 AS id".to_string(), &config).unwrap();
    let outcome = SqlExecutor::new().run(&options).await.unwrap();
    assert_eq!(outcome.text, r#"[{"id":1}]"#);

    let options = cli
        .to_options("SELECT nope FROM nowhere".to_string(), &config)
        .unwrap();
    let err = SqlExecutor::new().run(&options).await.unwrap_err();
    assert!(matches!(err, ExecutorError::Query(_)));
}

#[test]
fn test_malformed_config_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "[defaults]\npassthrough = \"yes\"\n").unwrap();

    let err = Config::load_from_file(&config_path).unwrap_err();
    assert!(matches!(err, ExecutorError::Config(_)));
    assert!(err.to_string().contains("config.toml"));
}
