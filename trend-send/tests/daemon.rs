//! Integration tests for trend-send

use assert_cmd::Command;
use libtrendcast::{Database, PlanItem};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to escape path for TOML on Windows
fn escape_path_for_toml(path: &str) -> String {
    path.replace('\\', "\\\\")
}

fn setup_test_env() -> (TempDir, String, String) {
    let temp_dir = TempDir::new().unwrap();

    let config_path = temp_dir.path().join("config.toml");
    let db_path = temp_dir.path().join("plan.db");

    let config_content = format!(
        r#"
[database]
path = "{}"

[defaults]
user_id = 1
"#,
        escape_path_for_toml(&db_path.to_string_lossy())
    );

    fs::write(&config_path, config_content).unwrap();

    (
        temp_dir,
        config_path.to_string_lossy().to_string(),
        db_path.to_string_lossy().to_string(),
    )
}

fn trend_send(config_path: &str) -> Command {
    let mut cmd = Command::cargo_bin("trend-send").unwrap();
    cmd.env("TRENDCAST_CONFIG", config_path);
    cmd
}

#[tokio::test]
async fn test_once_publishes_due_items_in_dry_run() {
    let (_temp_dir, config_path, db_path) = setup_test_env();

    let db = Database::new(&db_path).await.unwrap();
    // 00:00 is always due, 23:59 almost never is
    db.insert_item(&PlanItem::new(1, 1, "always due", "00:00".parse().unwrap()))
        .await
        .unwrap();
    db.insert_item(&PlanItem::new(1, 2, "last slot", "23:59".parse().unwrap()))
        .await
        .unwrap();
    drop(db);

    trend_send(&config_path)
        .args(["--dry-run", "--once"])
        .assert()
        .success();

    let db = Database::new(&db_path).await.unwrap();
    assert!(db.get_item(1, 1).await.unwrap().unwrap().done);
}

#[tokio::test]
async fn test_once_is_idempotent() {
    let (_temp_dir, config_path, db_path) = setup_test_env();

    let db = Database::new(&db_path).await.unwrap();
    db.insert_item(&PlanItem::new(1, 1, "always due", "00:00".parse().unwrap()))
        .await
        .unwrap();
    drop(db);

    trend_send(&config_path)
        .args(["--dry-run", "--once"])
        .assert()
        .success();

    // Second run finds nothing due and exits cleanly
    trend_send(&config_path)
        .args(["--dry-run", "--once"])
        .assert()
        .success();

    let db = Database::new(&db_path).await.unwrap();
    let stats = db.stats(1).await.unwrap();
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.done, 1);
}

#[test]
fn test_fails_without_configured_platforms() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    trend_send(&config_path)
        .arg("--once")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No platforms are configured"));
}

#[test]
fn test_rejects_bad_poll_interval() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    trend_send(&config_path)
        .args(["--poll-interval", "soon", "--once", "--dry-run"])
        .assert()
        .failure();
}
