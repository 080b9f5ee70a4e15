use assert_cmd::Command;
use predicates::prelude::*;

fn mentorboard() -> Command {
    let mut cmd = Command::cargo_bin("mentorboard").unwrap();
    cmd.env_remove("MENTORBOARD_DATABASE_URL")
        .env_remove("MENTORBOARD_AUTH_TOKEN")
        .env_remove("MENTORBOARD_THEME")
        .env_remove("MENTORBOARD_LOG");
    cmd
}

#[test]
fn prints_help() {
    mentorboard()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn bad_argument_fails() {
    mentorboard()
        .arg("--does-not-exist")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn list_without_database_url_fails() {
    let config = tempfile::NamedTempFile::new().unwrap();
    mentorboard()
        .arg("--config")
        .arg(config.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no database URL configured"));
}

#[test]
fn invalid_theme_is_rejected() {
    let config = tempfile::NamedTempFile::new().unwrap();
    mentorboard()
        .env("MENTORBOARD_THEME", "sepia")
        .arg("--config")
        .arg(config.path())
        .args(["--database-url", "http://127.0.0.1:9", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sepia"));
}
