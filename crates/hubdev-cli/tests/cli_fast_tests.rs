//! Fast CLI tests using assert_cmd.
//! These test the binary directly without needing a container runtime.

#![allow(deprecated)] // assert_cmd::Command::cargo_bin is deprecated but works fine

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

/// `hub` with the config dir pointed into `home` and no repo dir in the environment
fn hub(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("hub").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("HUB_REPO_DIR");
    cmd
}

#[test]
fn test_help_flag() {
    let tmp = tempfile::tempdir().unwrap();
    hub(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Hub backend dev bootstrapper"));
}

#[test]
fn test_version_flag() {
    let tmp = tempfile::tempdir().unwrap();
    hub(tmp.path()).arg("--version").assert().success();
}

#[test]
fn test_subcommand_help() {
    let tmp = tempfile::tempdir().unwrap();
    for subcmd in &["up", "down", "status", "poll", "config"] {
        hub(tmp.path())
            .args([subcmd, "--help"])
            .assert()
            .success()
            .stdout(predicate::str::is_empty().not());
    }
}

#[test]
fn test_up_help_lists_build_flags() {
    let tmp = tempfile::tempdir().unwrap();
    hub(tmp.path())
        .args(["up", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--skip-build"))
        .stdout(predicate::str::contains("--remove-images"))
        .stdout(predicate::str::contains("-v, --prune-volumes"));
}

#[test]
fn test_unknown_subcommand_fails() {
    let tmp = tempfile::tempdir().unwrap();
    hub(tmp.path())
        .arg("nonexistent-subcommand")
        .assert()
        .failure();
}

#[test]
fn test_config_shows_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    hub(tmp.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("not created yet"))
        .stdout(predicate::str::contains("[backend]"))
        .stdout(predicate::str::contains("app_service = \"webapp\""));
}

#[test]
fn test_config_shows_repo_dir_override() {
    let tmp = tempfile::tempdir().unwrap();
    hub(tmp.path())
        .args(["config", "--repo-dir", "/srv/hub"])
        .assert()
        .success()
        .stdout(predicate::str::contains("repo_dir = \"/srv/hub\""));
}

#[test]
fn test_invalid_config_file_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let config_dir = tmp.path().join(".config/hubdev");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "[poll\ninterval_secs = 3").unwrap();

    hub(tmp.path())
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_up_without_repo_dir_fails() {
    let tmp = tempfile::tempdir().unwrap();
    hub(tmp.path())
        .args(["up", "--skip-build"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("HUB_REPO_DIR"));
}

#[test]
fn test_down_unbuilt_backend_succeeds() {
    let tmp = tempfile::tempdir().unwrap();
    let repo = tempfile::tempdir().unwrap();
    hub(tmp.path())
        .arg("down")
        .arg("--repo-dir")
        .arg(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("hasn't been built yet"));
}

#[cfg(unix)]
mod fake_runtime {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Install a fake docker that prints `ps_output` and point the config at it
    fn install_fake_docker(home: &Path, ps_output: &str) {
        let script = home.join("fake-docker");
        std::fs::write(&script, format!("#!/bin/sh\nprintf '{}'\n", ps_output)).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config_dir = home.join(".config/hubdev");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("config.toml"),
            format!(
                "[runtime]\ndocker = \"{}\"\n\n[poll]\ninterval_secs = 1\ntimeout_secs = 2\n",
                script.display()
            ),
        )
        .unwrap();
    }

    #[test]
    fn test_status_prints_table() {
        let tmp = tempfile::tempdir().unwrap();
        install_fake_docker(
            tmp.path(),
            "a1\\thub-webapp\\tUp 2 minutes (healthy)\\nb2\\thub-solr\\tUp 5 seconds (health: starting)\\n",
        );

        hub(tmp.path())
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("NAME"))
            .stdout(predicate::str::contains("hub-webapp"))
            .stdout(predicate::str::contains("(health: starting)"));
    }

    #[test]
    fn test_status_with_no_containers() {
        let tmp = tempfile::tempdir().unwrap();
        install_fake_docker(tmp.path(), "");

        hub(tmp.path())
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("No containers running."));
    }

    #[test]
    fn test_poll_succeeds_when_healthy() {
        let tmp = tempfile::tempdir().unwrap();
        install_fake_docker(tmp.path(), "a1\\thub-webapp\\tUp 2 minutes (healthy)\\n");

        hub(tmp.path())
            .arg("poll")
            .assert()
            .success()
            .stdout(predicate::str::contains("All containers are healthy"));
    }

    #[test]
    fn test_poll_reports_unhealthy_container() {
        let tmp = tempfile::tempdir().unwrap();
        install_fake_docker(tmp.path(), "b2\\thub-solr\\tUp 1 minute (unhealthy)\\n");

        hub(tmp.path())
            .arg("poll")
            .assert()
            .failure()
            .stderr(predicate::str::contains("hub-solr (b2) is unhealthy"))
            .stderr(predicate::str::contains("docker logs b2"));
    }

    #[test]
    fn test_poll_times_out_while_starting() {
        let tmp = tempfile::tempdir().unwrap();
        install_fake_docker(tmp.path(), "a1\\thub-webapp\\tUp 1 second (health: starting)\\n");

        hub(tmp.path())
            .arg("poll")
            .assert()
            .failure()
            .stderr(predicate::str::contains("timed out"));
    }
}
