//! Integration tests for the extman binary

use assert_cmd::Command;
use extman_test_utils::TestHost;
use predicates::prelude::*;

/// Get a Command for the extman binary rooted at `host`
fn extman(host: &TestHost) -> Command {
    let mut cmd = Command::cargo_bin("extman").expect("Failed to find extman binary");
    cmd.current_dir(host.root())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("EXTMAN_ROOT")
        .env_remove("EXTMAN_HOST_VERSION")
        .env_remove("EXTMAN_ENABLE_ON_INSTALL")
        .env_remove("EXTMAN_SKIP_REGISTRY");
    cmd
}

fn host_with_settings() -> TestHost {
    let host = TestHost::new();
    host.write_settings("host_version = \"2.0.0\"\n");
    host
}

// ============================================================================
// Help and argument errors
// ============================================================================

#[test]
fn test_help_lists_commands() {
    let host = TestHost::new();
    extman(&host)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("load-order"));
}

#[test]
fn test_move_without_placement_fails() {
    let host = host_with_settings();
    extman(&host).args(["move", "blog"]).assert().failure();
}

// ============================================================================
// Install / list
// ============================================================================

#[test]
fn test_install_then_list() {
    let host = host_with_settings();
    let source = host.extension("blog").version("1.2.0").write();

    extman(&host)
        .arg("install")
        .arg(&source)
        .arg("--enable")
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed 'blog' 1.2.0 (enabled)"));

    extman(&host)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("blog"))
        .stdout(predicate::str::contains("enabled"));
}

#[test]
fn test_list_json() {
    let host = host_with_settings();
    let source = host.extension("blog").write();
    extman(&host).arg("install").arg(&source).assert().success();

    let output = extman(&host).args(["list", "--json"]).output().unwrap();
    assert!(output.status.success());
    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records[0]["name"], "blog");
    assert_eq!(records[0]["enabled"], false);
}

#[test]
fn test_list_empty_host() {
    let host = TestHost::new();
    extman(&host)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No extensions installed"));
}

#[test]
fn test_install_missing_dependency_fails() {
    let host = host_with_settings();
    let source = host.extension("admin").dep("auth").write();

    extman(&host)
        .arg("install")
        .arg(&source)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("depends on 'auth'"));
    host.assert_file_not_exists("content/extensions/extensions.json");
}

#[test]
fn test_install_without_host_version_fails() {
    let host = TestHost::new();
    let source = host.extension("blog").write();

    extman(&host)
        .arg("install")
        .arg(&source)
        .assert()
        .failure()
        .stderr(predicate::str::contains("host_version"));
}

#[test]
fn test_host_version_flag() {
    let host = TestHost::new();
    let source = host.extension("blog").write();

    extman(&host)
        .args(["--host-version", "1.5.0", "install"])
        .arg(&source)
        .assert()
        .success();
}

#[test]
fn test_root_flag_from_elsewhere() {
    let host = host_with_settings();
    let source = host.extension("blog").write();
    let elsewhere = tempfile::TempDir::new().unwrap();

    let mut cmd = extman(&host);
    cmd.current_dir(elsewhere.path())
        .arg("--root")
        .arg(host.root())
        .arg("install")
        .arg(&source)
        .assert()
        .success();
    assert_eq!(host.registry_names(), vec!["blog"]);
}

// ============================================================================
// Enable / disable / uninstall
// ============================================================================

#[test]
fn test_enable_requires_dependencies() {
    let host = host_with_settings();
    let auth = host.extension("auth").write();
    let admin = host.extension("admin").dep("auth").write();
    extman(&host).arg("install").arg(&auth).assert().success();
    extman(&host).arg("install").arg(&admin).assert().success();

    extman(&host)
        .args(["enable", "admin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing 1"));

    extman(&host).args(["enable", "auth"]).assert().success();
    extman(&host)
        .args(["enable", "admin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Enabled 'admin'"));
}

#[test]
fn test_disable_unknown_fails() {
    let host = host_with_settings();
    extman(&host)
        .args(["disable", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not in the registry"));
}

#[test]
fn test_uninstall_and_reinstall_restores_enabled() {
    let host = host_with_settings();
    let source = host.extension("blog").write();
    extman(&host)
        .arg("install")
        .arg(&source)
        .arg("--enable")
        .assert()
        .success();

    extman(&host)
        .args(["uninstall", "blog"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Uninstalled 'blog'"));
    host.assert_file_exists("content/extensions/uninstall.json");

    extman(&host)
        .arg("install")
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("(enabled)"));
}

#[test]
fn test_uninstall_unknown_is_noop() {
    let host = host_with_settings();
    extman(&host)
        .args(["uninstall", "ghost"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to uninstall"));
}

// ============================================================================
// Move / load-order / check
// ============================================================================

#[test]
fn test_move_and_load_order() {
    let host = host_with_settings();
    for name in ["a", "b", "c"] {
        let source = host.extension(name).write();
        extman(&host)
            .arg("install")
            .arg(&source)
            .arg("--enable")
            .assert()
            .success();
    }

    extman(&host)
        .args(["move", "a", "--at", "99"])
        .assert()
        .success()
        .stdout(predicate::str::contains("from position 0 to 2"));

    let output = extman(&host).args(["load-order", "--json"]).output().unwrap();
    let names: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(names, vec!["b", "c", "a"]);
}

#[test]
fn test_check_reports_problems() {
    let host = host_with_settings();
    host.write_registry(&serde_json::json!({
        "extensions": [{
            "name": "admin",
            "version": "1.0.0",
            "hostCompatibility": "1.0.0",
            "installed": true,
            "enabled": true,
            "date": "2024-01-01T00:00:00Z",
            "config": {"dependencies": [{"name": "auth"}]}
        }]
    }));

    extman(&host)
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("depends on 'auth'"))
        .stderr(predicate::str::contains("1 problem"));
}

#[test]
fn test_check_valid_registry() {
    let host = host_with_settings();
    let source = host.extension("blog").write();
    extman(&host).arg("install").arg(&source).assert().success();

    extman(&host)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("Registry is valid"));
}
