//! End-to-end lifecycle scenarios against a temporary host.

use extman_registry::{
    Candidate, Dependency, Error, ExtensionManager, InstallOptions, Placement, UninstallOptions,
};
use extman_test_utils::TestHost;
use pretty_assertions::assert_eq;
use serde_json::json;

fn manager(host: &TestHost) -> ExtensionManager {
    ExtensionManager::new(host.layout(), semver::Version::new(2, 0, 0))
}

fn enabled() -> InstallOptions {
    InstallOptions {
        enable: true,
        ..InstallOptions::default()
    }
}

fn ext(name: &str) -> Candidate {
    Candidate::new(name, "1.0.0", "1.0.0")
}

#[test]
fn test_chain_installs_in_order() {
    let host = TestHost::new();
    let manager = manager(&host);

    manager.install(ext("a"), &enabled()).unwrap();
    manager
        .install(ext("b").with_dependency(Dependency::required("a")), &enabled())
        .unwrap();
    manager
        .install(ext("c").with_dependency(Dependency::required("b")), &enabled())
        .unwrap();

    assert_eq!(host.registry_names(), vec!["a", "b", "c"]);
    assert!(manager.audit().unwrap().is_valid());
}

#[test]
fn test_missing_dependency_leaves_file_unchanged() {
    let host = TestHost::new();
    let manager = manager(&host);
    manager.install(ext("a"), &InstallOptions::default()).unwrap();
    let before = host.read_registry_text();

    let err = manager
        .install(
            ext("d").with_dependency(Dependency::required("e")),
            &InstallOptions::default(),
        )
        .unwrap_err();

    assert!(
        matches!(&err, Error::MissingDependency { extension, dependency } if extension == "d" && dependency == "e"),
        "got: {err:?}"
    );
    assert_eq!(host.read_registry_text(), before);
}

#[test]
fn test_dependent_listed_first_is_repaired() {
    let host = TestHost::new();
    host.write_registry(&json!({
        "extensions": [
            {
                "name": "b",
                "version": "1.0.0",
                "hostCompatibility": "1.0.0",
                "installed": true,
                "enabled": false,
                "date": "2024-01-01T00:00:00Z",
                "config": {"dependencies": [{"name": "a"}]}
            },
            {
                "name": "a",
                "version": "1.0.0",
                "hostCompatibility": "1.0.0",
                "installed": true,
                "enabled": false,
                "date": "2024-01-01T00:00:00Z",
                "config": {}
            }
        ]
    }));
    let manager = manager(&host);

    let outcome = manager.install(ext("z"), &InstallOptions::default()).unwrap();

    assert_eq!(outcome.registry.names(), vec!["a", "b", "z"]);
    assert!(outcome.message.contains("load order repaired"));
    assert_eq!(host.registry_names(), vec!["a", "b", "z"]);
}

#[test]
fn test_reinstall_recovers_enabled_from_uninstall_log() {
    let host = TestHost::new();
    let manager = manager(&host);
    manager.install(ext("a"), &enabled()).unwrap();

    manager.uninstall("a").unwrap();
    assert!(host.registry_names().is_empty());
    assert!(manager.store().load_uninstall_log().unwrap().was_enabled("a"));

    let outcome = manager.install(ext("a"), &InstallOptions::default()).unwrap();
    assert!(outcome.registry.get("a").unwrap().enabled);
}

#[test]
fn test_reinstall_after_disabled_uninstall_stays_disabled() {
    let host = TestHost::new();
    let manager = manager(&host);
    manager.install(ext("a"), &enabled()).unwrap();
    manager.disable("a").unwrap();
    manager.uninstall("a").unwrap();

    let outcome = manager.install(ext("a"), &InstallOptions::default()).unwrap();
    assert!(!outcome.registry.get("a").unwrap().enabled);
}

#[test]
fn test_enable_is_atomic() {
    let host = TestHost::new();
    let manager = manager(&host);
    manager.install(ext("a"), &InstallOptions::default()).unwrap();
    manager
        .install(
            ext("b").with_dependency(Dependency::required("a")),
            &InstallOptions::default(),
        )
        .unwrap();
    let before = host.read_registry_text();

    let err = manager.enable("b").unwrap_err();
    assert!(matches!(err, Error::UnsatisfiedDependencies { count: 1, .. }));
    assert_eq!(host.read_registry_text(), before);
}

#[test]
fn test_move_idempotent() {
    let host = TestHost::new();
    let manager = manager(&host);
    for name in ["a", "b", "c"] {
        manager.install(ext(name), &InstallOptions::default()).unwrap();
    }

    let placement = Placement::After("c".to_string());
    let first = manager.move_extension("a", &placement).unwrap();
    assert_eq!(first.registry.names(), vec!["b", "c", "a"]);

    let persisted = host.read_registry_text();
    let second = manager.move_extension("a", &placement).unwrap();
    assert_eq!(second.registry.names(), vec!["b", "c", "a"]);
    assert!(second.message.contains("already"));
    assert_eq!(host.read_registry_text(), persisted);
}

#[test]
fn test_move_at_index_clamps() {
    let host = TestHost::new();
    let manager = manager(&host);
    for name in ["a", "b", "c"] {
        manager.install(ext(name), &InstallOptions::default()).unwrap();
    }

    let outcome = manager.move_extension("a", &Placement::AtIndex(99)).unwrap();
    assert_eq!(outcome.registry.names(), vec!["b", "c", "a"]);
    assert_eq!(host.registry_names(), vec!["b", "c", "a"]);
}

#[test]
fn test_move_unknown_rejected() {
    let host = TestHost::new();
    let manager = manager(&host);
    manager.install(ext("a"), &InstallOptions::default()).unwrap();

    let err = manager
        .move_extension("a", &Placement::Before("ghost".to_string()))
        .unwrap_err();
    assert!(matches!(err, Error::NotInRegistry(name) if name == "ghost"));
}

#[test]
fn test_mutual_dependencies_rejected() {
    let host = TestHost::new();
    let manager = manager(&host);
    manager
        .install(
            ext("a").with_dependency(Dependency::optional("b")),
            &InstallOptions::default(),
        )
        .unwrap();
    let before = host.read_registry_text();

    let err = manager
        .install(
            ext("b").with_dependency(Dependency::required("a")),
            &InstallOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::DependencyCycle { .. }), "got: {err:?}");
    assert_eq!(host.read_registry_text(), before);
}

#[test]
fn test_install_from_dir_stages_assets() {
    let host = TestHost::new();
    let source = host
        .extension("gallery")
        .version("0.3.0")
        .public_file("css/site.css", "body {}")
        .config_file("settings.json", "{}")
        .write();
    let manager = manager(&host);

    let outcome = manager.install_from_dir(&source, &enabled()).unwrap();

    assert_eq!(outcome.registry.get("gallery").unwrap().version, "0.3.0");
    host.assert_file_exists("public/extensions/gallery/css/site.css");
    host.assert_file_exists("content/config/extensions/gallery/settings.json");

    manager
        .uninstall_with(
            "gallery",
            &UninstallOptions {
                remove_public: true,
                remove_config: false,
            },
        )
        .unwrap();
    host.assert_file_not_exists("public/extensions/gallery");
    host.assert_file_exists("content/config/extensions/gallery/settings.json");
}

#[test]
fn test_install_from_dir_without_host_compatibility() {
    let host = TestHost::new();
    let source = host.extension("old").host_compat(None).write();

    let err = manager(&host)
        .install_from_dir(&source, &InstallOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidExtensionMetadata { .. }));
    host.assert_file_not_exists("content/extensions/extensions.json");
}

#[test]
fn test_install_from_dir_missing_descriptor() {
    let host = TestHost::new();
    let source = host.extension("x").write();
    std::fs::remove_file(source.join("package.json")).unwrap();

    let err = manager(&host)
        .install_from_dir(&source, &InstallOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::DescriptorNotFound(_)));
}

#[test]
fn test_skip_registry_update_only_stages() {
    let host = TestHost::new();
    let source = host
        .extension("theme")
        .public_file("logo.svg", "<svg/>")
        .write();
    let manager = manager(&host).with_skip_registry_update(true);

    let outcome = manager
        .install_from_dir(&source, &InstallOptions::default())
        .unwrap();

    assert!(outcome.registry.is_empty());
    host.assert_file_exists("public/extensions/theme/logo.svg");
    host.assert_file_not_exists("content/extensions/extensions.json");
}

#[test]
fn test_dependency_version_range_enforced() {
    let host = TestHost::new();
    let manager = manager(&host);
    manager.install(ext("a"), &InstallOptions::default()).unwrap();

    let err = manager
        .install(
            ext("b").with_dependency(Dependency::required("a").with_range("^2.0")),
            &InstallOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::IncompatibleDependencyVersion { .. }));

    manager
        .install(
            ext("b").with_dependency(Dependency::required("a").with_range(">=1.0, <2")),
            &InstallOptions::default(),
        )
        .unwrap();
}

#[test]
fn test_incompatible_host_only_fatal_when_enabled() {
    let host = TestHost::new();
    let manager = manager(&host);
    let future = Candidate::new("future", "1.0.0", "9.0.0");

    manager
        .install(future.clone(), &InstallOptions::default())
        .unwrap();
    let audit = manager.audit().unwrap();
    assert!(audit.is_valid());
    assert_eq!(audit.warnings.len(), 1);

    let err = manager.install(future, &enabled()).unwrap_err();
    assert!(matches!(err, Error::IncompatibleHost { .. }));
}

#[test]
fn test_npm_style_range_accepted() {
    let host = TestHost::new();
    let manager = manager(&host);
    manager
        .install(Candidate::new("a", "1.5.0", "1.0.0"), &InstallOptions::default())
        .unwrap();

    for range in [">=1.0.0 <2.0.0", "1.x || 2.x", "1.0.0 - 2.0.0", "1.5"] {
        manager
            .install(
                ext("b").with_dependency(Dependency::required("a").with_range(range)),
                &InstallOptions::default(),
            )
            .unwrap_or_else(|e| panic!("{range}: {e}"));
    }
}

#[test]
fn test_unparsable_range_rejected_as_metadata() {
    let host = TestHost::new();
    let manager = manager(&host);
    manager.install(ext("a"), &InstallOptions::default()).unwrap();
    let before = host.read_registry_text();

    let err = manager
        .install(
            ext("b").with_dependency(Dependency::required("a").with_range(">=one.two")),
            &InstallOptions::default(),
        )
        .unwrap_err();
    assert!(
        matches!(&err, Error::InvalidExtensionMetadata { name, .. } if name == "b"),
        "got: {err:?}"
    );
    assert_eq!(host.read_registry_text(), before);
}

#[test]
fn test_forced_enable_requires_enabled_dependencies() {
    let host = TestHost::new();
    let manager = manager(&host);
    manager.install(ext("a"), &InstallOptions::default()).unwrap();
    let before = host.read_registry_text();

    let err = manager
        .install(ext("b").with_dependency(Dependency::required("a")), &enabled())
        .unwrap_err();

    assert!(
        matches!(&err, Error::UnsatisfiedDependencies { name, missing, .. } if name == "b" && missing == &vec!["a".to_string()]),
        "got: {err:?}"
    );
    assert_eq!(host.read_registry_text(), before);
}

#[test]
fn test_enable_on_install_holds_back_unsatisfied() {
    let host = TestHost::new();
    let plain = manager(&host);
    plain.install(ext("a"), &InstallOptions::default()).unwrap();

    let outcome = manager(&host)
        .with_enable_on_install(true)
        .install(
            ext("b").with_dependency(Dependency::required("a")),
            &InstallOptions::default(),
        )
        .unwrap();

    assert!(!outcome.registry.get("b").unwrap().enabled);
    assert!(outcome.message.contains("left disabled until a enabled"));
    assert!(manager(&host).audit().unwrap().is_valid());
}

#[test]
fn test_restored_enabled_flag_holds_back_unsatisfied() {
    let host = TestHost::new();
    let manager = manager(&host);
    manager.install(ext("a"), &enabled()).unwrap();
    let b = ext("b").with_dependency(Dependency::required("a"));
    manager.install(b.clone(), &enabled()).unwrap();

    manager.uninstall("b").unwrap();
    manager.disable("a").unwrap();

    let outcome = manager.install(b, &InstallOptions::default()).unwrap();
    assert!(!outcome.registry.get("a").unwrap().enabled);
    assert!(!outcome.registry.get("b").unwrap().enabled);
    assert!(outcome.message.contains("(disabled)"));
}
