//! [`TestHost`] builder for extension manager test scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use extman_fs::HostLayout;
use serde_json::{Value, json};
use tempfile::TempDir;

/// A temporary host root with helpers for writing extension sources and
/// inspecting the registry document.
///
/// # Example
///
/// ```rust,no_run
/// use extman_test_utils::TestHost;
///
/// let host = TestHost::new();
/// let source = host.extension("blog").version("1.2.0").dep("core").write();
/// host.write_settings("host_version = \"2.0.0\"\n");
/// assert!(source.join("package.json").exists());
/// ```
pub struct TestHost {
    temp_dir: TempDir,
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHost {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("TestHost::new: failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Layout with the default locations under this root.
    pub fn layout(&self) -> HostLayout {
        HostLayout::new(self.root())
    }

    /// Start describing an extension source directory under `sources/`.
    pub fn extension(&self, name: &str) -> ExtensionFixture<'_> {
        ExtensionFixture {
            host: self,
            name: name.to_string(),
            version: "1.0.0".to_string(),
            host_compatibility: Some("1.0.0".to_string()),
            dependencies: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Write `extman.toml`.
    pub fn write_settings(&self, content: &str) {
        fs::write(self.root().join("extman.toml"), content)
            .expect("TestHost::write_settings: write failed");
    }

    /// Overwrite the registry document with `document`.
    pub fn write_registry(&self, document: &Value) {
        let path = self.layout().registry_path().to_native();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("TestHost::write_registry: mkdir failed");
        }
        let text = serde_json::to_string_pretty(document).expect("serialize registry");
        fs::write(&path, text).expect("TestHost::write_registry: write failed");
    }

    /// Raw text of the registry document.
    pub fn read_registry_text(&self) -> String {
        let path = self.layout().registry_path().to_native();
        fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read registry: {}", path.display()))
    }

    pub fn read_registry_json(&self) -> Value {
        serde_json::from_str(&self.read_registry_text()).expect("registry is not JSON")
    }

    /// Extension names in persisted order.
    pub fn registry_names(&self) -> Vec<String> {
        self.read_registry_json()["extensions"]
            .as_array()
            .expect("'extensions' is not an array")
            .iter()
            .map(|r| r["name"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    /// Assert that `path` (relative to the host root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the host root) does **not** exist.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }
}

/// Builder for one extension source directory.
pub struct ExtensionFixture<'a> {
    host: &'a TestHost,
    name: String,
    version: String,
    host_compatibility: Option<String>,
    dependencies: Vec<Value>,
    files: Vec<(String, String)>,
}

impl ExtensionFixture<'_> {
    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    /// Minimum host version. `None` omits the key.
    pub fn host_compat(mut self, version: Option<&str>) -> Self {
        self.host_compatibility = version.map(str::to_string);
        self
    }

    pub fn dep(mut self, name: &str) -> Self {
        self.dependencies.push(json!({"name": name}));
        self
    }

    pub fn dep_range(mut self, name: &str, range: &str) -> Self {
        self.dependencies
            .push(json!({"name": name, "versionRange": range}));
        self
    }

    pub fn optional_dep(mut self, name: &str) -> Self {
        self.dependencies
            .push(json!({"name": name, "optional": true}));
        self
    }

    /// Add a file under `public/`.
    pub fn public_file(mut self, relative: &str, content: &str) -> Self {
        self.files
            .push((format!("public/{relative}"), content.to_string()));
        self
    }

    /// Add a file under `config/`.
    pub fn config_file(mut self, relative: &str, content: &str) -> Self {
        self.files
            .push((format!("config/{relative}"), content.to_string()));
        self
    }

    /// Write the source directory and return its path.
    pub fn write(self) -> PathBuf {
        let dir = self.host.root().join("sources").join(&self.name);
        fs::create_dir_all(&dir).expect("ExtensionFixture::write: mkdir failed");

        let package = json!({"name": self.name, "version": self.version});
        fs::write(dir.join("package.json"), package.to_string())
            .expect("ExtensionFixture::write: package.json");

        let mut extension = json!({"dependencies": self.dependencies});
        if let Some(compat) = &self.host_compatibility {
            extension["hostCompatibility"] = json!(compat);
        }
        fs::write(dir.join("extension.json"), extension.to_string())
            .expect("ExtensionFixture::write: extension.json");

        for (relative, content) in &self.files {
            let path = dir.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("ExtensionFixture::write: mkdir failed");
            }
            fs::write(&path, content).expect("ExtensionFixture::write: asset");
        }

        dir
    }
}
