use std::path::PathBuf;

/// Boxed error returned by host-supplied extension initializers.
pub type InitError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur in the extension registry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The registry document does not exist.
    #[error("extension registry not found at {path}")]
    ConfigMissing { path: PathBuf },

    /// The registry document is not valid JSON or has the wrong shape.
    #[error("extension registry at {path} is corrupt: {reason}")]
    ConfigCorrupt { path: PathBuf, reason: String },

    /// A record is missing required fields or carries unparsable versions.
    #[error("malformed extension record at index {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    /// Candidate metadata has an empty name or an invalid semantic version.
    #[error("invalid extension metadata for '{name}': {reason}")]
    InvalidExtensionMetadata { name: String, reason: String },

    /// An enabled extension requires a newer host.
    #[error("extension '{name}' requires host version {required}, running {host}")]
    IncompatibleHost {
        name: String,
        required: String,
        host: semver::Version,
    },

    /// A non-optional dependency is not in the registry.
    #[error("extension '{extension}' depends on '{dependency}', which is not installed")]
    MissingDependency {
        extension: String,
        dependency: String,
    },

    /// A non-optional dependency is loaded at or after its dependent.
    #[error("extension '{extension}' is ordered before its dependency '{dependency}'")]
    OutOfOrderDependency {
        extension: String,
        dependency: String,
    },

    /// The installed dependency does not satisfy the declared range.
    #[error(
        "extension '{extension}' requires '{dependency}' {required}, but {installed} is installed"
    )]
    IncompatibleDependencyVersion {
        extension: String,
        dependency: String,
        required: String,
        installed: String,
    },

    /// Extensions depend on each other in a loop.
    #[error("dependency cycle between: {}", participants.join(", "))]
    DependencyCycle { participants: Vec<String> },

    /// Enable refused because dependencies are not enabled.
    #[error("cannot enable '{name}': missing {count} enabled extension(s): {}", missing.join(", "))]
    UnsatisfiedDependencies {
        name: String,
        count: usize,
        missing: Vec<String>,
    },

    /// The named extension is not in the registry.
    #[error("extension '{0}' is not in the registry")]
    NotInRegistry(String),

    /// Writing a registry document failed; nothing was committed.
    #[error("failed to persist {path}: {source}")]
    PersistError {
        path: PathBuf,
        #[source]
        source: extman_fs::Error,
    },

    /// Invalid version range string.
    #[error("invalid version constraint '{constraint}': {reason}")]
    VersionConstraintParse { constraint: String, reason: String },

    /// Package or extension descriptor missing from an extension source.
    #[error("extension descriptor not found: {0}")]
    DescriptorNotFound(PathBuf),

    /// An enabled extension has no registered initializer.
    #[error("no initializer registered for enabled extension '{0}'")]
    MissingInitializer(String),

    /// A registered initializer returned an error.
    #[error("initializer for extension '{name}' failed: {source}")]
    InitializerFailed {
        name: String,
        #[source]
        source: InitError,
    },

    /// Host settings are unusable.
    #[error("invalid host settings: {0}")]
    InvalidSettings(String),

    /// Filesystem error from extman-fs.
    #[error(transparent)]
    Fs(#[from] extman_fs::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
