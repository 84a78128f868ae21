//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// extman - manage the extensions of a host application
#[derive(Parser, Debug)]
#[command(name = "extman")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Host root directory (defaults to the current directory)
    #[arg(long, global = true, env = "EXTMAN_ROOT")]
    pub root: Option<PathBuf>,

    /// Host version, overriding extman.toml and EXTMAN_HOST_VERSION
    #[arg(long, global = true)]
    pub host_version: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List installed extensions in load order
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Validate the registry against the host version
    Check,

    /// Install or update an extension from an unpacked directory
    ///
    /// Examples:
    ///   extman install ./vendor/blog
    ///   extman install ./vendor/blog --enable
    ///   extman install ./vendor/blog --before gallery
    Install {
        /// Directory containing package.json and extension.json
        source: PathBuf,

        /// Enable the extension after installing
        #[arg(long)]
        enable: bool,

        #[command(flatten)]
        placement: PlacementArgs,
    },

    /// Remove an extension, remembering whether it was enabled
    Uninstall {
        /// Name of the extension
        name: String,

        /// Also remove the staged public assets
        #[arg(long)]
        remove_public: bool,

        /// Also remove the staged configuration templates
        #[arg(long)]
        remove_config: bool,
    },

    /// Enable an installed extension
    Enable {
        /// Name of the extension
        name: String,
    },

    /// Disable an extension
    Disable {
        /// Name of the extension
        name: String,
    },

    /// Move an extension within the load order
    ///
    /// Examples:
    ///   extman move blog --after auth
    ///   extman move blog --at 0
    Move {
        /// Name of the extension
        name: String,

        #[command(flatten)]
        placement: RequiredPlacementArgs,
    },

    /// Show the extensions the host will initialize, in order
    LoadOrder {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}

/// Optional reposition after install
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
#[group(required = false, multiple = false)]
pub struct PlacementArgs {
    /// Place immediately before this extension
    #[arg(long, value_name = "NAME")]
    pub before: Option<String>,

    /// Place immediately after this extension
    #[arg(long, value_name = "NAME")]
    pub after: Option<String>,

    /// Place at this index
    #[arg(long, value_name = "INDEX")]
    pub at: Option<usize>,
}

/// Mandatory reposition target
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
#[group(required = true, multiple = false)]
pub struct RequiredPlacementArgs {
    /// Place immediately before this extension
    #[arg(long, value_name = "NAME")]
    pub before: Option<String>,

    /// Place immediately after this extension
    #[arg(long, value_name = "NAME")]
    pub after: Option<String>,

    /// Place at this index
    #[arg(long, value_name = "INDEX")]
    pub at: Option<usize>,
}
