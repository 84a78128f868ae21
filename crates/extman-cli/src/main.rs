//! extman CLI
//!
//! Installs, enables, disables, orders and removes the extensions of a host
//! application.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use context::HostContext;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = std::env::current_dir()?;
    let context = HostContext::resolve(cli.root.as_deref(), &cwd, cli.host_version.as_deref())?;
    execute_command(&context, cli.command)
}

/// `RUST_LOG` wins; otherwise warnings, or debug with `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
}

fn execute_command(context: &HostContext, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::List { json } => commands::run_list(context, json),
        Commands::Check => commands::run_check(context),
        Commands::Install {
            source,
            enable,
            placement,
        } => commands::run_install(context, &source, enable, &placement),
        Commands::Uninstall {
            name,
            remove_public,
            remove_config,
        } => commands::run_uninstall(context, &name, remove_public, remove_config),
        Commands::Enable { name } => commands::run_enable(context, &name),
        Commands::Disable { name } => commands::run_disable(context, &name),
        Commands::Move { name, placement } => commands::run_move(context, &name, &placement),
        Commands::LoadOrder { json } => commands::run_load_order(context, json),
    }
}
