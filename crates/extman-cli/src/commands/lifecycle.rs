//! Mutating commands: install, uninstall, enable, disable, move
//!
//! Each command holds the install lock for its whole read-modify-write.

use std::path::Path;

use colored::Colorize;
use extman_registry::{ExtensionManager, InstallOptions, Outcome, Placement, UninstallOptions};

use crate::cli::{PlacementArgs, RequiredPlacementArgs};
use crate::context::HostContext;
use crate::error::{CliError, Result};

/// Run the install command
pub fn run_install(
    context: &HostContext,
    source: &Path,
    enable: bool,
    placement: &PlacementArgs,
) -> Result<()> {
    if !source.is_dir() {
        return Err(CliError::user(format!(
            "extension source '{}' is not a directory",
            source.display()
        )));
    }
    let options = InstallOptions {
        enable,
        placement: placement_from(
            placement.before.as_deref(),
            placement.after.as_deref(),
            placement.at,
        ),
    };
    locked(context, |manager| {
        Ok(manager.install_from_dir(source, &options)?)
    })
}

/// Run the uninstall command
pub fn run_uninstall(
    context: &HostContext,
    name: &str,
    remove_public: bool,
    remove_config: bool,
) -> Result<()> {
    let options = UninstallOptions {
        remove_public,
        remove_config,
    };
    locked(context, |manager| Ok(manager.uninstall_with(name, &options)?))
}

/// Run the enable command
pub fn run_enable(context: &HostContext, name: &str) -> Result<()> {
    locked(context, |manager| Ok(manager.enable(name)?))
}

/// Run the disable command
pub fn run_disable(context: &HostContext, name: &str) -> Result<()> {
    locked(context, |manager| Ok(manager.disable(name)?))
}

/// Run the move command
pub fn run_move(context: &HostContext, name: &str, placement: &RequiredPlacementArgs) -> Result<()> {
    let placement = placement_from(
        placement.before.as_deref(),
        placement.after.as_deref(),
        placement.at,
    )
    .ok_or_else(|| CliError::user("one of --before, --after or --at is required"))?;
    locked(context, |manager| {
        Ok(manager.move_extension(name, &placement)?)
    })
}

fn locked(
    context: &HostContext,
    operation: impl FnOnce(&ExtensionManager) -> Result<Outcome>,
) -> Result<()> {
    let manager = context.manager()?;
    let _lock = manager.store().lock()?;
    let outcome = operation(&manager)?;
    println!("{} {}", "OK".green().bold(), outcome.message);
    Ok(())
}

fn placement_from(before: Option<&str>, after: Option<&str>, at: Option<usize>) -> Option<Placement> {
    match (before, after, at) {
        (Some(other), _, _) => Some(Placement::Before(other.to_string())),
        (_, Some(other), _) => Some(Placement::After(other.to_string())),
        (_, _, Some(index)) => Some(Placement::AtIndex(index)),
        _ => None,
    }
}
