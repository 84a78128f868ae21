//! Read-only commands: list, check, load-order

use colored::Colorize;
use extman_registry::{RegistryStore, load_plan};

use crate::context::HostContext;
use crate::error::{CliError, Result};

/// Run the list command
pub fn run_list(context: &HostContext, json: bool) -> Result<()> {
    let store = RegistryStore::from_layout(&context.settings.layout(&context.root));
    let registry = store.load_or_default()?;

    if json {
        println!("{}", serde_json::to_string_pretty(registry.records())?);
        return Ok(());
    }

    if registry.is_empty() {
        println!("No extensions installed.");
        return Ok(());
    }

    println!("{}", "Installed Extensions".bold());
    println!();
    for (index, record) in registry.iter().enumerate() {
        let state = if record.enabled {
            "enabled".green()
        } else {
            "disabled".dimmed()
        };
        println!(
            "  {:>3}  {:<32} {:<12} {}",
            index,
            record.name.cyan(),
            record.version,
            state
        );
    }
    println!();
    println!("{} {}", "Total:".dimmed(), registry.len());
    Ok(())
}

/// Run the check command
pub fn run_check(context: &HostContext) -> Result<()> {
    let report = context.manager()?.audit()?;

    for warning in &report.warnings {
        println!("{} {}", "warning:".yellow().bold(), warning);
    }
    for error in &report.errors {
        println!("{} {}", "problem:".red().bold(), error);
    }

    if !report.is_valid() {
        return Err(CliError::user(format!(
            "registry has {} problem(s)",
            report.errors.len()
        )));
    }

    println!("{} Registry is valid", "OK".green().bold());
    Ok(())
}

/// Run the load-order command
pub fn run_load_order(context: &HostContext, json: bool) -> Result<()> {
    let manager = context.manager()?;
    let registry = manager.store().load_or_default()?;
    let plan = load_plan(&registry, manager.host_version())?;
    let names: Vec<&str> = plan.iter().map(|r| r.name.as_str()).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
        return Ok(());
    }

    for (position, name) in names.iter().enumerate() {
        println!("{:>3}. {}", position + 1, name);
    }
    if names.is_empty() {
        println!("No extensions will be loaded.");
    }
    Ok(())
}
