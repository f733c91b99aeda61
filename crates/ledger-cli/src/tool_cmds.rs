//! CLI handlers for `ledger tool` subcommands.

use anyhow::{Context, Result};
use serde_json::Value;

use ledger_core::{LedgerService, ToolRegistry};

use crate::ToolCommands;

pub async fn run_tool_command(command: ToolCommands, service: &LedgerService) -> Result<()> {
    let registry = ToolRegistry::with_ledger_tools(service);
    match command {
        ToolCommands::List { json } => cmd_list(&registry, json),
        ToolCommands::Call { name, args } => cmd_call(&registry, &name, &args).await,
    }
}

fn cmd_list(registry: &ToolRegistry, json: bool) -> Result<()> {
    let specs = registry.specs();
    if json {
        println!("{}", serde_json::to_string_pretty(&specs)?);
        return Ok(());
    }

    let name_w = specs.iter().map(|s| s.name.len()).max().unwrap_or(4).max(4);
    println!("{:<name_w$}  DESCRIPTION", "NAME");
    for spec in &specs {
        println!("{:<name_w$}  {}", spec.name, spec.description);
    }
    Ok(())
}

async fn cmd_call(registry: &ToolRegistry, name: &str, raw_args: &str) -> Result<()> {
    let args: Value = serde_json::from_str(raw_args)
        .with_context(|| format!("--args is not valid JSON: {raw_args}"))?;
    let output = registry.call(name, args).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
