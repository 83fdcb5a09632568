//! @acp:module "Vars Command"
//! @acp:summary "List available variables"
//! @acp:domain engine
//! @acp:layer handler

use std::path::PathBuf;

use anyhow::Result;
use console::style;

use crate::config::Config;
use crate::document::FsDocuments;
use crate::vars::VarRegistry;

/// Options for the vars command
#[derive(Debug, Clone)]
pub struct VarsOptions {
    /// Project root holding declaration sources
    pub root: PathBuf,
    /// Output as JSON (default: human-readable)
    pub json: bool,
}

/// Execute the vars command
pub fn execute_vars(options: VarsOptions, config: &Config) -> Result<()> {
    let docs = FsDocuments::scan(&options.root, config)?;
    let mut registry = VarRegistry::with_policy(config.vars.duplicate_policy);
    registry.refresh(&docs);

    let variables = registry.list();

    if options.json {
        println!("{}", serde_json::to_string_pretty(&variables)?);
        return Ok(());
    }

    let width = variables.iter().map(|v| v.name.len()).max().unwrap_or(0);
    for var in &variables {
        println!(
            "  {:width$}  {:8}  {}",
            style(&var.name).cyan(),
            var.var_type.as_str(),
            style(&var.source).dim(),
            width = width
        );
    }
    println!(
        "\n{} {} variables ({} sources)",
        style("✓").green(),
        variables.len(),
        docs.len()
    );

    Ok(())
}
