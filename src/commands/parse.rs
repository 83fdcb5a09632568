//! @acp:module "Parse Command"
//! @acp:summary "Parse annotations in a single file"
//! @acp:domain engine
//! @acp:layer handler

use std::path::PathBuf;

use anyhow::{bail, Result};
use console::style;

use crate::comments::detect_language_id;
use crate::document::offset_to_position;
use crate::parse::{parse_annotations, Severity};

/// Options for the parse command
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// File to parse
    pub file: PathBuf,
    /// Output as JSON (default: human-readable)
    pub json: bool,
}

/// Execute the parse command
pub fn execute_parse(options: ParseOptions) -> Result<()> {
    let Some(language_id) = detect_language_id(&options.file) else {
        bail!("Unsupported file type: {}", options.file.display());
    };

    let text = std::fs::read_to_string(&options.file)?;
    let outcome = parse_annotations(language_id, &text);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if outcome.annotations.is_empty() {
        println!("{} No annotations found", style("•").dim());
        return Ok(());
    }

    for ann in &outcome.annotations {
        let pos = offset_to_position(&text, ann.range.start);
        println!(
            "{} {}:{} @acp:{} [{}]",
            style("→").cyan(),
            pos.line + 1,
            pos.column + 1,
            style(&ann.namespace).bold(),
            ann.category
        );
        if let Some(value) = &ann.value {
            println!("    value: {}", value);
        }
        if let Some(description) = &ann.description {
            println!("    description: {}", description);
        }
        if !ann.metadata.is_empty() {
            println!("    metadata: {}", ann.metadata.join(", "));
        }
        for var_ref in &ann.variable_refs {
            println!("    ref: {}", style(&var_ref.raw).magenta());
        }
        for diag in &ann.diagnostics {
            let glyph = match diag.severity {
                Severity::Error => style("✗").red(),
                Severity::Warning => style("⚠").yellow(),
            };
            println!("    {} {}", glyph, diag.message);
        }
    }

    let errors = outcome
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warnings = outcome.diagnostics.len() - errors;
    println!(
        "\n{} {} annotations, {} errors, {} warnings",
        style("✓").green(),
        outcome.annotations.len(),
        errors,
        warnings
    );

    Ok(())
}
