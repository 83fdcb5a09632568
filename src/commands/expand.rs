//! @acp:module "Expand Command"
//! @acp:summary "Expand variable references in text"
//! @acp:domain engine
//! @acp:layer handler

use std::path::PathBuf;

use anyhow::Result;
use console::style;

use crate::config::Config;
use crate::document::FsDocuments;
use crate::vars::{VarRegistry, VarResolver};

/// Options for the expand command
#[derive(Debug, Clone)]
pub struct ExpandOptions {
    /// Text to expand (reads from stdin if None)
    pub text: Option<String>,
    /// Project root holding declaration sources
    pub root: PathBuf,
}

/// Execute the expand command
pub fn execute_expand(options: ExpandOptions, config: &Config) -> Result<()> {
    let docs = FsDocuments::scan(&options.root, config)?;
    if docs.is_empty() {
        eprintln!(
            "{} No declaration sources found under {}",
            style("⚠").yellow(),
            options.root.display()
        );
    }

    let mut registry = VarRegistry::with_policy(config.vars.duplicate_policy);
    registry.refresh(&docs);

    let input = match options.text {
        Some(t) => t,
        None => {
            use std::io::Read;
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let resolver = VarResolver::new(&registry);
    println!("{}", resolver.expand_all(&input));

    Ok(())
}
