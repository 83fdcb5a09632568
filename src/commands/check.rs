//! @acp:module "Check Command"
//! @acp:summary "Project-wide annotation diagnostics sweep"
//! @acp:domain engine
//! @acp:layer handler

use std::path::{Path, PathBuf};

use anyhow::Result;
use console::style;
use glob::{MatchOptions, Pattern};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::comments::detect_language_id;
use crate::config::Config;
use crate::document::offset_to_position;
use crate::parse::{parse_annotations, Diagnostic, Severity};

/// Options for the check command
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Root directory to check
    pub root: PathBuf,
}

struct FileReport {
    path: String,
    text: String,
    diagnostics: Vec<Diagnostic>,
    annotations: usize,
}

/// Execute the check command
pub fn execute_check(options: CheckOptions, config: &Config) -> Result<()> {
    let files = discover_files(&options.root, config)?;
    if files.is_empty() {
        println!("{} No source files matched", style("•").dim());
        return Ok(());
    }

    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=> "),
    );

    let max_bytes = config.limits.max_file_size_mb * 1024 * 1024;

    let mut reports: Vec<FileReport> = files
        .par_iter()
        .filter_map(|path| {
            bar.inc(1);
            let language_id = detect_language_id(path)?;
            let text = std::fs::read_to_string(path).ok()?;
            if text.len() > max_bytes {
                tracing::warn!("Skipping oversized file {}", path.display());
                return None;
            }
            let outcome = parse_annotations(language_id, &text);
            if outcome.annotations.is_empty() {
                return None;
            }
            if outcome.annotations.len() > config.limits.max_annotations_per_file {
                tracing::warn!(
                    "{} exceeds the annotation limit ({} > {})",
                    path.display(),
                    outcome.annotations.len(),
                    config.limits.max_annotations_per_file
                );
            }
            Some(FileReport {
                path: path.display().to_string(),
                text,
                diagnostics: outcome.diagnostics,
                annotations: outcome.annotations.len(),
            })
        })
        .collect();
    bar.finish_and_clear();

    reports.sort_by(|a, b| a.path.cmp(&b.path));

    let mut errors = 0;
    let mut warnings = 0;
    let total_annotations: usize = reports.iter().map(|r| r.annotations).sum();

    for report in &reports {
        if report.diagnostics.is_empty() {
            continue;
        }
        println!("{}", style(&report.path).bold());
        for diag in &report.diagnostics {
            let pos = offset_to_position(&report.text, diag.range.start);
            let glyph = match diag.severity {
                Severity::Error => {
                    errors += 1;
                    style("✗").red()
                }
                Severity::Warning => {
                    warnings += 1;
                    style("⚠").yellow()
                }
            };
            println!("  {} {}:{} {}", glyph, pos.line + 1, pos.column + 1, diag.message);
        }
    }

    println!(
        "\n{} {} files, {} annotations, {} errors, {} warnings",
        if errors > 0 {
            style("✗").red()
        } else {
            style("✓").green()
        },
        reports.len(),
        total_annotations,
        errors,
        warnings
    );

    Ok(())
}

/// Discover source files matching the config's include/exclude globs
fn discover_files(root: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    let include: Vec<Pattern> = config
        .include
        .iter()
        .map(|p| Pattern::new(p))
        .collect::<std::result::Result<_, _>>()?;
    let exclude: Vec<Pattern> = config
        .exclude
        .iter()
        .map(|p| Pattern::new(p))
        .collect::<std::result::Result<_, _>>()?;

    let match_opts = MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    let files = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let relative = e
                .path()
                .strip_prefix(root)
                .unwrap_or(e.path())
                .to_string_lossy()
                .replace('\\', "/");

            let included = include.is_empty()
                || include.iter().any(|p| p.matches_with(&relative, match_opts));
            let excluded = exclude.iter().any(|p| p.matches_with(&relative, match_opts));

            if included && !excluded {
                Some(e.path().to_path_buf())
            } else {
                None
            }
        })
        .collect();

    Ok(files)
}
