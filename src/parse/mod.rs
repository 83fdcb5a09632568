//! @acp:module "Parser"
//! @acp:summary "Annotation micro-grammar matching over comment regions"
//! @acp:domain engine
//! @acp:layer service
//!
//! Parses `@acp:` annotations out of comment text into structured records
//! with document-absolute ranges and diagnostics. Grammar:
//!
//! ```text
//! annotation := "@acp:" namespace ( "(" value ")" )? ( "-" description )? ( "|" metadata )*
//! value      := quoted-string | bare-identifier | variable-reference
//! ```
//!
//! The full pattern is attempted at the first sigil in a comment; when it
//! fails, a namespace-only pattern recovers a record for partially written
//! annotations. Regex-based parsing, as in the rest of the protocol tooling.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::comments::{self, CommentKind};
use crate::taxonomy::{self, Category, SemanticIssue, DEFAULT_CATEGORY};
use crate::vars::refs::{extract_refs_at, VarRef};

/// The annotation sigil
pub const SIGIL: &str = "@acp:";

/// Full annotation pattern: namespace, parenthesized value (quoted or bare),
/// optional `- description`, optional `| metadata` segments.
static FULL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"@acp:([A-Za-z][A-Za-z0-9-]*)\(\s*(?:"((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)'|([^)]*?))\s*\)(?:\s*-\s*([^|\n\r]*))?((?:\s*\|[^|\n\r]*)*)"#,
    )
    .unwrap()
});

/// Namespace-only fallback so partially written annotations still produce a
/// record instead of nothing.
static NAMESPACE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@acp:([A-Za-z][A-Za-z0-9-]*)(?:\s*-\s*([^|\n\r]*))?((?:\s*\|[^|\n\r]*)*)")
        .unwrap()
});

/// @acp:summary "Half-open byte range in document coordinates"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// @acp:summary "Diagnostic severity"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// @acp:summary "Diagnostic classification"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    MissingValue,
    UnknownNamespace,
    InvalidLockLevel,
}

/// @acp:summary "A parse or validation problem anchored to a source range"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub range: Range,
}

/// @acp:summary "Parsed annotation record (grammar-compliant)"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Exact matched text; slicing the document at `range` reproduces it
    pub raw: String,
    /// Annotation keyword (e.g. "lock", "purpose", "fn")
    pub namespace: String,
    /// Category of the namespace; unknown namespaces default to symbol-level
    pub category: Category,
    /// Primary value with quotes stripped and escapes resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Free-text directive after ` - `
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `|`-separated metadata segments, trimmed, empties discarded
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<String>,
    /// Document-absolute byte range of `raw`
    pub range: Range,
    /// Source line number (1-indexed)
    pub line: usize,
    /// Variable references found in the raw value text
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variable_refs: Vec<VarRef>,
    /// Problems found while parsing and validating this record
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// @acp:summary "Result of parsing one document"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseOutcome {
    pub annotations: Vec<Annotation>,
    /// Aggregated view of every record's diagnostics
    pub diagnostics: Vec<Diagnostic>,
}

/// @acp:summary "Parse all annotations in a document"
///
/// Deterministic over its inputs: the same document version always yields
/// identical records. Unknown languages yield an empty outcome.
pub fn parse_annotations(language_id: &str, text: &str) -> ParseOutcome {
    let mut annotations = Vec::new();

    for span in comments::extract(language_id, text) {
        match span.kind {
            // A doc comment may carry many annotations, one per line
            CommentKind::Doc => {
                let mut offset = span.content_start;
                for line in span.content.split('\n') {
                    if let Some(ann) = match_segment(line, offset, text) {
                        annotations.push(ann);
                    }
                    offset += line.len() + 1;
                }
            }
            // Line and block comments hold a single annotation
            CommentKind::Line | CommentKind::Block => {
                if let Some(ann) = match_segment(&span.content, span.content_start, text) {
                    annotations.push(ann);
                }
            }
        }
    }

    let diagnostics = annotations
        .iter()
        .flat_map(|a| a.diagnostics.iter().cloned())
        .collect();

    ParseOutcome {
        annotations,
        diagnostics,
    }
}

/// Match the grammar at the first sigil in `segment`. `base` is the
/// document-absolute offset of `segment`'s first byte.
fn match_segment(segment: &str, base: usize, text: &str) -> Option<Annotation> {
    let sigil_idx = segment.find(SIGIL)?;
    let slice = &segment[sigil_idx..];
    let abs = base + sigil_idx;

    if let Some(caps) = FULL_PATTERN.captures(slice) {
        if caps.get(0).unwrap().start() == 0 {
            return Some(build_record(&caps, &FULL_GROUPS, abs, text));
        }
    }

    let caps = NAMESPACE_PATTERN.captures(slice)?;
    if caps.get(0).unwrap().start() != 0 {
        return None;
    }
    Some(build_record(&caps, &NAMESPACE_GROUPS, abs, text))
}

/// Capture-group layout for a pattern: value groups (quoted/bare), then
/// description and metadata group indices.
struct GroupLayout {
    value_groups: &'static [usize],
    description: usize,
    metadata: usize,
}

const FULL_GROUPS: GroupLayout = GroupLayout {
    value_groups: &[2, 3, 4],
    description: 5,
    metadata: 6,
};

const NAMESPACE_GROUPS: GroupLayout = GroupLayout {
    value_groups: &[],
    description: 2,
    metadata: 3,
};

fn build_record(
    caps: &regex::Captures<'_>,
    layout: &GroupLayout,
    abs: usize,
    text: &str,
) -> Annotation {
    let namespace = caps.get(1).unwrap().as_str().to_string();

    let raw = caps.get(0).unwrap().as_str().trim_end().to_string();
    let range = Range::new(abs, abs + raw.len());

    // (unescaped value, raw value slice, absolute value range)
    let value_parts = layout
        .value_groups
        .iter()
        .find_map(|&idx| caps.get(idx))
        .and_then(|m| {
            let trimmed = m.as_str().trim();
            if trimmed.is_empty() {
                None
            } else {
                let vrange = Range::new(abs + m.start(), abs + m.end());
                Some((unescape(trimmed), m.as_str().to_string(), vrange))
            }
        });

    let description = caps
        .get(layout.description)
        .map(|m| m.as_str().trim().to_string())
        .filter(|d| !d.is_empty());

    let metadata: Vec<String> = caps
        .get(layout.metadata)
        .map(|m| {
            m.as_str()
                .split('|')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let category = taxonomy::classify(&namespace).unwrap_or(DEFAULT_CATEGORY);
    let value = value_parts.as_ref().map(|(v, _, _)| v.clone());

    let diagnostics = taxonomy::validate(&namespace, value.as_deref())
        .into_iter()
        .map(|issue| {
            let (severity, kind, issue_range) = match &issue {
                SemanticIssue::UnknownNamespace { .. } => {
                    (Severity::Warning, DiagnosticKind::UnknownNamespace, range)
                }
                SemanticIssue::MissingValue { .. } => {
                    (Severity::Error, DiagnosticKind::MissingValue, range)
                }
                SemanticIssue::InvalidLockLevel { .. } => (
                    Severity::Error,
                    DiagnosticKind::InvalidLockLevel,
                    value_parts.as_ref().map(|(_, _, r)| *r).unwrap_or(range),
                ),
            };
            Diagnostic {
                kind,
                severity,
                message: issue.message(),
                range: issue_range,
            }
        })
        .collect();

    // Scan the raw (pre-unescape) value slice so ref ranges stay absolute
    let variable_refs = value_parts
        .as_ref()
        .map(|(_, raw_value, vrange)| extract_refs_at(raw_value, vrange.start))
        .unwrap_or_default();

    let line = text[..abs].matches('\n').count() + 1;

    Annotation {
        raw,
        namespace,
        category,
        value,
        description,
        metadata,
        range,
        line,
        variable_refs,
        diagnostics,
    }
}

/// Resolve one layer of `\"`, `\'`, `\\` escapes
fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some(next @ ('"' | '\'' | '\\')) => out.push(next),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_one(language_id: &str, text: &str) -> Annotation {
        let outcome = parse_annotations(language_id, text);
        assert_eq!(outcome.annotations.len(), 1, "expected one record");
        outcome.annotations.into_iter().next().unwrap()
    }

    #[test]
    fn test_lock_frozen_round_trip() {
        let ann = parse_one("typescript", "// @acp:lock(\"frozen\")\n");
        assert_eq!(ann.namespace, "lock");
        assert_eq!(ann.value.as_deref(), Some("frozen"));
        assert_eq!(ann.category, Category::Constraint);
        assert!(ann.diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_namespace_defaults_with_warning() {
        let ann = parse_one("typescript", "// @acp:bogus(\"x\")");
        assert_eq!(ann.namespace, "bogus");
        assert_eq!(ann.category, Category::SymbolLevel);
        assert_eq!(ann.diagnostics.len(), 1);
        assert_eq!(ann.diagnostics[0].kind, DiagnosticKind::UnknownNamespace);
        assert_eq!(ann.diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn test_missing_value_flagged_once() {
        let ann = parse_one("typescript", "// @acp:fn");
        assert_eq!(ann.namespace, "fn");
        assert_eq!(ann.value, None);
        let missing: Vec<_> = ann
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::MissingValue)
            .collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].severity, Severity::Error);
    }

    #[test]
    fn test_invalid_lock_level_names_valid_set() {
        let ann = parse_one("typescript", "// @acp:lock(locked)");
        assert_eq!(ann.diagnostics.len(), 1);
        assert_eq!(ann.diagnostics[0].kind, DiagnosticKind::InvalidLockLevel);
        assert!(ann.diagnostics[0].message.contains("frozen"));
    }

    #[test]
    fn test_description_and_metadata() {
        let ann = parse_one(
            "typescript",
            "// @acp:purpose(\"auth\") - Handles login flow | owner:core | sla:strict",
        );
        assert_eq!(ann.value.as_deref(), Some("auth"));
        assert_eq!(ann.description.as_deref(), Some("Handles login flow"));
        assert_eq!(ann.metadata, vec!["owner:core", "sla:strict"]);
    }

    #[test]
    fn test_empty_metadata_segments_discarded() {
        let ann = parse_one("typescript", "// @acp:module(\"m\") | a ||  | b");
        assert_eq!(ann.metadata, vec!["a", "b"]);
    }

    #[test]
    fn test_quote_unescaping() {
        let ann = parse_one("typescript", r#"// @acp:summary("say \"hi\" \\ bye")"#);
        assert_eq!(ann.value.as_deref(), Some(r#"say "hi" \ bye"#));
    }

    #[test]
    fn test_single_quoted_value() {
        let ann = parse_one("typescript", "// @acp:owner('platform-team')");
        assert_eq!(ann.value.as_deref(), Some("platform-team"));
    }

    #[test]
    fn test_bare_value() {
        let ann = parse_one("typescript", "// @acp:domain(auth)");
        assert_eq!(ann.value.as_deref(), Some("auth"));
        assert!(ann.diagnostics.is_empty());
    }

    #[test]
    fn test_range_reproduces_raw() {
        let text = "const a = 1; // @acp:lock(\"frozen\") - Do not touch\nmore();";
        let outcome = parse_annotations("typescript", text);
        assert!(!outcome.annotations.is_empty());
        for ann in &outcome.annotations {
            assert_eq!(&text[ann.range.start..ann.range.end], ann.raw);
        }
    }

    #[test]
    fn test_doc_comment_one_annotation_per_line() {
        let text = "/**\n * @acp:module(\"Billing\")\n * @acp:layer(service)\n */";
        let outcome = parse_annotations("typescript", text);
        assert_eq!(outcome.annotations.len(), 2);
        assert_eq!(outcome.annotations[0].namespace, "module");
        assert_eq!(outcome.annotations[1].namespace, "layer");
        for ann in &outcome.annotations {
            assert_eq!(&text[ann.range.start..ann.range.end], ann.raw);
        }
    }

    #[test]
    fn test_rust_doc_line_annotations() {
        let text = "/// @acp:fn(\"resolve\")\n/// @acp:returns\nfn resolve() {}";
        let outcome = parse_annotations("rust", text);
        assert_eq!(outcome.annotations.len(), 2);
        assert_eq!(outcome.annotations[0].line, 1);
        assert_eq!(outcome.annotations[1].line, 2);
        // `returns` is value-optional, no diagnostic for the second record
        assert!(outcome.annotations[1].diagnostics.is_empty());
    }

    #[test]
    fn test_namespace_only_fallback() {
        // A half-typed annotation still yields a record
        let ann = parse_one("typescript", "// @acp:lock frozen pending rewrite");
        assert_eq!(ann.namespace, "lock");
        assert_eq!(ann.value, None);
        assert_eq!(ann.raw, "@acp:lock");
    }

    #[test]
    fn test_value_variable_refs_extracted() {
        let ann = parse_one("typescript", "// @acp:see($SYM_PARSER.ref)");
        assert_eq!(ann.variable_refs.len(), 1);
        assert_eq!(ann.variable_refs[0].identifier, "SYM_PARSER");
        assert_eq!(ann.variable_refs[0].modifier.as_deref(), Some("ref"));
    }

    #[test]
    fn test_python_hash_annotation() {
        let ann = parse_one("python", "# @acp:lock(\"restricted\")");
        assert_eq!(ann.namespace, "lock");
        assert_eq!(ann.value.as_deref(), Some("restricted"));
    }

    #[test]
    fn test_idempotent_parse() {
        let text = "// @acp:module(\"M\")\n/** @acp:fn(\"f\") */\n";
        let a = parse_annotations("typescript", text);
        let b = parse_annotations("typescript", text);
        assert_eq!(
            serde_json::to_string(&a.annotations).unwrap(),
            serde_json::to_string(&b.annotations).unwrap()
        );
    }

    #[test]
    fn test_no_annotations_outside_comments() {
        let outcome = parse_annotations("typescript", "const s = \"@acp:lock(frozen)\";");
        assert!(outcome.annotations.is_empty());
    }

    #[test]
    fn test_unknown_language_yields_empty_outcome() {
        let outcome = parse_annotations("fortran", "! @acp:lock(frozen)");
        assert!(outcome.annotations.is_empty());
        assert!(outcome.diagnostics.is_empty());
    }
}
