//! @acp:module "Variable References"
//! @acp:summary "Reference extraction from arbitrary text"
//! @acp:domain engine
//! @acp:layer service

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::parse::Range;

/// Matches `$$` escapes and `$IDENT(.MODIFIER)?` references in one pass, so
/// an escape is consumed whole and never half-matched as a reference.
///
/// The identifier shape is deliberately looser than the naming rule
/// (`^[A-Z][A-Z0-9_]*$`): the resolver rejects bad names with a visible
/// error instead of this scanner silently skipping them.
static REF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\$|\$([A-Za-z][A-Za-z0-9_]*)(?:\.([A-Za-z][A-Za-z0-9_]*))?").unwrap()
});

/// @acp:summary "One variable reference occurrence"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarRef {
    /// Exact matched text, e.g. `$SYM_PARSER.ref`
    pub raw: String,
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,
    /// Absolute byte range of `raw`
    pub range: Range,
}

/// @acp:summary "Extract all variable references from text"
///
/// Matches are non-overlapping and ordered; doubled-sigil escapes are
/// skipped. Idempotent: unchanged text always yields identical results.
pub fn extract_refs(text: &str) -> Vec<VarRef> {
    extract_refs_at(text, 0)
}

/// Extract references with ranges offset by `base`, for scanning text that
/// is itself a slice of a larger document.
pub fn extract_refs_at(text: &str, base: usize) -> Vec<VarRef> {
    REF_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0).unwrap();
            // `$$` escape: not a reference
            let identifier = caps.get(1)?;
            Some(VarRef {
                raw: whole.as_str().to_string(),
                identifier: identifier.as_str().to_string(),
                modifier: caps.get(2).map(|m| m.as_str().to_string()),
                range: Range::new(base + whole.start(), base + whole.end()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_reference() {
        let refs = extract_refs("uses $API_KEY here");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].identifier, "API_KEY");
        assert_eq!(refs[0].modifier, None);
        assert_eq!(refs[0].raw, "$API_KEY");
        assert_eq!(refs[0].range, Range::new(5, 13));
    }

    #[test]
    fn test_reference_with_modifier() {
        let refs = extract_refs("see $SYM_PARSER.full for details");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].identifier, "SYM_PARSER");
        assert_eq!(refs[0].modifier.as_deref(), Some("full"));
        assert_eq!(refs[0].raw, "$SYM_PARSER.full");
    }

    #[test]
    fn test_doubled_sigil_skipped() {
        let refs = extract_refs("Price: $$100 and $$FOO");
        assert!(refs.is_empty());
    }

    #[test]
    fn test_escape_does_not_mask_following_ref() {
        let refs = extract_refs("$$ then $REAL");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].identifier, "REAL");
    }

    #[test]
    fn test_digit_after_sigil_is_not_a_ref() {
        assert!(extract_refs("costs $5 total").is_empty());
    }

    #[test]
    fn test_lowercase_is_extracted_for_loud_failure() {
        // Naming validation belongs to the resolver
        let refs = extract_refs("shell uses $lowercase");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].identifier, "lowercase");
    }

    #[test]
    fn test_trailing_dot_without_modifier() {
        let refs = extract_refs("end of $SENTENCE.");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].raw, "$SENTENCE");
        assert_eq!(refs[0].modifier, None);
    }

    #[test]
    fn test_idempotent() {
        let text = "mix $$ $A $B.ref $$X";
        assert_eq!(extract_refs(text), extract_refs(text));
    }

    #[test]
    fn test_offset_base() {
        let refs = extract_refs_at("$X", 100);
        assert_eq!(refs[0].range, Range::new(100, 102));
    }

    #[test]
    fn test_multiple_non_overlapping() {
        let refs = extract_refs("$A$B $C");
        let names: Vec<_> = refs.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        for pair in refs.windows(2) {
            assert!(pair[0].range.end <= pair[1].range.start);
        }
    }
}
