//! @acp:module "Comments"
//! @acp:summary "Comment region extraction for supported languages"
//! @acp:domain engine
//! @acp:layer service
//!
//! Locates line, block, and documentation comments in source text using each
//! language's delimiters. This is deliberately not an AST: the engine only
//! needs comment regions, so a single forward scan with string-literal
//! skipping is enough.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// @acp:summary "Comment classification"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentKind {
    Line,
    Block,
    Doc,
}

/// @acp:summary "A single comment region in absolute document offsets"
///
/// `start..end` covers the whole comment including delimiters; `content` is
/// the delimiter-stripped text starting at `content_start`. Content is never
/// trimmed, so an index into it maps back to `content_start + index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentSpan {
    pub kind: CommentKind,
    pub content: String,
    pub start: usize,
    pub end: usize,
    pub content_start: usize,
}

/// Comment delimiters for one language. Doc forms are probed before their
/// plain counterparts so a doc comment subsumes the block double-match.
struct CommentSyntax {
    line: &'static [&'static str],
    doc_line: &'static [&'static str],
    block: &'static [(&'static str, &'static str)],
    doc_block: &'static [(&'static str, &'static str)],
}

static C_FAMILY: CommentSyntax = CommentSyntax {
    line: &["//"],
    doc_line: &[],
    block: &[("/*", "*/")],
    doc_block: &[("/**", "*/")],
};

static CSHARP: CommentSyntax = CommentSyntax {
    line: &["//"],
    doc_line: &["///"],
    block: &[("/*", "*/")],
    doc_block: &[("/**", "*/")],
};

static RUST: CommentSyntax = CommentSyntax {
    line: &["//"],
    doc_line: &["///", "//!"],
    block: &[("/*", "*/")],
    doc_block: &[("/**", "*/"), ("/*!", "*/")],
};

static HASH_ONLY: CommentSyntax = CommentSyntax {
    line: &["#"],
    doc_line: &[],
    block: &[],
    doc_block: &[],
};

static PHP: CommentSyntax = CommentSyntax {
    line: &["//", "#"],
    doc_line: &[],
    block: &[("/*", "*/")],
    doc_block: &[("/**", "*/")],
};

static RUBY: CommentSyntax = CommentSyntax {
    line: &["#"],
    doc_line: &[],
    block: &[("=begin", "=end")],
    doc_block: &[],
};

fn syntax_for(language_id: &str) -> Option<&'static CommentSyntax> {
    match language_id {
        "typescript" | "typescriptreact" | "javascript" | "javascriptreact" | "java" | "go"
        | "c" | "cpp" | "kotlin" | "php" => {
            if language_id == "php" {
                Some(&PHP)
            } else {
                Some(&C_FAMILY)
            }
        }
        "csharp" | "swift" => Some(&CSHARP),
        "rust" => Some(&RUST),
        "python" | "shellscript" => Some(&HASH_ONLY),
        "ruby" => Some(&RUBY),
        _ => None,
    }
}

/// @acp:summary "Map a file path to an editor language id"
pub fn detect_language_id<P: AsRef<Path>>(path: P) -> Option<&'static str> {
    let ext = path.as_ref().extension()?.to_str()?;

    match ext.to_lowercase().as_str() {
        "ts" => Some("typescript"),
        "tsx" => Some("typescriptreact"),
        "js" | "mjs" | "cjs" => Some("javascript"),
        "jsx" => Some("javascriptreact"),
        "rs" => Some("rust"),
        "py" | "pyw" => Some("python"),
        "go" => Some("go"),
        "java" => Some("java"),
        "cs" => Some("csharp"),
        "cpp" | "cxx" | "cc" | "hpp" | "hxx" => Some("cpp"),
        "c" | "h" => Some("c"),
        "rb" => Some("ruby"),
        "php" => Some("php"),
        "swift" => Some("swift"),
        "kt" | "kts" => Some("kotlin"),
        "sh" | "bash" => Some("shellscript"),
        _ => None,
    }
}

/// @acp:summary "Extract all comment spans from a document"
///
/// Spans come back ordered by start offset and non-overlapping. Unknown
/// language ids produce an empty list; an unterminated block comment
/// produces no span rather than matching past end-of-file.
pub fn extract(language_id: &str, text: &str) -> Vec<CommentSpan> {
    let Some(syntax) = syntax_for(language_id) else {
        return Vec::new();
    };

    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    let mut at_line_start = true;

    while i < bytes.len() {
        let rest = &text[i..];

        if let Some(span) = match_block(syntax.doc_block, CommentKind::Doc, text, i, at_line_start)
            .or_else(|| match_block(syntax.block, CommentKind::Block, text, i, at_line_start))
        {
            i = span.end;
            at_line_start = false;
            spans.push(span);
            continue;
        }

        if let Some(span) = match_line(syntax.doc_line, CommentKind::Doc, text, i)
            .or_else(|| match_line(syntax.line, CommentKind::Line, text, i))
        {
            i = span.end;
            at_line_start = false;
            spans.push(span);
            continue;
        }

        let ch = rest.chars().next().unwrap();
        if ch == '"' || ch == '\'' {
            i += skip_string_literal(rest, ch);
            at_line_start = false;
            continue;
        }

        at_line_start = ch == '\n';
        i += ch.len_utf8();
    }

    spans
}

fn match_block(
    delims: &[(&'static str, &'static str)],
    kind: CommentKind,
    text: &str,
    i: usize,
    at_line_start: bool,
) -> Option<CommentSpan> {
    let rest = &text[i..];
    for (opener, closer) in delims {
        // Ruby's =begin/=end only open at the start of a line
        if opener.starts_with('=') && !at_line_start {
            continue;
        }
        if !rest.starts_with(opener) {
            continue;
        }
        let content_start = i + opener.len();
        // Unterminated: no span, caller falls through to other matchers
        let rel = text[content_start..].find(closer)?;
        let content_end = content_start + rel;
        return Some(CommentSpan {
            kind,
            content: text[content_start..content_end].to_string(),
            start: i,
            end: content_end + closer.len(),
            content_start,
        });
    }
    None
}

fn match_line(
    prefixes: &[&'static str],
    kind: CommentKind,
    text: &str,
    i: usize,
) -> Option<CommentSpan> {
    let rest = &text[i..];
    for prefix in prefixes {
        if !rest.starts_with(prefix) {
            continue;
        }
        let mut end = i + rest.find('\n').unwrap_or(rest.len());
        if end > i && text.as_bytes()[end - 1] == b'\r' {
            end -= 1;
        }
        let content_start = i + prefix.len();
        return Some(CommentSpan {
            kind,
            content: text[content_start..end].to_string(),
            start: i,
            end,
            content_start,
        });
    }
    None
}

/// Skip a same-line string literal starting at `rest[0]`, honoring `\`
/// escapes. A quote left open at end-of-line counts as a lone character.
fn skip_string_literal(rest: &str, quote: char) -> usize {
    let mut chars = rest.char_indices().skip(1);
    let mut escaped = false;
    for (idx, ch) in &mut chars {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '\n' => return quote.len_utf8(),
            c if c == quote => return idx + c.len_utf8(),
            _ => {}
        }
    }
    quote.len_utf8()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_line_comment() {
        let text = "let x = 1; // trailing note\nlet y = 2;";
        let spans = extract("typescript", text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, CommentKind::Line);
        assert_eq!(spans[0].content, " trailing note");
        assert_eq!(&text[spans[0].start..spans[0].end], "// trailing note");
    }

    #[test]
    fn test_block_and_doc_dedup() {
        let text = "/** doc */ code /* plain */";
        let spans = extract("javascript", text);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].kind, CommentKind::Doc);
        assert_eq!(spans[0].content, " doc ");
        assert_eq!(spans[1].kind, CommentKind::Block);
        assert_eq!(spans[1].content, " plain ");
    }

    #[test]
    fn test_rust_doc_lines() {
        let text = "/// outer doc\n//! inner doc\n// plain\nfn main() {}";
        let spans = extract("rust", text);
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].kind, CommentKind::Doc);
        assert_eq!(spans[0].content, " outer doc");
        assert_eq!(spans[1].kind, CommentKind::Doc);
        assert_eq!(spans[2].kind, CommentKind::Line);
    }

    #[test]
    fn test_python_hash() {
        let text = "# top\nx = 1  # tail\n";
        let spans = extract("python", text);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].content, " top");
        assert_eq!(spans[1].content, " tail");
    }

    #[test]
    fn test_unknown_language_is_empty() {
        assert!(extract("cobol", "// whatever").is_empty());
    }

    #[test]
    fn test_unterminated_block_produces_no_span() {
        let text = "code /* never closed\nmore code";
        let spans = extract("typescript", text);
        assert!(spans.iter().all(|s| s.kind != CommentKind::Block));
    }

    #[test]
    fn test_comment_inside_string_is_skipped() {
        let text = "let s = \"// not a comment\"; // real";
        let spans = extract("typescript", text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, " real");
    }

    #[test]
    fn test_spans_are_ordered_and_disjoint() {
        let text = "// a\n/* b */ /** c */\n// d";
        let spans = extract("typescript", text);
        assert_eq!(spans.len(), 4);
        for pair in spans.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn test_content_start_maps_back_into_document() {
        let text = "x /* mid */ y";
        let spans = extract("c", text);
        assert_eq!(spans.len(), 1);
        let s = &spans[0];
        assert_eq!(&text[s.content_start..s.content_start + s.content.len()], s.content);
    }

    #[test]
    fn test_crlf_line_comment_excludes_cr() {
        let text = "// note\r\nnext";
        let spans = extract("typescript", text);
        assert_eq!(spans[0].content, " note");
    }

    #[test]
    fn test_detect_language_id() {
        assert_eq!(detect_language_id("src/lib.rs"), Some("rust"));
        assert_eq!(detect_language_id("app/main.ts"), Some("typescript"));
        assert_eq!(detect_language_id("tool.py"), Some("python"));
        assert_eq!(detect_language_id("README.md"), None);
        assert_eq!(detect_language_id("Makefile"), None);
    }

    #[test]
    fn test_ruby_begin_end_block() {
        let text = "x = 1\n=begin\nnotes here\n=end\ny = 2";
        let spans = extract("ruby", text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, CommentKind::Block);
        assert!(spans[0].content.contains("notes here"));
    }
}
