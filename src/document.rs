//! @acp:module "Documents"
//! @acp:summary "Document provider interfaces and position mapping"
//! @acp:domain engine
//! @acp:layer api
//!
//! The engine performs no I/O of its own: documents arrive through a
//! [`DocumentProvider`], which also marks which of them are variable
//! declaration sources for the registry.

use std::collections::HashSet;
use std::path::Path;

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::comments::detect_language_id;
use crate::config::Config;
use crate::error::Result;

/// @acp:summary "One open document"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenDocument {
    pub uri: String,
    pub language_id: String,
    pub text: String,
}

/// @acp:summary "Source of document text and declaration-source marking"
pub trait DocumentProvider {
    fn text(&self, uri: &str) -> Option<String>;
    fn language_id(&self, uri: &str) -> Option<String>;
    fn open_documents(&self) -> Vec<OpenDocument>;
    fn is_declaration_source(&self, uri: &str) -> bool;
}

/// @acp:summary "In-memory provider for tests and embedding"
#[derive(Debug, Clone, Default)]
pub struct MemoryDocuments {
    documents: Vec<OpenDocument>,
    declaration_sources: HashSet<String>,
}

impl MemoryDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document by URI
    pub fn insert(&mut self, uri: &str, language_id: &str, text: &str) {
        self.documents.retain(|d| d.uri != uri);
        self.documents.push(OpenDocument {
            uri: uri.to_string(),
            language_id: language_id.to_string(),
            text: text.to_string(),
        });
    }

    pub fn remove(&mut self, uri: &str) {
        self.documents.retain(|d| d.uri != uri);
        self.declaration_sources.remove(uri);
    }

    pub fn mark_declaration_source(&mut self, uri: &str) {
        self.declaration_sources.insert(uri.to_string());
    }
}

impl DocumentProvider for MemoryDocuments {
    fn text(&self, uri: &str) -> Option<String> {
        self.documents
            .iter()
            .find(|d| d.uri == uri)
            .map(|d| d.text.clone())
    }

    fn language_id(&self, uri: &str) -> Option<String> {
        self.documents
            .iter()
            .find(|d| d.uri == uri)
            .map(|d| d.language_id.clone())
    }

    fn open_documents(&self) -> Vec<OpenDocument> {
        self.documents.clone()
    }

    fn is_declaration_source(&self, uri: &str) -> bool {
        self.declaration_sources.contains(uri) || uri.ends_with(".vars.json")
    }
}

/// @acp:summary "Filesystem provider over a project's declaration sources"
///
/// Walks the project root once and loads every file matching the config's
/// declaration-source globs. Source files themselves are read on demand by
/// the CLI, not held here.
#[derive(Debug, Clone, Default)]
pub struct FsDocuments {
    documents: Vec<OpenDocument>,
}

impl FsDocuments {
    pub fn scan<P: AsRef<Path>>(root: P, config: &Config) -> Result<Self> {
        let root = root.as_ref();
        let patterns: Vec<Pattern> = config
            .vars
            .sources
            .iter()
            .map(|p| Pattern::new(p))
            .collect::<std::result::Result<_, _>>()?;

        let match_opts = MatchOptions {
            case_sensitive: true,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };

        let mut documents = Vec::new();
        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");

            if !patterns.iter().any(|p| p.matches_with(&relative, match_opts)) {
                continue;
            }

            match std::fs::read_to_string(entry.path()) {
                Ok(text) => documents.push(OpenDocument {
                    uri: relative,
                    language_id: "json".to_string(),
                    text,
                }),
                Err(err) => {
                    tracing::warn!("Skipping unreadable declaration source {}: {}", relative, err);
                }
            }
        }

        documents.sort_by(|a, b| a.uri.cmp(&b.uri));
        Ok(Self { documents })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentProvider for FsDocuments {
    fn text(&self, uri: &str) -> Option<String> {
        self.documents
            .iter()
            .find(|d| d.uri == uri)
            .map(|d| d.text.clone())
    }

    fn language_id(&self, uri: &str) -> Option<String> {
        self.documents
            .iter()
            .find(|d| d.uri == uri)
            .map(|d| d.language_id.clone())
            .or_else(|| detect_language_id(uri).map(str::to_string))
    }

    fn open_documents(&self) -> Vec<OpenDocument> {
        self.documents.clone()
    }

    fn is_declaration_source(&self, _uri: &str) -> bool {
        // Everything this provider holds was matched by a declaration glob
        true
    }
}

/// @acp:summary "Line/column position (0-indexed, columns in characters)"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// @acp:summary "Translate a byte offset into a line/column position"
///
/// Offsets past the end of text clamp to the final position.
pub fn offset_to_position(text: &str, offset: usize) -> Position {
    let mut line = 0;
    let mut column = 0;
    for (idx, ch) in text.char_indices() {
        if idx >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }
    }
    Position { line, column }
}

/// @acp:summary "Translate a line/column position into a byte offset"
///
/// Returns `None` when the line does not exist or the column runs past the
/// end of its line.
pub fn position_to_offset(text: &str, position: Position) -> Option<usize> {
    let mut line = 0;
    let mut column = 0;
    for (idx, ch) in text.char_indices() {
        if line == position.line && column == position.column {
            return Some(idx);
        }
        if ch == '\n' {
            if line == position.line {
                // Requested column is past this line's end
                return None;
            }
            line += 1;
            column = 0;
        } else {
            column += 1;
        }
    }
    (line == position.line && column == position.column).then_some(text.len())
}
