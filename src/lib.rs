#![forbid(unsafe_code)]

//! @acp:module "ACP Engine Library"
//! @acp:summary "Annotation parsing and variable resolution for the AI Context Protocol"
//! @acp:domain engine
//! @acp:layer api
//! @acp:stability stable
//!
//! # ACP Engine
//!
//! Mines `@acp:` annotations out of source-code comments across many
//! languages and resolves `$NAME` variable references against a
//! project-wide registry.
//!
//! ## Features
//!
//! - **Comment extraction**: line, block, and doc comments per language
//! - **Annotation grammar**: structured records with ranges and diagnostics
//! - **Variable system**: registry, built-ins, modifiers, cycle protection
//! - **Multi-language**: TypeScript, JavaScript, Rust, Python, Go, Java, …
//!
//! ## Example
//!
//! ```rust
//! use acp_engine::{AnnotationEngine, MemoryDocuments};
//!
//! let mut docs = MemoryDocuments::new();
//! docs.insert("main.ts", "typescript", "// @acp:lock(\"frozen\")\n");
//! docs.insert("a.vars.json", "json", r#"{"variables": {"NAME": "world"}}"#);
//!
//! let mut engine = AnnotationEngine::new(docs);
//! engine.refresh();
//!
//! let outcome = engine.parse_document("main.ts").unwrap();
//! assert_eq!(outcome.annotations[0].namespace, "lock");
//! assert_eq!(engine.expand_all("hello $NAME"), "hello world");
//! ```

pub mod comments;
pub mod commands;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod parse;
pub mod taxonomy;
pub mod vars;

// Re-exports
pub use comments::{detect_language_id, extract, CommentKind, CommentSpan};
pub use config::Config;
pub use document::{
    offset_to_position, position_to_offset, DocumentProvider, FsDocuments, MemoryDocuments,
    OpenDocument, Position,
};
pub use engine::AnnotationEngine;
pub use error::{AcpError, Result};
pub use parse::{
    parse_annotations, Annotation, Diagnostic, DiagnosticKind, ParseOutcome, Range, Severity,
};
pub use taxonomy::{classify, Category, LockLevel};
pub use vars::{
    extract_refs, BuiltinContext, DuplicatePolicy, ExpansionContext, Modifier, Resolution,
    ResolveError, ResolvedVar, VarRef, VarRegistry, VarResolver, VarSummary, VarType,
    MAX_EXPANSION_DEPTH,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
