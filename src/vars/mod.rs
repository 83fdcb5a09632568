//! @acp:module "Variables"
//! @acp:summary "Variable system: references, registry, and resolution"
//! @acp:domain engine
//! @acp:layer model
//!
//! `$NAME` and `$NAME.modifier` references are extracted from text,
//! declared in project-wide declaration sources, aggregated into a
//! refreshable registry, and resolved with cycle and depth protection.

pub mod refs;
pub mod registry;
pub mod resolver;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use refs::{extract_refs, extract_refs_at, VarRef};
pub use registry::{BuiltinContext, DuplicatePolicy, VarRegistry, BUILTIN_NAMES};
pub use resolver::{
    ExpansionContext, Modifier, Resolution, ResolveError, VarResolver, MAX_EXPANSION_DEPTH,
};

/// @acp:summary "Variable value classification"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VarType {
    Symbol,
    File,
    Domain,
    #[default]
    String,
}

impl VarType {
    /// Infer the type from the identifier prefix when a declaration omits it
    pub fn infer(name: &str) -> Self {
        if name.starts_with("SYM_") {
            VarType::Symbol
        } else if name.starts_with("FILE_") {
            VarType::File
        } else if name.starts_with("DOM_") {
            VarType::Domain
        } else {
            VarType::String
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VarType::Symbol => "symbol",
            VarType::File => "file",
            VarType::Domain => "domain",
            VarType::String => "string",
        }
    }
}

impl std::fmt::Display for VarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @acp:summary "One declared variable (object form)"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarEntry {
    /// Declared type; inferred from the identifier prefix when absent
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub var_type: Option<VarType>,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional type signature rendered by the `signature` modifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// A declaration is either a bare string value or a full entry object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarDecl {
    Bare(String),
    Entry(VarEntry),
}

impl VarDecl {
    pub fn into_entry(self) -> VarEntry {
        match self {
            VarDecl::Bare(value) => VarEntry {
                var_type: None,
                value,
                description: None,
                signature: None,
            },
            VarDecl::Entry(entry) => entry,
        }
    }
}

/// @acp:summary "Declaration source document format"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VarsDocument {
    #[serde(default)]
    pub variables: HashMap<String, VarDecl>,
}

/// @acp:summary "A successfully resolved variable"
///
/// Only constructed by the resolver; `value` has nested references fully
/// expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedVar {
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: VarType,
    pub value: String,
    /// Short human summary (description, or the value truncated)
    pub summary: String,
    /// Serialized structured form, rendered by the `full` modifier
    pub full: String,
    /// Short cross-reference string, rendered by the `ref` modifier
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declaration source URI, or "builtin"
    pub source: String,
    /// 1-indexed line of the declaration; absent for built-ins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition_line: Option<usize>,
}

/// @acp:summary "Listing entry for available variables"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: VarType,
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_type_inference_from_prefix() {
        assert_eq!(VarType::infer("SYM_PARSER"), VarType::Symbol);
        assert_eq!(VarType::infer("FILE_SRC_MAIN"), VarType::File);
        assert_eq!(VarType::infer("DOM_AUTH"), VarType::Domain);
        assert_eq!(VarType::infer("API_KEY"), VarType::String);
    }

    #[test]
    fn test_decl_bare_and_object_forms() {
        let doc: VarsDocument = serde_json::from_str(
            r#"{
                "variables": {
                    "API_KEY": "secret123",
                    "SYM_MAIN": {"value": "src/main.rs:main", "description": "Entry point"}
                }
            }"#,
        )
        .unwrap();

        let bare = doc.variables["API_KEY"].clone().into_entry();
        assert_eq!(bare.value, "secret123");
        assert_eq!(bare.var_type, None);

        let obj = doc.variables["SYM_MAIN"].clone().into_entry();
        assert_eq!(obj.value, "src/main.rs:main");
        assert_eq!(obj.description.as_deref(), Some("Entry point"));
    }

    #[test]
    fn test_decl_with_explicit_type() {
        let decl: VarDecl =
            serde_json::from_str(r#"{"type": "domain", "value": "billing"}"#).unwrap();
        assert_eq!(decl.into_entry().var_type, Some(VarType::Domain));
    }
}
