//! @acp:module "Variable Registry"
//! @acp:summary "Aggregated, refreshable view of declared variables"
//! @acp:domain engine
//! @acp:layer service
//!
//! The registry is an explicitly owned cache: callers construct it, call
//! `refresh` whenever a declaration source changes, and pass it to the
//! resolver. A refresh is a full rebuild, not an incremental patch.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ResolvedVar, VarEntry, VarSummary, VarType, VarsDocument};
use crate::document::DocumentProvider;

/// Identifiers always resolvable from the ambient context, regardless of
/// registry contents. They live in a separate lookup consulted first.
pub const BUILTIN_NAMES: [&str; 5] = ["FILE", "LINE", "FUNCTION", "CLASS", "MODULE"];

/// @acp:summary "Which declaration wins when two sources declare one name"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// First source in iteration order wins (sources are sorted by URI)
    #[default]
    FirstWins,
    LastWins,
}

/// @acp:summary "Ambient values backing the built-in variables"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltinContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

/// A declared variable plus where it was found
#[derive(Debug, Clone)]
struct DeclaredVar {
    entry: VarEntry,
    line: usize,
}

#[derive(Debug, Clone)]
struct RegistrySource {
    uri: String,
    vars: HashMap<String, DeclaredVar>,
}

/// A registry lookup hit, borrowed from the winning source
#[derive(Debug, Clone, Copy)]
pub struct LookupHit<'a> {
    pub entry: &'a VarEntry,
    pub source: &'a str,
    pub line: usize,
}

/// @acp:summary "Project-wide variable registry"
#[derive(Debug, Default)]
pub struct VarRegistry {
    sources: Vec<RegistrySource>,
    policy: DuplicatePolicy,
    context: BuiltinContext,
    refreshed_at: Option<DateTime<Utc>>,
}

impl VarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    pub fn set_context(&mut self, context: BuiltinContext) {
        self.context = context;
    }

    pub fn context(&self) -> &BuiltinContext {
        &self.context
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    /// @acp:summary "Rebuild the registry from all declaration sources"
    ///
    /// Sources are sorted by URI so the iteration order backing the
    /// duplicate policy is deterministic. Malformed sources are skipped
    /// with a warning, never an error.
    pub fn refresh(&mut self, provider: &dyn DocumentProvider) {
        let mut docs: Vec<_> = provider
            .open_documents()
            .into_iter()
            .filter(|d| provider.is_declaration_source(&d.uri))
            .collect();
        docs.sort_by(|a, b| a.uri.cmp(&b.uri));

        self.sources.clear();
        for doc in docs {
            let parsed: VarsDocument = match serde_json::from_str(&doc.text) {
                Ok(parsed) => parsed,
                Err(err) => {
                    tracing::warn!("Skipping malformed declaration source {}: {}", doc.uri, err);
                    continue;
                }
            };

            let vars = parsed
                .variables
                .into_iter()
                .map(|(name, decl)| {
                    let line = definition_line(&doc.text, &name);
                    let entry = decl.into_entry();
                    (name, DeclaredVar { entry, line })
                })
                .collect();

            self.sources.push(RegistrySource {
                uri: doc.uri,
                vars,
            });
        }

        self.warn_duplicates();
        self.refreshed_at = Some(Utc::now());
        tracing::debug!(
            sources = self.sources.len(),
            variables = self.sources.iter().map(|s| s.vars.len()).sum::<usize>(),
            "variable registry refreshed"
        );
    }

    fn warn_duplicates(&self) {
        let mut seen: HashMap<&str, &str> = HashMap::new();
        for source in &self.sources {
            for name in source.vars.keys() {
                match seen.get(name.as_str()) {
                    Some(first) => tracing::warn!(
                        "Variable {} declared in both {} and {} ({:?} applies)",
                        name,
                        first,
                        source.uri,
                        self.policy
                    ),
                    None => {
                        seen.insert(name, &source.uri);
                    }
                }
            }
        }
    }

    /// Look up a declared variable, applying the duplicate policy.
    /// Built-ins are not consulted here; see [`VarRegistry::resolve_builtin`].
    pub fn lookup(&self, name: &str) -> Option<LookupHit<'_>> {
        match self.policy {
            DuplicatePolicy::FirstWins => self.sources.iter().find_map(|s| hit_in(s, name)),
            DuplicatePolicy::LastWins => self.sources.iter().rev().find_map(|s| hit_in(s, name)),
        }
    }

    /// @acp:summary "Resolve a built-in identifier from ambient context"
    ///
    /// Built-ins always resolve; an unset context field yields an empty
    /// value rather than a failure.
    pub fn resolve_builtin(&self, name: &str) -> Option<ResolvedVar> {
        let (var_type, value, summary) = match name {
            "FILE" => (
                VarType::File,
                self.context.file.clone().unwrap_or_default(),
                "Path of the current file",
            ),
            "LINE" => (
                VarType::String,
                self.context.line.map(|l| l.to_string()).unwrap_or_default(),
                "Current line number (1-indexed)",
            ),
            "FUNCTION" => (
                VarType::Symbol,
                self.context.function.clone().unwrap_or_default(),
                "Name of the enclosing function",
            ),
            "CLASS" => (
                VarType::Symbol,
                self.context.class.clone().unwrap_or_default(),
                "Name of the enclosing class",
            ),
            "MODULE" => (
                VarType::String,
                self.context.module.clone().unwrap_or_default(),
                "Name of the current module",
            ),
            _ => return None,
        };

        let full = serde_json::json!({
            "name": name,
            "type": var_type,
            "value": &value,
            "source": "builtin",
        })
        .to_string();

        Some(ResolvedVar {
            name: name.to_string(),
            var_type,
            value,
            summary: summary.to_string(),
            full,
            reference: format!("${} (builtin)", name),
            signature: None,
            description: Some(summary.to_string()),
            source: "builtin".to_string(),
            definition_line: None,
        })
    }

    /// @acp:summary "Whether an identifier resolves to anything"
    pub fn is_defined(&self, name: &str) -> bool {
        BUILTIN_NAMES.contains(&name) || self.lookup(name).is_some()
    }

    /// @acp:summary "List every available variable: built-ins plus declared"
    ///
    /// Declared names shadowed by a built-in are omitted, matching what
    /// resolution would actually return.
    pub fn list(&self) -> Vec<VarSummary> {
        let mut out: Vec<VarSummary> = BUILTIN_NAMES
            .iter()
            .map(|name| VarSummary {
                name: name.to_string(),
                var_type: self
                    .resolve_builtin(name)
                    .map(|v| v.var_type)
                    .unwrap_or_default(),
                source: "builtin".to_string(),
            })
            .collect();

        let ordered: Box<dyn Iterator<Item = &RegistrySource>> = match self.policy {
            DuplicatePolicy::FirstWins => Box::new(self.sources.iter()),
            DuplicatePolicy::LastWins => Box::new(self.sources.iter().rev()),
        };

        let mut seen: Vec<String> = Vec::new();
        for source in ordered {
            let mut names: Vec<_> = source.vars.keys().cloned().collect();
            names.sort();
            for name in names {
                if BUILTIN_NAMES.contains(&name.as_str()) || seen.contains(&name) {
                    continue;
                }
                let declared = &source.vars[&name];
                let var_type = declared
                    .entry
                    .var_type
                    .unwrap_or_else(|| VarType::infer(&name));
                out.push(VarSummary {
                    name: name.clone(),
                    var_type,
                    source: source.uri.clone(),
                });
                seen.push(name);
            }
        }

        out
    }
}

fn hit_in<'a>(source: &'a RegistrySource, name: &str) -> Option<LookupHit<'a>> {
    source.vars.get(name).map(|declared| LookupHit {
        entry: &declared.entry,
        source: source.uri.as_str(),
        line: declared.line,
    })
}

/// Locate a declaration's 1-indexed line by finding the quoted identifier.
/// serde gives no positions, so this is a best-effort scan of the raw JSON.
fn definition_line(text: &str, name: &str) -> usize {
    let needle = format!("\"{}\"", name);
    match text.find(&needle) {
        Some(idx) => text[..idx].matches('\n').count() + 1,
        None => 1,
    }
}
