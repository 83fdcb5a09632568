//! @acp:module "Variable Resolver"
//! @acp:summary "Reference resolution with cycle and depth protection"
//! @acp:domain engine
//! @acp:layer service
//!
//! Resolves one reference at a time against the registry, expanding nested
//! references in declared values. The expansion stack is an explicit,
//! caller-owned context threaded through calls: a fresh context per public
//! request makes independent resolutions safe by construction, and a failed
//! resolution can never leave the stack poisoned for the next call.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use super::refs::extract_refs;
use super::registry::{LookupHit, VarRegistry};
use super::{ResolvedVar, VarType};

/// Maximum nesting depth for variable expansion
pub const MAX_EXPANSION_DEPTH: usize = 10;

/// Stand-in for an escaped sigil while references are substituted. Private
/// use area, not expected to occur in source text.
const ESCAPE_PLACEHOLDER: &str = "\u{E000}";

/// Valid identifier shape for resolution
static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").unwrap());

/// @acp:summary "Alternate renderings selected by a reference suffix"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// Serialized structured form
    Full,
    /// Short cross-reference string
    Ref,
    /// Type signature, falling back to the summary
    Signature,
}

impl Modifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Full => "full",
            Modifier::Ref => "ref",
            Modifier::Signature => "signature",
        }
    }
}

impl std::str::FromStr for Modifier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "full" => Ok(Modifier::Full),
            "ref" => Ok(Modifier::Ref),
            "signature" => Ok(Modifier::Signature),
            _ => Err(format!("Unknown modifier: {}", s)),
        }
    }
}

/// @acp:summary "Tagged resolution failure"
///
/// Failures are values, never panics: malformed references are data
/// quality, not engine defects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("invalid variable name ${name}")]
    InvalidName { name: String },

    #[error("invalid modifier .{modifier} on ${name} (valid: full, ref, signature)")]
    InvalidModifier { name: String, modifier: String },

    #[error("circular variable reference: {}", .chain.join(" -> "))]
    Circular { chain: Vec<String> },

    #[error("variable expansion exceeded depth {max} at ${name}")]
    DepthExceeded { name: String, max: usize },

    #[error("undefined variable ${name}")]
    Undefined { name: String },
}

/// @acp:summary "Caller-owned expansion stack"
///
/// Tracks identifiers currently mid-resolution to detect cycles. One
/// context covers one logical expansion; construct a fresh one (or call
/// [`ExpansionContext::reset`]) between unrelated requests.
#[derive(Debug, Clone, Default)]
pub struct ExpansionContext {
    stack: Vec<String>,
}

impl ExpansionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stack.iter().any(|n| n == name)
    }

    /// The in-flight chain plus `name`, for cycle diagnostics
    pub fn chain_with(&self, name: &str) -> Vec<String> {
        let mut chain = self.stack.clone();
        chain.push(name.to_string());
        chain
    }

    pub fn reset(&mut self) {
        self.stack.clear();
    }

    fn push(&mut self, name: &str) {
        self.stack.push(name.to_string());
    }

    fn pop(&mut self) {
        self.stack.pop();
    }
}

/// @acp:summary "Successful resolution: the variable plus its rendering"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub variable: ResolvedVar,
    /// The modifier-applied text that replaces the reference
    pub rendered: String,
}

/// @acp:summary "Resolves references against a borrowed registry"
pub struct VarResolver<'r> {
    registry: &'r VarRegistry,
}

impl<'r> VarResolver<'r> {
    pub fn new(registry: &'r VarRegistry) -> Self {
        Self { registry }
    }

    /// @acp:summary "Resolve one reference with a fresh expansion context"
    pub fn resolve(
        &self,
        name: &str,
        modifier: Option<&str>,
    ) -> Result<Resolution, ResolveError> {
        let mut ctx = ExpansionContext::new();
        self.resolve_with(name, modifier, &mut ctx)
    }

    /// Resolve one reference, threading the caller's expansion context.
    pub fn resolve_with(
        &self,
        name: &str,
        modifier: Option<&str>,
        ctx: &mut ExpansionContext,
    ) -> Result<Resolution, ResolveError> {
        let modifier = modifier
            .map(|m| {
                m.parse::<Modifier>()
                    .map_err(|_| ResolveError::InvalidModifier {
                        name: name.to_string(),
                        modifier: m.to_string(),
                    })
            })
            .transpose()?;

        let variable = self.resolve_entry(name, ctx)?;
        let rendered = render(&variable, modifier);
        Ok(Resolution { variable, rendered })
    }

    /// The resolution state machine: validate, cycle check, depth check,
    /// builtin fast path, then lookup with nested expansion.
    fn resolve_entry(
        &self,
        name: &str,
        ctx: &mut ExpansionContext,
    ) -> Result<ResolvedVar, ResolveError> {
        if !NAME_PATTERN.is_match(name) {
            return Err(ResolveError::InvalidName {
                name: name.to_string(),
            });
        }

        if ctx.contains(name) {
            return Err(ResolveError::Circular {
                chain: ctx.chain_with(name),
            });
        }

        if ctx.depth() >= MAX_EXPANSION_DEPTH {
            return Err(ResolveError::DepthExceeded {
                name: name.to_string(),
                max: MAX_EXPANSION_DEPTH,
            });
        }

        // Built-ins resolve from ambient context, no stack manipulation
        if let Some(builtin) = self.registry.resolve_builtin(name) {
            return Ok(builtin);
        }

        let Some(hit) = self.registry.lookup(name) else {
            return Err(ResolveError::Undefined {
                name: name.to_string(),
            });
        };

        // The pop runs on both paths, so a failed nested expansion cannot
        // poison the stack for subsequent independent calls.
        ctx.push(name);
        let expanded = self.expand_nested(hit.entry.value.as_str(), ctx);
        ctx.pop();

        Ok(build_resolved(name, &hit, expanded?))
    }

    /// Expand references inside a declared value, propagating failures.
    fn expand_nested(
        &self,
        text: &str,
        ctx: &mut ExpansionContext,
    ) -> Result<String, ResolveError> {
        let mut out = text.replace("$$", ESCAPE_PLACEHOLDER);
        for var_ref in extract_refs(&out).iter().rev() {
            let resolution =
                self.resolve_with(&var_ref.identifier, var_ref.modifier.as_deref(), ctx)?;
            out.replace_range(var_ref.range.start..var_ref.range.end, &resolution.rendered);
        }
        Ok(out.replace(ESCAPE_PLACEHOLDER, "$"))
    }

    /// @acp:summary "Expand every reference in free text"
    ///
    /// `$$` escapes become a literal `$`. Substitution runs right to left
    /// so earlier offsets stay valid while later ones are rewritten.
    /// Failures are not dropped: each becomes a visible `[!…]` marker
    /// embedding the reason, so a bad expansion is observable in the
    /// output itself.
    pub fn expand_all(&self, text: &str) -> String {
        let mut out = text.replace("$$", ESCAPE_PLACEHOLDER);
        for var_ref in extract_refs(&out).iter().rev() {
            // Each top-level reference is an independent expansion request
            let mut ctx = ExpansionContext::new();
            let replacement =
                match self.resolve_with(&var_ref.identifier, var_ref.modifier.as_deref(), &mut ctx)
                {
                    Ok(resolution) => resolution.rendered,
                    Err(err) => format!("[!{}]", err),
                };
            out.replace_range(var_ref.range.start..var_ref.range.end, &replacement);
        }
        out.replace(ESCAPE_PLACEHOLDER, "$")
    }
}

/// Apply a modifier to a resolved variable.
fn render(variable: &ResolvedVar, modifier: Option<Modifier>) -> String {
    match modifier {
        None => variable.value.clone(),
        Some(Modifier::Full) => variable.full.clone(),
        Some(Modifier::Ref) => variable.reference.clone(),
        Some(Modifier::Signature) => variable
            .signature
            .clone()
            .unwrap_or_else(|| variable.summary.clone()),
    }
}

fn build_resolved(name: &str, hit: &LookupHit<'_>, expanded_value: String) -> ResolvedVar {
    let var_type = hit.entry.var_type.unwrap_or_else(|| VarType::infer(name));
    let description = hit.entry.description.clone();
    let summary = description
        .clone()
        .unwrap_or_else(|| truncate(&expanded_value, 80));

    let full = serde_json::json!({
        "name": name,
        "type": var_type,
        "value": &expanded_value,
        "description": &description,
        "source": hit.source,
        "line": hit.line,
    })
    .to_string();

    ResolvedVar {
        name: name.to_string(),
        var_type,
        value: expanded_value,
        summary,
        full,
        reference: format!("${} ({}:{})", name, hit.source, hit.line),
        signature: hit.entry.signature.clone(),
        description,
        source: hit.source.to_string(),
        definition_line: Some(hit.line),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}
