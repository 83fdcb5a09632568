//! @acp:module "Engine"
//! @acp:summary "Facade wiring the parser, registry, and resolver"
//! @acp:domain engine
//! @acp:layer api
//!
//! One engine per session: it owns the document provider and the variable
//! registry, and exposes the operations editor tooling consumes. Parsing is
//! stateless; resolution reads the registry, which callers refresh whenever
//! a declaration source changes.

use crate::document::DocumentProvider;
use crate::parse::{self, ParseOutcome};
use crate::vars::{
    BuiltinContext, Resolution, ResolveError, VarRegistry, VarResolver, VarSummary,
};

/// @acp:summary "Annotation parsing and variable resolution engine"
pub struct AnnotationEngine<P: DocumentProvider> {
    provider: P,
    registry: VarRegistry,
}

impl<P: DocumentProvider> AnnotationEngine<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            registry: VarRegistry::new(),
        }
    }

    /// Construct with an explicitly configured registry (duplicate policy,
    /// builtin context).
    pub fn with_registry(provider: P, registry: VarRegistry) -> Self {
        Self { provider, registry }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn registry(&self) -> &VarRegistry {
        &self.registry
    }

    /// @acp:summary "Rebuild the registry from current declaration sources"
    pub fn refresh(&mut self) {
        self.registry.refresh(&self.provider);
    }

    pub fn set_builtin_context(&mut self, context: BuiltinContext) {
        self.registry.set_context(context);
    }

    /// @acp:summary "Parse all annotations in a document"
    pub fn parse_annotations(&self, language_id: &str, text: &str) -> ParseOutcome {
        parse::parse_annotations(language_id, text)
    }

    /// @acp:summary "Parse an open document by URI"
    ///
    /// Returns `None` when the provider does not know the document.
    pub fn parse_document(&self, uri: &str) -> Option<ParseOutcome> {
        let text = self.provider.text(uri)?;
        let language_id = self.provider.language_id(uri)?;
        Some(parse::parse_annotations(&language_id, &text))
    }

    /// @acp:summary "Resolve a single variable reference"
    pub fn resolve_variable(
        &self,
        name: &str,
        modifier: Option<&str>,
    ) -> Result<Resolution, ResolveError> {
        VarResolver::new(&self.registry).resolve(name, modifier)
    }

    /// @acp:summary "Expand every variable reference in free text"
    pub fn expand_all(&self, text: &str) -> String {
        VarResolver::new(&self.registry).expand_all(text)
    }

    /// @acp:summary "Whether an identifier resolves to anything"
    pub fn is_variable_defined(&self, name: &str) -> bool {
        self.registry.is_defined(name)
    }

    /// @acp:summary "List built-ins and declared variables"
    pub fn list_available_variables(&self) -> Vec<VarSummary> {
        self.registry.list()
    }
}
