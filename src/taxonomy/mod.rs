//! @acp:module "Taxonomy"
//! @acp:summary "Namespace classification and semantic validation"
//! @acp:domain engine
//! @acp:layer model
//!
//! Classifies annotation namespaces into the four fixed categories and
//! validates enumerated values (lock levels). Classification is a closed
//! partition: a namespace belongs to exactly one category or to none.

use serde::{Deserialize, Serialize};

/// @acp:summary "The four fixed annotation categories"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    FileLevel,
    SymbolLevel,
    Constraint,
    Inline,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::FileLevel => "file-level",
            Category::SymbolLevel => "symbol-level",
            Category::Constraint => "constraint",
            Category::Inline => "inline",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category used when a namespace is outside every fixed set.
pub const DEFAULT_CATEGORY: Category = Category::SymbolLevel;

/// @acp:summary "Classify a namespace into its category"
///
/// Returns `None` for namespaces outside the four fixed sets; the grammar
/// matcher then falls back to [`DEFAULT_CATEGORY`] and flags the record.
pub fn classify(namespace: &str) -> Option<Category> {
    match namespace {
        // File-level metadata
        "module" | "purpose" | "owner" | "domain" | "layer" | "stability" | "version"
        | "since" | "license" | "author" => Some(Category::FileLevel),

        // Symbol-level documentation and behavior
        "fn" | "function" | "class" | "method" | "symbol" | "summary" | "param" | "returns"
        | "return" | "template" | "calls" | "imports" | "depends" | "pure" | "idempotent"
        | "memoized" | "async" | "generator" | "throttled" | "transactional"
        | "side-effects" | "deprecated" | "experimental" | "beta" | "internal"
        | "public-api" | "example" | "see" | "link" | "memory" | "cached" => {
            Some(Category::SymbolLevel)
        }

        // AI behavioral constraints
        "lock" | "ref" | "style" | "ai-careful" | "ai-readonly" | "ai-avoid"
        | "ai-no-modify" => Some(Category::Constraint),

        // Inline markers
        "todo" | "fixme" | "hack" | "critical" | "perf" | "note" | "warning" => {
            Some(Category::Inline)
        }

        _ => None,
    }
}

/// @acp:summary "Whether a namespace is valid without a value"
///
/// Flag-like namespaces carry their meaning in the name alone; everything
/// else missing a value gets a `MissingValue` diagnostic.
pub fn is_value_optional(namespace: &str) -> bool {
    matches!(
        namespace,
        "pure"
            | "idempotent"
            | "memoized"
            | "async"
            | "generator"
            | "transactional"
            | "deprecated"
            | "experimental"
            | "beta"
            | "internal"
            | "public-api"
            | "returns"
            | "return"
            | "cached"
            | "todo"
            | "fixme"
            | "hack"
            | "critical"
            | "perf"
            | "note"
            | "warning"
            | "ai-careful"
            | "ai-readonly"
            | "ai-avoid"
            | "ai-no-modify"
    )
}

/// @acp:summary "Mutation lock levels, most to least restrictive"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LockLevel {
    Frozen,
    Restricted,
    ApprovalRequired,
    TestsRequired,
    DocsRequired,
    ReviewRequired,
    #[default]
    Normal,
    Experimental,
}

impl LockLevel {
    /// All levels in severity order (most restrictive first)
    pub const ALL: [LockLevel; 8] = [
        LockLevel::Frozen,
        LockLevel::Restricted,
        LockLevel::ApprovalRequired,
        LockLevel::TestsRequired,
        LockLevel::DocsRequired,
        LockLevel::ReviewRequired,
        LockLevel::Normal,
        LockLevel::Experimental,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LockLevel::Frozen => "frozen",
            LockLevel::Restricted => "restricted",
            LockLevel::ApprovalRequired => "approval-required",
            LockLevel::TestsRequired => "tests-required",
            LockLevel::DocsRequired => "docs-required",
            LockLevel::ReviewRequired => "review-required",
            LockLevel::Normal => "normal",
            LockLevel::Experimental => "experimental",
        }
    }

    /// Valid level names joined for diagnostic messages
    pub fn valid_set() -> String {
        Self::ALL
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::str::FromStr for LockLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "frozen" => Ok(LockLevel::Frozen),
            "restricted" => Ok(LockLevel::Restricted),
            "approval-required" => Ok(LockLevel::ApprovalRequired),
            "tests-required" => Ok(LockLevel::TestsRequired),
            "docs-required" => Ok(LockLevel::DocsRequired),
            "review-required" => Ok(LockLevel::ReviewRequired),
            "normal" => Ok(LockLevel::Normal),
            "experimental" => Ok(LockLevel::Experimental),
            _ => Err(format!("Unknown lock level: {}", s)),
        }
    }
}

impl std::fmt::Display for LockLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Semantic problem found by namespace/value validation.
///
/// The grammar matcher attaches source ranges and severities; this layer
/// only decides what is wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticIssue {
    UnknownNamespace { namespace: String },
    MissingValue { namespace: String },
    InvalidLockLevel { value: String },
}

impl SemanticIssue {
    pub fn message(&self) -> String {
        match self {
            SemanticIssue::UnknownNamespace { namespace } => {
                format!("Unknown annotation namespace `{}`", namespace)
            }
            SemanticIssue::MissingValue { namespace } => {
                format!("Annotation `{}` requires a value", namespace)
            }
            SemanticIssue::InvalidLockLevel { value } => {
                format!(
                    "Invalid lock level `{}` (valid: {})",
                    value,
                    LockLevel::valid_set()
                )
            }
        }
    }
}

/// @acp:summary "Validate a namespace and its value"
pub fn validate(namespace: &str, value: Option<&str>) -> Vec<SemanticIssue> {
    let mut issues = Vec::new();

    if classify(namespace).is_none() {
        issues.push(SemanticIssue::UnknownNamespace {
            namespace: namespace.to_string(),
        });
    }

    match value {
        None if !is_value_optional(namespace) => {
            issues.push(SemanticIssue::MissingValue {
                namespace: namespace.to_string(),
            });
        }
        Some(v) if namespace == "lock" => {
            if v.parse::<LockLevel>().is_err() {
                issues.push(SemanticIssue::InvalidLockLevel {
                    value: v.to_string(),
                });
            }
        }
        _ => {}
    }

    issues
}
