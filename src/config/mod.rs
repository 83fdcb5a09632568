//! @acp:module "Configuration"
//! @acp:summary "Project configuration loading and defaults (schema-compliant)"
//! @acp:domain engine
//! @acp:layer config

use serde::{Deserialize, Serialize};

use crate::vars::DuplicatePolicy;

fn default_config_schema() -> String {
    "https://acp-protocol.dev/schemas/v1/engine.schema.json".to_string()
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// @acp:summary "Main engine configuration structure (schema-compliant)"
/// @acp:lock(normal)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// JSON Schema URL for validation
    #[serde(rename = "$schema", default = "default_config_schema")]
    pub schema: String,

    /// ACP specification version
    #[serde(default = "default_version")]
    pub version: String,

    /// File patterns to include (glob syntax)
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// File patterns to exclude (glob syntax)
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Variable declaration source configuration
    #[serde(default)]
    pub vars: VarsConfig,

    /// Implementation limits
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema: default_config_schema(),
            version: default_version(),
            include: default_include(),
            exclude: default_exclude(),
            vars: VarsConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

impl Config {
    /// @acp:summary "Load config from .acp.config.json file"
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// @acp:summary "Save config to a file"
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// @acp:summary "Load from default location or create default config"
    pub fn load_or_default() -> Self {
        Self::load(".acp.config.json").unwrap_or_default()
    }
}

fn default_include() -> Vec<String> {
    vec![
        "**/*.ts".to_string(),
        "**/*.tsx".to_string(),
        "**/*.js".to_string(),
        "**/*.jsx".to_string(),
        "**/*.rs".to_string(),
        "**/*.py".to_string(),
        "**/*.go".to_string(),
        "**/*.java".to_string(),
        "**/*.cs".to_string(),
        "**/*.rb".to_string(),
        "**/*.php".to_string(),
        "**/*.swift".to_string(),
        "**/*.kt".to_string(),
    ]
}

fn default_exclude() -> Vec<String> {
    vec![
        // Package managers
        "**/node_modules/**".to_string(),
        "**/vendor/**".to_string(),
        // Build outputs
        "**/dist/**".to_string(),
        "**/build/**".to_string(),
        "**/target/**".to_string(),
        "**/out/**".to_string(),
        // Cache/temp
        "**/.cache/**".to_string(),
        "**/coverage/**".to_string(),
        "**/__pycache__/**".to_string(),
        // VCS
        "**/.git/**".to_string(),
        // IDE
        "**/.idea/**".to_string(),
        "**/.vscode/**".to_string(),
    ]
}

/// @acp:summary "Variable declaration source configuration"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarsConfig {
    /// Glob patterns locating declaration source files
    #[serde(default = "default_vars_sources")]
    pub sources: Vec<String>,

    /// Which declaration wins when two sources declare the same name
    #[serde(default, rename = "duplicatePolicy")]
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for VarsConfig {
    fn default() -> Self {
        Self {
            sources: default_vars_sources(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

fn default_vars_sources() -> Vec<String> {
    vec!["**/*.vars.json".to_string()]
}

/// @acp:summary "Implementation limits (schema-compliant)"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum source file size in MB
    #[serde(default = "default_max_file_size", rename = "maxFileSizeMb")]
    pub max_file_size_mb: usize,

    /// Maximum annotations per file
    #[serde(default = "default_max_annotations", rename = "maxAnnotationsPerFile")]
    pub max_annotations_per_file: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size(),
            max_annotations_per_file: default_max_annotations(),
        }
    }
}

fn default_max_file_size() -> usize {
    10
}

fn default_max_annotations() -> usize {
    1000
}
