//! Configuration system for ragcheck.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> CLI args.
//! Configuration is loaded from `~/.config/ragcheck/config.toml` and/or `.ragcheck/config.toml`
//! in the workspace directory.

use crate::audit::AuditFormat;
use crate::error::ConfigError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for a verification run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// General instruction-following model used by the contradiction judge
    /// and the omission detector.
    pub judge: LlmConfig,
    /// Narrow entailment classifier used per claim.
    #[serde(default = "LlmConfig::entailment_default")]
    pub entailment: LlmConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// How to treat a verdict list whose length differs from the claim list.
    #[serde(default)]
    pub alignment: AlignmentPolicy,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            judge: LlmConfig::default(),
            entailment: LlmConfig::entailment_default(),
            audit: AuditConfig::default(),
            retrieval: RetrievalConfig::default(),
            alignment: AlignmentPolicy::default(),
        }
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name: "openai", "ollama", "vllm", "local", "mock".
    pub provider: String,
    /// Model identifier (e.g., "gpt-4o", "bespoke-minicheck").
    pub model: String,
    /// Environment variable name containing the API key.
    pub api_key_env: String,
    /// Explicit API key. Takes precedence over `api_key_env`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Optional base URL override for the API endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Maximum tokens to generate in a response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
    /// Sampling temperature. Judges run deterministic by default.
    pub temperature: f32,
    /// Context window size for the model.
    pub context_window: usize,
    /// Transport timeout in seconds. `None` leaves the call unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            base_url: None,
            max_tokens: None,
            temperature: 0.0,
            context_window: 128_000,
            timeout_secs: None,
        }
    }
}

impl LlmConfig {
    /// Defaults for the entailment classifier: a local Ollama-served
    /// MiniCheck model answering "Yes"/"No".
    pub fn entailment_default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "bespoke-minicheck".to_string(),
            api_key_env: "OLLAMA_API_KEY".to_string(),
            base_url: Some("http://localhost:11434/v1".to_string()),
            context_window: 32_768,
            ..Self::default()
        }
    }

    /// Validate this LLM config and return any warnings.
    ///
    /// Returns an empty Vec if the config is valid. Returns human-readable
    /// warning messages for problematic values.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if let Some(max_tokens) = self.max_tokens
            && max_tokens >= self.context_window
        {
            warnings.push(format!(
                "max_tokens ({}) >= context_window ({}); responses may be truncated or fail",
                max_tokens, self.context_window
            ));
        }
        if self.temperature < 0.0 || self.temperature > 2.0 {
            warnings.push(format!(
                "temperature ({}) is outside the typical range 0.0–2.0",
                self.temperature
            ));
        }
        if self.temperature > 0.0 {
            warnings.push(format!(
                "temperature ({}) is non-zero; judge verdicts will not be reproducible",
                self.temperature
            ));
        }
        if self.model.trim().is_empty() {
            warnings.push("model is empty".to_string());
        }
        warnings
    }
}

/// Audit log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether validation runs are written to the audit log.
    pub enabled: bool,
    /// JSONL file the audit log appends to. Defaults to the project data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Line format of the audit log.
    #[serde(default)]
    pub format: AuditFormat,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            format: AuditFormat::default(),
        }
    }
}

impl AuditConfig {
    /// The effective audit log path.
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_audit_path)
    }
}

/// Retrieval query defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum number of passages requested from the retriever.
    pub limit: usize,
    /// Optional `key=value` metadata filter applied to every query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            limit: 10,
            filter: None,
        }
    }
}

/// Policy for verdict lists whose length does not match the claim list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentPolicy {
    /// A length mismatch fails the stage.
    #[default]
    Strict,
    /// A length mismatch is logged and the returned verdicts are tallied as-is.
    Lenient,
}

impl std::fmt::Display for AlignmentPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlignmentPolicy::Strict => write!(f, "strict"),
            AlignmentPolicy::Lenient => write!(f, "lenient"),
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("dev", "ragcheck", "ragcheck")
}

/// Default location of the audit log: `<data dir>/audit.jsonl`.
pub fn default_audit_path() -> PathBuf {
    project_dirs()
        .map(|d| d.data_dir().join("audit.jsonl"))
        .unwrap_or_else(|| PathBuf::from("ragcheck-audit.jsonl"))
}

/// Default directory for rolling diagnostic logs.
pub fn default_log_dir() -> PathBuf {
    project_dirs()
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Load configuration with layered sources.
///
/// Order (later wins): defaults, user config, workspace config,
/// `RAGCHECK_*` environment variables, explicit overrides.
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&VerifierConfig>,
) -> Result<VerifierConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(VerifierConfig::default()));

    // User-level config
    if let Some(config_dir) = project_dirs() {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = ws.join(".ragcheck").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // Environment variables (RAGCHECK_JUDGE__MODEL, RAGCHECK_ALIGNMENT, etc.)
    figment = figment.merge(Env::prefixed("RAGCHECK_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(parse_error)
}

/// Load configuration from a single explicit TOML file layered over defaults.
///
/// Unlike the layered loader, a missing file is an error.
pub fn load_config_file(path: &Path) -> Result<VerifierConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Figment::from(Serialized::defaults(VerifierConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("RAGCHECK_").split("__"))
        .extract()
        .map_err(parse_error)
}

fn parse_error(err: figment::Error) -> ConfigError {
    ConfigError::ParseError {
        message: err.to_string(),
    }
}

/// Check whether any ragcheck configuration file exists (user-level or workspace-level).
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if let Some(config_dir) = project_dirs()
        && config_dir.config_dir().join("config.toml").exists()
    {
        return true;
    }

    if let Some(ws) = workspace
        && ws.join(".ragcheck").join("config.toml").exists()
    {
        return true;
    }

    false
}
