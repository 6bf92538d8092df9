//! TOML-based configuration for Convene
//!
//! This module provides declarative configuration for the server, session
//! policy, tool adapters and the optional reasoning provider via a TOML file
//! (`convene.toml`).
//!
//! Use `ConfigManager` for thread-safe access to the current configuration.

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::tools::KNOWN_TOOLS;

/// Root configuration structure loaded from convene.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConveneConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    /// Optional reasoning/summarization service
    #[serde(default)]
    pub reasoning: Option<ReasoningConfig>,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

// ============= Session Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Hard wall-clock ceiling for one session's event stream
    #[serde(default = "default_duration_ceiling")]
    pub duration_ceiling_secs: u64,

    #[serde(default = "default_heartbeat")]
    pub heartbeat_secs: u64,

    #[serde(default = "default_tools_per_agent")]
    pub tools_per_agent: usize,

    /// Chance that a non-triggering peer finding earns an agreement
    #[serde(default = "default_agreement_probability")]
    pub agreement_probability: f64,

    /// Fixed seed for the reaction/pacing RNG; entropy-seeded when absent
    #[serde(default)]
    pub reaction_seed: Option<u64>,

    #[serde(default = "default_pacing_min")]
    pub pacing_min_ms: u64,

    #[serde(default = "default_pacing_max")]
    pub pacing_max_ms: u64,

    #[serde(default = "default_max_participants")]
    pub max_participants: usize,
}

fn default_duration_ceiling() -> u64 {
    180
}

fn default_heartbeat() -> u64 {
    15
}

fn default_tools_per_agent() -> usize {
    3
}

fn default_agreement_probability() -> f64 {
    0.35
}

fn default_pacing_min() -> u64 {
    300
}

fn default_pacing_max() -> u64 {
    1200
}

fn default_max_participants() -> usize {
    5
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_ceiling_secs: default_duration_ceiling(),
            heartbeat_secs: default_heartbeat(),
            tools_per_agent: default_tools_per_agent(),
            agreement_probability: default_agreement_probability(),
            reaction_seed: None,
            pacing_min_ms: default_pacing_min(),
            pacing_max_ms: default_pacing_max(),
            max_participants: default_max_participants(),
        }
    }
}

impl SessionConfig {
    pub fn duration_ceiling(&self) -> Duration {
        Duration::from_secs(self.duration_ceiling_secs)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }
}

// ============= Tool Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,

    /// Maximum records kept per tool result
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Character budget for the one-line summary
    #[serde(default = "default_summary_chars")]
    pub summary_chars: usize,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Base URL overrides keyed by tool name
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
}

fn default_tool_timeout() -> u64 {
    10
}

fn default_max_items() -> usize {
    8
}

fn default_summary_chars() -> usize {
    300
}

fn default_user_agent() -> String {
    format!("convene/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_tool_timeout(),
            max_items: default_max_items(),
            summary_chars: default_summary_chars(),
            user_agent: default_user_agent(),
            endpoints: HashMap::new(),
        }
    }
}

impl ToolsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Configured base URL for a tool, or its public default
    pub fn endpoint(&self, tool: &str, default: &str) -> String {
        self.endpoints
            .get(tool)
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| default.to_string())
    }
}

// ============= Reasoning Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        model: String,
    },
    OpenAI {
        /// Environment variable containing API key
        api_key_env: String,
        #[serde(default = "default_openai_base")]
        api_base: String,
        model: String,
    },
}

impl ProviderConfig {
    pub fn model(&self) -> &str {
        match self {
            ProviderConfig::Ollama { model, .. } | ProviderConfig::OpenAI { model, .. } => model,
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    pub provider: ProviderConfig,

    #[serde(default = "default_selection_timeout")]
    pub selection_timeout_secs: u64,

    #[serde(default = "default_synthesis_timeout")]
    pub synthesis_timeout_secs: u64,

    #[serde(default = "default_synthesis_max_chars")]
    pub synthesis_max_chars: usize,
}

fn default_selection_timeout() -> u64 {
    6
}

fn default_synthesis_timeout() -> u64 {
    15
}

fn default_synthesis_max_chars() -> usize {
    600
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Endpoint override references unknown tool '{0}'")]
    UnknownTool(String),
}

impl From<ConfigError> for crate::types::AppError {
    fn from(err: ConfigError) -> Self {
        crate::types::AppError::Config(err.to_string())
    }
}

impl ConveneConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: ConveneConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Load the file if present, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path.as_ref()) {
            Err(ConfigError::FileNotFound(path)) => {
                info!("No configuration at {:?}, using defaults", path);
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Validate the configuration for internal consistency and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        let session = &self.session;

        if !(0.0..=1.0).contains(&session.agreement_probability) {
            return Err(ConfigError::ValidationError(format!(
                "agreement_probability must be within [0, 1], got {}",
                session.agreement_probability
            )));
        }

        if session.pacing_min_ms > session.pacing_max_ms {
            return Err(ConfigError::ValidationError(format!(
                "pacing_min_ms ({}) exceeds pacing_max_ms ({})",
                session.pacing_min_ms, session.pacing_max_ms
            )));
        }

        if session.tools_per_agent < 2 {
            return Err(ConfigError::ValidationError(
                "tools_per_agent must be at least 2".to_string(),
            ));
        }

        if session.duration_ceiling_secs == 0 || session.heartbeat_secs == 0 {
            return Err(ConfigError::ValidationError(
                "duration_ceiling_secs and heartbeat_secs must be positive".to_string(),
            ));
        }

        if session.max_participants == 0 {
            return Err(ConfigError::ValidationError(
                "max_participants must be positive".to_string(),
            ));
        }

        if self.tools.max_items == 0 || self.tools.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "tools.max_items and tools.timeout_secs must be positive".to_string(),
            ));
        }

        if self.tools.summary_chars == 0 {
            return Err(ConfigError::ValidationError(
                "tools.summary_chars must be positive".to_string(),
            ));
        }

        for tool in self.tools.endpoints.keys() {
            if !KNOWN_TOOLS.contains(&tool.as_str()) {
                return Err(ConfigError::UnknownTool(tool.clone()));
            }
        }

        if let Some(reasoning) = &self.reasoning {
            if reasoning.synthesis_max_chars == 0 {
                return Err(ConfigError::ValidationError(
                    "reasoning.synthesis_max_chars must be positive".to_string(),
                ));
            }
            if let ProviderConfig::OpenAI { api_key_env, .. } = &reasoning.provider {
                self.validate_env_var(api_key_env)?;
            }
        }

        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok()
    }
}

// ============= Configuration Manager =============

/// Thread-safe configuration holder with lockless reads and manual reload
pub struct ConfigManager {
    config: Arc<ArcSwap<ConveneConfig>>,
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new configuration manager and load the initial config
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        // Absolute path so reloads are independent of the working directory
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::ReadError)?
                .join(path)
        };

        let config = ConveneConfig::load_or_default(&path)?;

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: path,
        })
    }

    /// Create a config manager directly from a config (useful for testing)
    pub fn from_config(config: ConveneConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: PathBuf::from("test-config.toml"),
        }
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<ConveneConfig> {
        self.config.load_full()
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Reload the configuration from disk; the previous config stays live on error
    pub fn reload(&self) -> Result<(), ConfigError> {
        info!("Reloading configuration from {:?}", self.config_path);

        let new_config = ConveneConfig::load(&self.config_path)?;
        self.config.store(Arc::new(new_config));

        info!("Configuration reloaded successfully");
        Ok(())
    }
}

impl Clone for ConfigManager {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            config_path: self.config_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn create_test_config() -> String {
        r#"
[server]
host = "0.0.0.0"
port = 8080
log_level = "debug"

[session]
duration_ceiling_secs = 90
tools_per_agent = 4
agreement_probability = 0.5
reaction_seed = 7

[tools]
timeout_secs = 5
max_items = 6

[tools.endpoints]
pubmed_search = "http://localhost:9999/eutils/"

[reasoning]
selection_timeout_secs = 4

[reasoning.provider]
type = "ollama"
model = "granite4:tiny-h"
"#
        .to_string()
    }

    #[test]
    fn test_parse_config() {
        let config: ConveneConfig =
            toml::from_str(&create_test_config()).expect("Failed to parse config");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.session.duration_ceiling_secs, 90);
        assert_eq!(config.session.tools_per_agent, 4);
        assert_eq!(config.session.reaction_seed, Some(7));
        assert_eq!(config.tools.max_items, 6);
        assert!(config.validate().is_ok());

        let reasoning = config.reasoning.expect("reasoning section");
        assert_eq!(reasoning.selection_timeout_secs, 4);
        assert_eq!(reasoning.synthesis_timeout_secs, 15);
        assert!(matches!(reasoning.provider, ProviderConfig::Ollama { .. }));
    }

    #[test]
    fn test_defaults() {
        let config: ConveneConfig = toml::from_str("").expect("empty config parses");

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.session.duration_ceiling_secs, 180);
        assert_eq!(config.session.heartbeat_secs, 15);
        assert_eq!(config.session.tools_per_agent, 3);
        assert_eq!(config.tools.timeout_secs, 10);
        assert_eq!(config.tools.max_items, 8);
        assert_eq!(config.tools.summary_chars, 300);
        assert!(config.reasoning.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint_override_trims_trailing_slash() {
        let config: ConveneConfig = toml::from_str(&create_test_config()).unwrap();
        assert_eq!(
            config
                .tools
                .endpoint("pubmed_search", "https://eutils.ncbi.nlm.nih.gov"),
            "http://localhost:9999/eutils"
        );
        assert_eq!(
            config.tools.endpoint("europe_pmc", "https://www.ebi.ac.uk"),
            "https://www.ebi.ac.uk"
        );
    }

    #[test]
    fn test_validation_rejects_probability_out_of_range() {
        let config: ConveneConfig =
            toml::from_str("[session]\nagreement_probability = 1.5\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validation_rejects_inverted_pacing() {
        let config: ConveneConfig =
            toml::from_str("[session]\npacing_min_ms = 500\npacing_max_ms = 100\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_endpoint_tool() {
        let config: ConveneConfig =
            toml::from_str("[tools.endpoints]\nnot_a_tool = \"http://x\"\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownTool(name)) if name == "not_a_tool"
        ));
    }

    #[test]
    fn test_validation_rejects_zero_text_budgets() {
        let config: ConveneConfig = toml::from_str("[tools]\nsummary_chars = 0\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(msg)) if msg.contains("summary_chars")
        ));

        let config: ConveneConfig = toml::from_str(
            r#"
[reasoning]
synthesis_max_chars = 0

[reasoning.provider]
type = "ollama"
model = "llama3.2"
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(msg)) if msg.contains("synthesis_max_chars")
        ));
    }

    #[test]
    fn test_validation_missing_openai_key() {
        let config: ConveneConfig = toml::from_str(
            r#"
[reasoning.provider]
type = "openai"
api_key_env = "CONVENE_TEST_KEY_THAT_IS_NEVER_SET"
model = "gpt-4o-mini"
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }

    #[test]
    fn test_load_from_file_and_reload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", create_test_config()).unwrap();

        let manager = ConfigManager::new(file.path()).unwrap();
        assert_eq!(manager.config().server.port, 8080);

        std::fs::write(file.path(), "[server]\nport = 9090\n").unwrap();

        manager.reload().unwrap();
        assert_eq!(manager.config().server.port, 9090);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConveneConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.port, 3000);
    }
}
