//! # Configuration
//!
//! Override hierarchy: defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.casegen/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::state::Capabilities;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CasegenConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub openrouter: OpenRouterConfig,
    #[serde(default)]
    pub scripted: ScriptedConfig,
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub default_backend: Option<String>,
    pub default_model: Option<String>,
    pub user_name: Option<String>,
    pub system_prompt: Option<String>,
    pub system_prompt_file: Option<String>,
    pub generation_timeout_secs: Option<u64>,
    pub download_dir: Option<PathBuf>,
    pub attachments: Option<bool>,
    pub preview: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct OpenRouterConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub max_attachment_chars: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ScriptedConfig {
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModelEntry {
    pub name: String,
    pub description: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BACKEND: &str = "scripted";
pub const DEFAULT_USER_NAME: &str = "there";
pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_ATTACHMENT_CHARS: usize = 50_000;
pub const DEFAULT_SCRIPTED_LATENCY_MS: u64 = 2000;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a QA assistant that turns functional specification \
    documents (FSDs) and change requests (CRs) into test cases. \
    Start with a short analysis of the requirement in plain prose. \
    When you produce test cases, put them after a line of the form \
    `=== ARTIFACT: <title> ===` and write them in Markdown, one bold heading per case \
    followed by Preconditions, Steps and Expected Result.";

/// Built-in picker entries used when the config lists none. The first is the default.
pub fn builtin_models() -> Vec<ModelEntry> {
    [
        ("Cortexa-4 Pro", "Most capable model"),
        ("Cortexa-3.5 Turbo", "Balanced performance"),
        ("Legacy Model", "Previous generation"),
    ]
    .into_iter()
    .map(|(name, description)| ModelEntry {
        name: name.to_string(),
        description: Some(description.to_string()),
    })
    .collect()
}

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub backend: String,
    pub model_name: String,
    pub user_name: String,
    pub system_prompt: String,
    pub generation_timeout: Duration,
    pub download_dir: Option<PathBuf>,
    pub capabilities: Capabilities,
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub max_attachment_chars: usize,
    pub scripted_latency: Duration,
    pub models: Vec<ModelEntry>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    MissingApiKey,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::MissingApiKey => write!(
                f,
                "OpenRouter API key must be set (config file, OPENROUTER_API_KEY env var, or --backend scripted)"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".casegen"))
}

/// Returns the path to `~/.casegen/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load config from `~/.casegen/config.toml`, generating a commented
/// default when the file doesn't exist yet.
pub fn load_config() -> Result<CasegenConfig, ConfigError> {
    let Some(path) = config_path() else {
        warn!("Could not determine home directory, using default config");
        return Ok(CasegenConfig::default());
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<CasegenConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(CasegenConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: CasegenConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

fn generate_default_config(path: &Path) {
    let default_content = r#"# casegen configuration
# Every setting is optional. Override order: defaults, this file, env vars, CLI flags.

# [general]
# default_backend = "scripted"          # "scripted" (offline demo) or "openrouter"
# default_model = "Cortexa-4 Pro"
# user_name = "Alex"                    # used in the landing greeting
# system_prompt = "You are a QA assistant."
# system_prompt_file = "system.md"      # path relative to ~/.casegen/
# generation_timeout_secs = 120
# download_dir = "/home/me/Downloads"
# attachments = true                    # allow /attach
# preview = true                        # allow the artifact preview panel

# [openrouter]
# api_key = "sk-or-..."                 # or set OPENROUTER_API_KEY
# base_url = "https://openrouter.ai/api/v1"
# max_attachment_chars = 50000

# [scripted]
# latency_ms = 2000

# [[models]]
# name = "anthropic/claude-sonnet-4"
# description = "Balanced reasoning"
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Collapses defaults → config file → env vars → CLI into concrete values.
///
/// `cli_backend` and `cli_model` are from CLI flags (None = not specified).
pub fn resolve(
    config: &CasegenConfig,
    cli_backend: Option<&str>,
    cli_model: Option<&str>,
) -> ResolvedConfig {
    resolve_with_env(config, cli_backend, cli_model, |key| std::env::var(key).ok())
}

fn resolve_with_env(
    config: &CasegenConfig,
    cli_backend: Option<&str>,
    cli_model: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    let models = if config.models.is_empty() {
        builtin_models()
    } else {
        config.models.clone()
    };

    let backend = cli_backend
        .map(str::to_string)
        .or_else(|| env("CASEGEN_BACKEND"))
        .or_else(|| config.general.default_backend.clone())
        .unwrap_or_else(|| DEFAULT_BACKEND.to_string());

    let model_name = cli_model
        .map(str::to_string)
        .or_else(|| env("CASEGEN_MODEL"))
        .or_else(|| config.general.default_model.clone())
        .unwrap_or_else(|| models[0].name.clone());

    let openrouter_api_key = env("OPENROUTER_API_KEY").or_else(|| config.openrouter.api_key.clone());
    let openrouter_base_url = env("OPENROUTER_BASE_URL")
        .or_else(|| config.openrouter.base_url.clone())
        .unwrap_or_else(|| DEFAULT_OPENROUTER_BASE_URL.to_string());

    let general = &config.general;
    ResolvedConfig {
        backend,
        model_name,
        user_name: general
            .user_name
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_NAME.to_string()),
        system_prompt: resolve_system_prompt(config),
        generation_timeout: Duration::from_secs(
            general
                .generation_timeout_secs
                .unwrap_or(DEFAULT_GENERATION_TIMEOUT_SECS),
        ),
        download_dir: general.download_dir.clone(),
        capabilities: Capabilities {
            attachments: general.attachments.unwrap_or(true),
            preview: general.preview.unwrap_or(true),
        },
        openrouter_api_key,
        openrouter_base_url,
        max_attachment_chars: config
            .openrouter
            .max_attachment_chars
            .unwrap_or(DEFAULT_MAX_ATTACHMENT_CHARS),
        scripted_latency: Duration::from_millis(
            config
                .scripted
                .latency_ms
                .unwrap_or(DEFAULT_SCRIPTED_LATENCY_MS),
        ),
        models,
    }
}

/// Inline prompt wins over the file, both win over the built-in prompt.
fn resolve_system_prompt(config: &CasegenConfig) -> String {
    if let Some(ref prompt) = config.general.system_prompt {
        return prompt.clone();
    }

    if let Some(ref file) = config.general.system_prompt_file
        && let Some(dir) = config_dir()
    {
        let prompt_path = dir.join(file);
        match fs::read_to_string(&prompt_path) {
            Ok(contents) => {
                let trimmed = contents.trim().to_string();
                if !trimmed.is_empty() {
                    info!("Loaded system prompt from {}", prompt_path.display());
                    return trimmed;
                }
                warn!("System prompt file is empty: {}", prompt_path.display());
            }
            Err(e) => {
                warn!(
                    "Failed to read system prompt file {}: {}",
                    prompt_path.display(),
                    e
                );
            }
        }
    }

    DEFAULT_SYSTEM_PROMPT.to_string()
}
