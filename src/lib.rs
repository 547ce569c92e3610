//! casegen: a terminal assistant that turns requirement documents into test cases.

use std::sync::Arc;

use clap::ValueEnum;

pub mod core;
pub mod inference;
pub mod tui;

#[cfg(test)]
pub mod test_support;

use crate::core::config::{ConfigError, ResolvedConfig};
use crate::inference::{GenerationProvider, OpenRouterProvider, ScriptedProvider};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Offline canned replies
    #[default]
    Scripted,
    /// OpenRouter chat completions
    #[value(name = "openrouter")]
    OpenRouter,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Scripted => "scripted",
            Backend::OpenRouter => "openrouter",
        }
    }

    /// Parses a config/env value. Unknown names fall back to `Scripted`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "openrouter" => Backend::OpenRouter,
            "scripted" => Backend::Scripted,
            other => {
                log::warn!("Unknown backend '{}', using scripted", other);
                Backend::Scripted
            }
        }
    }
}

/// Build the generation backend named by the resolved config.
pub fn build_provider(config: &ResolvedConfig) -> Result<Arc<dyn GenerationProvider>, ConfigError> {
    match Backend::from_name(&config.backend) {
        Backend::Scripted => Ok(Arc::new(ScriptedProvider::new(config.scripted_latency))),
        Backend::OpenRouter => {
            let api_key = config
                .openrouter_api_key
                .clone()
                .ok_or(ConfigError::MissingApiKey)?;
            Ok(Arc::new(
                OpenRouterProvider::new(api_key, Some(config.openrouter_base_url.clone()))
                    .with_system_prompt(config.system_prompt.clone())
                    .with_max_attachment_chars(config.max_attachment_chars),
            ))
        }
    }
}
