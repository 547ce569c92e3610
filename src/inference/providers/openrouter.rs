//! OpenRouter backend using the Chat Completions API (non-streaming).
//!
//! The model is asked to put generated test cases after an
//! `=== ARTIFACT: <title> ===` line; `GeneratedTurn::from_reply` splits there.

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::core::config::{DEFAULT_MAX_ATTACHMENT_CHARS, DEFAULT_OPENROUTER_BASE_URL};
use crate::core::staging::{PayloadHandle, StagedAttachment};
use crate::core::turn::{Role as TurnRole, Turn};
use crate::inference::types::ARTIFACT_MARKER_PREFIX;
use crate::inference::{GeneratedTurn, GenerationError, GenerationProvider, GenerationRequest};

// ============================================================================
// Chat Completions API Types
// ============================================================================

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Role {
    System,
    User,
    Assistant,
}

#[derive(Serialize, Debug, Clone)]
struct ChatMessage {
    role: Role,
    content: String,
}

#[derive(Serialize, Debug)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// ============================================================================
// Translation Layer
// ============================================================================

/// Prior turns as chat messages. Assistant artifacts are replayed after the
/// marker line so the model sees its earlier output in the same shape.
fn history_to_messages(history: &[Turn]) -> Vec<ChatMessage> {
    history
        .iter()
        .map(|turn| match turn.role() {
            TurnRole::User => ChatMessage {
                role: Role::User,
                content: turn.content().to_string(),
            },
            TurnRole::Assistant => {
                let content = match turn.artifact() {
                    Some(artifact) => format!(
                        "{}\n\n{} {} ===\n{}",
                        turn.content(),
                        ARTIFACT_MARKER_PREFIX,
                        artifact.title,
                        artifact.body
                    ),
                    None => turn.content().to_string(),
                };
                ChatMessage {
                    role: Role::Assistant,
                    content,
                }
            }
        })
        .collect()
}

fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => (&text[..cut], true),
        None => (text, false),
    }
}

/// Inlines a `text/*` attachment; anything else is referenced by name and type.
async fn attachment_block(
    attachment: &StagedAttachment,
    max_chars: usize,
) -> Result<String, GenerationError> {
    let header = format!(
        "[Attached document: {} ({})]",
        attachment.display_name, attachment.media_type
    );
    if !attachment.media_type.starts_with("text/") {
        return Ok(header);
    }

    let text = match &attachment.payload {
        PayloadHandle::File(path) => {
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| GenerationError::Attachment {
                    name: attachment.display_name.clone(),
                    message: e.to_string(),
                })?
        }
        PayloadHandle::Memory(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    };
    let (inlined, truncated) = truncate_chars(&text, max_chars);
    if truncated {
        debug!(
            "Attachment {} truncated to {} chars",
            attachment.display_name, max_chars
        );
    }
    Ok(format!(
        "{header}\n{inlined}{}",
        if truncated { "\n[...truncated]" } else { "" }
    ))
}

// ============================================================================
// Provider Implementation
// ============================================================================

pub struct OpenRouterProvider {
    api_key: String,
    base_url: String,
    system_prompt: Option<String>,
    max_attachment_chars: usize,
    client: reqwest::Client,
}

impl OpenRouterProvider {
    /// `base_url` defaults to OpenRouter's public API.
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_OPENROUTER_BASE_URL.to_string()),
            system_prompt: None,
            max_attachment_chars: DEFAULT_MAX_ATTACHMENT_CHARS,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_attachment_chars(mut self, max_chars: usize) -> Self {
        self.max_attachment_chars = max_chars;
        self
    }

    async fn build_messages(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<ChatMessage>, GenerationError> {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        if let Some(prompt) = &self.system_prompt {
            messages.push(ChatMessage {
                role: Role::System,
                content: prompt.clone(),
            });
        }
        messages.extend(history_to_messages(&request.history));

        let mut content = request.user_turn.content().to_string();
        for attachment in &request.attachments {
            content.push_str("\n\n");
            content.push_str(&attachment_block(attachment, self.max_attachment_chars).await?);
        }
        messages.push(ChatMessage {
            role: Role::User,
            content,
        });
        Ok(messages)
    }

    async fn send_request(&self, request: &ChatRequest) -> Result<String, GenerationError> {
        let json_body = serde_json::to_string(request)
            .map_err(|e| GenerationError::Parse(format!("request serialization failed: {e}")))?;
        debug!("OpenRouter request body: {} bytes", json_body.len());

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .body(json_body)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        debug!("OpenRouter response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let err_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("OpenRouter API error: {} - {}", status, err_body);
            return Err(GenerationError::Api {
                status,
                message: err_body,
            });
        }

        response
            .text()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))
    }
}

#[async_trait]
impl GenerationProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedTurn, GenerationError> {
        let chat_request = ChatRequest {
            model: request.model.clone(),
            messages: self.build_messages(&request).await?,
            stream: false,
        };
        info!(
            "OpenRouter chat request: model={}, messages={}, attachments={}",
            chat_request.model,
            chat_request.messages.len(),
            request.attachments.len()
        );

        let body = self.send_request(&chat_request).await?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| GenerationError::Parse(e.to_string()))?;
        let reply = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)?;

        let turn = GeneratedTurn::from_reply(&reply);
        info!(
            "OpenRouter reply: {} chars, artifact: {}",
            reply.len(),
            turn.artifact
                .as_ref()
                .map(|a| a.title.as_str())
                .unwrap_or("none")
        );
        Ok(turn)
    }
}
