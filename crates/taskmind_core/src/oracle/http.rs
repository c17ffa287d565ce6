//! OpenAI-compatible `chat/completions` client.
//!
//! # Invariants
//! - Requests are non-streaming and bounded by the configured timeout.
//! - Non-2xx statuses and bodies without message content are errors.
//! - Only sizes and status codes are logged, never message text.

use crate::config::AssistantConfig;
use crate::oracle::history::{ChatMessage, ConversationHistory};
use crate::oracle::{ChatOracle, OracleError};
use log::{debug, warn};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Placeholder key shipped in sample configs.
pub const PLACEHOLDER_API_KEY: &str = "your_api_key_here";

pub const SYSTEM_PROMPT: &str = "你是一个智能待办事项助手，帮助用户管理任务。\
用户的每条消息前会附带当前待办事项数据。请根据四象限（重要/紧急）和GTD方法给出简洁、可执行的建议。\
涉及添加、删除、完成任务时，提示用户直接使用“添加任务：…”“删除任务ID:3”“完成第2个”这样的指令。";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Blocking HTTP chat backend.
pub struct HttpChatOracle {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl HttpChatOracle {
    /// Builds a client from assistant settings.
    ///
    /// # Errors
    /// - `OracleError::NotConfigured` in offline mode or without a real key.
    /// - `OracleError::Transport` when the HTTP client cannot be built.
    pub fn from_config(config: &AssistantConfig) -> Result<Self, OracleError> {
        let api_key = config.api_key.trim();
        if config.offline_mode || api_key.is_empty() || api_key == PLACEHOLDER_API_KEY {
            return Err(OracleError::NotConfigured);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn build_messages(text: &str, history: &ConversationHistory) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() * 2 + 2);
        messages.push(ChatMessage::system(SYSTEM_PROMPT));
        messages.extend(history.messages());
        messages.push(ChatMessage::user(text));
        messages
    }
}

impl ChatOracle for HttpChatOracle {
    fn request(&self, text: &str, history: &ConversationHistory) -> Result<String, OracleError> {
        let started_at = Instant::now();
        let body = ChatRequest {
            model: &self.model,
            messages: Self::build_messages(text, history),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|err| {
                warn!(
                    "event=oracle_request module=oracle status=error error_code=transport duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                OracleError::Transport(err)
            })?;

        let status = response.status();
        let raw = response.text()?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&raw)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown").to_string());
            warn!(
                "event=oracle_request module=oracle status=error error_code=http_status http_status={} duration_ms={}",
                status.as_u16(),
                started_at.elapsed().as_millis()
            );
            return Err(OracleError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let content = parse_completion(&raw)?;
        debug!(
            "event=oracle_request module=oracle status=ok history_turns={} reply_chars={} duration_ms={}",
            history.len(),
            content.chars().count(),
            started_at.elapsed().as_millis()
        );
        Ok(content)
    }
}

/// Extracts the first choice's message content from a completion body.
pub fn parse_completion(raw: &str) -> Result<String, OracleError> {
    let parsed: ChatResponse = serde_json::from_str(raw)
        .map_err(|err| OracleError::InvalidResponse(format!("malformed body: {err}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| OracleError::InvalidResponse("response has no message content".to_string()))
}
