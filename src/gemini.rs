//! Gemini REST client
//!
//! A thin async wrapper around the `generateContent` endpoint of the Gemini
//! v1beta API, carrying just enough of the wire format for tool-augmented
//! generation: contents with text, function-call, and function-response
//! parts, plus tool declarations. Constructed once with explicit credentials
//! and reused across calls; it holds no conversation state of its own.

use crate::config::GeminiConfig;
use crate::WeatherChatError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

/// One conversation turn on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// A user turn holding plain text
    #[must_use]
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part::text(text)],
        }
    }

    /// A user turn carrying tool results back to the model
    #[must_use]
    pub fn function_responses(responses: Vec<FunctionResponse>) -> Self {
        Self {
            role: "user".to_string(),
            parts: responses
                .into_iter()
                .map(|response| Part {
                    text: None,
                    function_call: None,
                    function_response: Some(response),
                })
                .collect(),
        }
    }

    /// Function calls requested in this turn
    #[must_use]
    pub fn function_calls(&self) -> Vec<&FunctionCall> {
        self.parts
            .iter()
            .filter_map(|part| part.function_call.as_ref())
            .collect()
    }

    /// Concatenated text of this turn
    #[must_use]
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

/// One part of a turn: text, a tool invocation, or a tool result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,
}

impl Part {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            function_call: None,
            function_response: None,
        }
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

/// A tool result handed back to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

/// A callable tool declared to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Tool block of a request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tools: &'a [Tool],
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Async client for the Gemini `generateContent` endpoint
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Build a client from configuration; the API key is mandatory here
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| {
                WeatherChatError::config(
                    "Gemini API key is required. Pass --api-key or set WEATHERCHAT_GEMINI__API_KEY.",
                )
            })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("weatherchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        Ok(Self {
            http,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }

    /// Submit the conversation and declared tools; return the model's turn
    #[instrument(skip_all, fields(turns = contents.len()))]
    pub async fn generate(&self, contents: &[Content], tools: &[Tool]) -> Result<Content> {
        let request = GenerateContentRequest { contents, tools };

        let response = self
            .http
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .with_context(|| "Failed to reach the Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherChatError::api(format!(
                "Gemini API returned {status}: {body}"
            ))
            .into());
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse Gemini API response")?;

        debug!("Received {} candidate(s)", parsed.candidates.len());

        parsed
            .candidates
            .into_iter()
            .find_map(|candidate| candidate.content)
            .ok_or_else(|| {
                WeatherChatError::api("Gemini API response contained no candidates").into()
            })
    }
}
