//! Gemini provider implementation for gemchat
//!
//! This module implements the Provider trait for the Gemini
//! generative-language REST API (`generateContent` and model listing).
//! The API key travels only as the `key` query parameter.

use crate::config::ProviderConfig;
use crate::error::{GemchatError, Result};
use crate::providers::{Message, ModelInfo, Provider};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gemini API provider
///
/// # Examples
///
/// ```no_run
/// use gemchat::config::ProviderConfig;
/// use gemchat::providers::{GeminiProvider, Message, Provider};
///
/// # async fn example() -> gemchat::error::Result<()> {
/// let provider = GeminiProvider::new(&ProviderConfig::default(), Some("my-key".to_string()))?;
/// let reply = provider
///     .complete(&[Message::user("Hello!")], "", "gemini-2.0-flash")
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct GeminiProvider {
    client: Client,
    api_base: String,
    api_key: Option<String>,
}

/// Request body for `models/{model}:generateContent`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiInstruction>,
}

/// One turn of the conversation in API format
#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

/// System instruction block (no role)
#[derive(Debug, Serialize)]
struct GeminiInstruction {
    parts: Vec<GeminiPart>,
}

/// Text part; non-text parts deserialize with an empty string
#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

/// Response body from `generateContent`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Error envelope returned with non-2xx statuses
#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Response from the `models` listing endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<GeminiModel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiModel {
    name: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    input_token_limit: Option<usize>,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

impl GeminiProvider {
    /// Create a new Gemini provider instance
    ///
    /// # Arguments
    ///
    /// * `config` - Provider configuration (API base and timeout)
    /// * `api_key` - Resolved API key; `None` makes every call fail with
    ///   `GemchatError::MissingCredentials`
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    ///
    /// # Examples
    ///
    /// ```
    /// use gemchat::config::ProviderConfig;
    /// use gemchat::providers::GeminiProvider;
    ///
    /// let provider = GeminiProvider::new(&ProviderConfig::default(), None);
    /// assert!(provider.is_ok());
    /// ```
    pub fn new(config: &ProviderConfig, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("gemchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(GemchatError::Http)?;

        let api_key = api_key.filter(|k| !k.trim().is_empty());

        tracing::info!(
            "Initialized Gemini provider: api_base={}, credential={}",
            config.api_base,
            if api_key.is_some() { "set" } else { "missing" }
        );

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Get the configured API base URL
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Returns true if an API key is available
    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    fn require_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| GemchatError::MissingCredentials("gemini".to_string()).into())
    }

    /// Convert gemchat messages to API contents
    fn convert_messages(messages: &[Message]) -> Vec<GeminiContent> {
        messages
            .iter()
            .map(|m| GeminiContent {
                role: m.role.as_str().to_string(),
                parts: vec![GeminiPart {
                    text: m.text.clone(),
                }],
            })
            .collect()
    }

    fn build_request(messages: &[Message], instruction: &str) -> GenerateContentRequest {
        let system_instruction = if instruction.trim().is_empty() {
            None
        } else {
            Some(GeminiInstruction {
                parts: vec![GeminiPart {
                    text: instruction.to_string(),
                }],
            })
        };

        GenerateContentRequest {
            contents: Self::convert_messages(messages),
            system_instruction,
        }
    }

    /// Collect the text of the first candidate
    fn extract_text(response: GenerateContentResponse) -> Result<String> {
        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            tracing::warn!("Gemini blocked the prompt: {}", reason);
        }

        let Some(candidate) = response.candidates.into_iter().next() else {
            return Err(GemchatError::EmptyResponse.into());
        };

        if let Some(reason) = &candidate.finish_reason {
            tracing::debug!("Gemini finish reason: {}", reason);
        }

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GemchatError::EmptyResponse.into());
        }

        Ok(text)
    }
}

/// Strip a leading `models/` so both naming forms are accepted
fn normalize_model_name(model: &str) -> &str {
    model.strip_prefix("models/").unwrap_or(model)
}

/// Turn a non-success response body into a readable message
fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<GeminiErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => {
            if envelope.error.status.is_empty() {
                format!("Gemini returned {}: {}", status, envelope.error.message)
            } else {
                format!(
                    "Gemini returned {} ({}): {}",
                    status, envelope.error.status, envelope.error.message
                )
            }
        }
        _ => format!("Gemini returned {}: {}", status, body),
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn complete(
        &self,
        messages: &[Message],
        instruction: &str,
        model: &str,
    ) -> Result<String> {
        let key = self.require_key()?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base,
            normalize_model_name(model)
        );
        let request = Self::build_request(messages, instruction);

        tracing::debug!(
            "Sending Gemini request: model={}, {} messages, instruction={}",
            model,
            request.contents.len(),
            request.system_instruction.is_some()
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                tracing::error!("Gemini request failed: {}", e);
                GemchatError::Provider(format!("Gemini request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Gemini returned error {}: {}", status, error_text);
            return Err(GemchatError::Provider(describe_error(status, &error_text)).into());
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            let e = e.without_url();
            tracing::error!("Failed to parse Gemini response: {}", e);
            GemchatError::Provider(format!("Failed to parse Gemini response: {}", e))
        })?;

        let text = Self::extract_text(body)?;
        tracing::debug!("Gemini reply: {} chars", text.len());
        Ok(text)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let key = self.require_key()?;
        let url = format!("{}/v1beta/models", self.api_base);
        tracing::debug!("Fetching models from Gemini: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("key", key), ("pageSize", "1000")])
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                tracing::warn!("Failed to fetch Gemini models: {}", e);
                GemchatError::Provider(format!("Failed to fetch models: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Gemini returned error {}: {}", status, error_text);
            return Err(GemchatError::Provider(describe_error(status, &error_text)).into());
        }

        let listing: ListModelsResponse = response.json().await.map_err(|e| {
            let e = e.without_url();
            tracing::error!("Failed to parse Gemini models response: {}", e);
            GemchatError::Provider(format!("Failed to parse models response: {}", e))
        })?;

        let models: Vec<ModelInfo> = listing
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|method| method == "generateContent")
            })
            .map(|m| {
                let name = normalize_model_name(&m.name).to_string();
                let display_name = if m.display_name.is_empty() {
                    name.clone()
                } else {
                    m.display_name
                };
                ModelInfo {
                    name,
                    display_name,
                    input_token_limit: m.input_token_limit,
                }
            })
            .collect();

        tracing::debug!("Fetched {} models from Gemini", models.len());
        Ok(models)
    }
}
