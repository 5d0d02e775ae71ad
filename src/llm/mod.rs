use std::{env, fmt};

use anyhow::{Context, Result, anyhow, bail};
use reqwest::Client;
use serde::Deserialize;

const OPENROUTER_CHAT_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_HF_INFERENCE_URL: &str = "https://api-inference.huggingface.co/models";
const ERROR_PREVIEW_CHARS: usize = 500;

/// Enumerates the supported model backends behind the shared client.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LlmProvider {
    HuggingFace,
    OpenRouter,
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::HuggingFace => write!(f, "huggingface"),
            LlmProvider::OpenRouter => write!(f, "openrouter"),
        }
    }
}

/// Defines the shape of a chat-style interaction with an LLM.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
}

impl LlmRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Individual chat message, compatible with OpenAI compliant providers.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub text: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MessageRole {
    System,
    User,
}

impl MessageRole {
    fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
        }
    }
}

/// A request for the dedicated summarization task of a seq2seq model.
///
/// `instructions` is only used by chat providers, which have no native
/// length controls and receive the bounds through the system prompt.
#[derive(Debug, Clone)]
pub struct SummarizationRequest {
    pub model: String,
    pub text: String,
    pub min_length: u32,
    pub max_length: u32,
    pub instructions: String,
}

/// Captures basic token usage metrics associated with a call.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsage {
    pub prompt_tokens: usize,
    pub response_tokens: usize,
    pub total_tokens: usize,
}

/// Full response surface returned to callers.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub token_usage: TokenUsage,
    pub provider: LlmProvider,
    pub model: String,
}

/// Main entry point for invoking providers.
#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    config: LlmConfig,
}

#[derive(Clone, Default)]
struct LlmConfig {
    huggingface_token: Option<String>,
    huggingface_base_url: String,
    openrouter_api_key: Option<String>,
    openrouter_referer: Option<String>,
    openrouter_title: Option<String>,
}

impl LlmClient {
    /// Build a client using environment variables.
    pub fn from_env() -> Result<Self> {
        let huggingface_base_url = env::var("HF_INFERENCE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HF_INFERENCE_URL.to_string());

        Ok(Self {
            http: Client::builder()
                .build()
                .context("failed to build HTTP client")?,
            config: LlmConfig {
                huggingface_token: env::var("HF_API_TOKEN").ok(),
                huggingface_base_url: huggingface_base_url.trim_end_matches('/').to_string(),
                openrouter_api_key: env::var("OPENROUTER_API_KEY").ok(),
                openrouter_referer: env::var("OPENROUTER_HTTP_REFERER").ok(),
                openrouter_title: env::var("OPENROUTER_X_TITLE").ok(),
            },
        })
    }

    /// Summarize text with the model encoded in the request, deterministically.
    pub async fn summarize(&self, request: SummarizationRequest) -> Result<LlmResponse> {
        let (provider, provider_model) = parse_model_provider(&request.model)?;

        match provider {
            LlmProvider::HuggingFace => self.execute_huggingface(provider_model, &request).await,
            LlmProvider::OpenRouter => {
                self.execute_openrouter(openrouter_chat(provider_model, &request)).await
            }
        }
    }

    async fn execute_huggingface(
        &self,
        model: &str,
        request: &SummarizationRequest,
    ) -> Result<LlmResponse> {
        let payload = serde_json::json!({
            "inputs": request.text,
            "parameters": {
                "min_length": request.min_length,
                "max_length": request.max_length,
                "do_sample": false,
            },
            "options": {
                "wait_for_model": true,
            },
        });

        let url = format!("{}/{}", self.config.huggingface_base_url, model);
        let mut req_builder = self.http.post(&url).json(&payload);
        if let Some(token) = &self.config.huggingface_token {
            req_builder = req_builder.bearer_auth(token);
        }

        let response = req_builder
            .send()
            .await
            .with_context(|| format!("failed to reach Hugging Face inference for {model}"))?;
        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("failed to read response body")?;
        let body: serde_json::Value = serde_json::from_str(&response_text).with_context(|| {
            format!(
                "failed to parse Hugging Face response as JSON. Response body: {}",
                preview(&response_text)
            )
        })?;
        if !status.is_success() {
            bail!("huggingface call failed with status {}: {}", status, body);
        }

        let text = extract_summary_text(&body)
            .ok_or_else(|| anyhow!("unexpected Hugging Face response payload: {}", body))?;

        let prompt_tokens = approximate_token_count(&request.text);
        let response_tokens = approximate_token_count(&text);

        Ok(LlmResponse {
            text,
            token_usage: TokenUsage {
                prompt_tokens,
                response_tokens,
                total_tokens: prompt_tokens + response_tokens,
            },
            provider: LlmProvider::HuggingFace,
            model: model.to_string(),
        })
    }

    async fn execute_openrouter(&self, request: LlmRequest) -> Result<LlmResponse> {
        let Some(api_key) = self.config.openrouter_api_key.as_ref() else {
            bail!("OPENROUTER_API_KEY is not configured but required for OpenRouter requests");
        };

        let prompt_tokens = approximate_token_count(
            &request
                .messages
                .iter()
                .map(|m| m.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        );
        let payload = openrouter_payload(&request);

        let mut req_builder = self
            .http
            .post(OPENROUTER_CHAT_URL)
            .bearer_auth(api_key)
            .json(&payload);

        if let Some(referer) = &self.config.openrouter_referer {
            req_builder = req_builder.header("HTTP-Referer", referer);
        }

        if let Some(title) = &self.config.openrouter_title {
            req_builder = req_builder.header("X-Title", title);
        }

        let response = req_builder.send().await?;
        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("failed to read response body")?;
        let body: serde_json::Value = serde_json::from_str(&response_text).with_context(|| {
            format!(
                "failed to parse OpenRouter response as JSON. Response body: {}",
                preview(&response_text)
            )
        })?;
        if !status.is_success() {
            bail!("openrouter call failed with status {}: {}", status, body);
        }

        let (text, usage) = extract_chat_text_and_usage(&body)
            .ok_or_else(|| anyhow!("unexpected OpenRouter response payload: {}", body))?;

        let mut token_usage = usage.unwrap_or_default();
        if token_usage.prompt_tokens == 0 {
            token_usage.prompt_tokens = prompt_tokens;
        }
        if token_usage.response_tokens == 0 {
            token_usage.response_tokens = approximate_token_count(&text);
        }
        token_usage.total_tokens = token_usage.prompt_tokens + token_usage.response_tokens;

        Ok(LlmResponse {
            text,
            token_usage,
            provider: LlmProvider::OpenRouter,
            model: request.model,
        })
    }
}

/// Deterministic system + user chat for an OpenRouter model.
fn openrouter_chat(model: &str, request: &SummarizationRequest) -> LlmRequest {
    LlmRequest::new(
        model,
        vec![
            ChatMessage::new(MessageRole::System, request.instructions.clone()),
            ChatMessage::new(MessageRole::User, request.text.clone()),
        ],
    )
    .with_temperature(0.0)
}

fn openrouter_payload(request: &LlmRequest) -> serde_json::Value {
    let messages: Vec<_> = request
        .messages
        .iter()
        .map(|msg| {
            serde_json::json!({
                "role": msg.role.as_str(),
                "content": msg.text,
            })
        })
        .collect();

    let mut payload = serde_json::json!({
        "model": request.model,
        "messages": messages,
    });
    if let Some(temperature) = request.temperature {
        payload["temperature"] = serde_json::json!(temperature);
    }
    payload
}

fn preview(body: &str) -> String {
    if body.chars().count() > ERROR_PREVIEW_CHARS {
        let truncated: String = body.chars().take(ERROR_PREVIEW_CHARS).collect();
        format!("{truncated}...")
    } else {
        body.to_string()
    }
}

/// Extracts `summary_text` from the inference API's list or object payloads.
fn extract_summary_text(value: &serde_json::Value) -> Option<String> {
    if value.get("error").is_some() {
        return None;
    }

    let entries: Vec<SummaryEntry> = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value.clone()).ok()?,
        serde_json::Value::Object(_) => vec![serde_json::from_value(value.clone()).ok()?],
        _ => return None,
    };

    entries
        .into_iter()
        .find_map(|entry| entry.summary_text.or(entry.generated_text))
}

fn extract_chat_text_and_usage(value: &serde_json::Value) -> Option<(String, Option<TokenUsage>)> {
    let chat = serde_json::from_value::<OpenAiChatCompletionPayload>(value.clone()).ok()?;
    let text = chat
        .choices
        .into_iter()
        .find_map(|choice| choice.message.content)?;

    let usage = chat.usage.map(|usage| TokenUsage {
        prompt_tokens: usage.prompt_tokens.unwrap_or_default(),
        response_tokens: usage.completion_tokens.unwrap_or_default(),
        total_tokens: usage.total_tokens.unwrap_or_default(),
    });

    Some((text, usage))
}

fn parse_model_provider(model: &str) -> Result<(LlmProvider, &str)> {
    let (provider, name) = model.split_once('/').ok_or_else(|| {
        anyhow!("model must be prefixed with provider, e.g. 'huggingface/facebook/bart-large-cnn'")
    })?;

    if name.trim().is_empty() {
        bail!("model name is required after provider prefix");
    }

    match provider {
        "huggingface" | "hf" => Ok((LlmProvider::HuggingFace, name)),
        "openrouter" => Ok((LlmProvider::OpenRouter, name)),
        other => bail!("unsupported provider prefix: {other}"),
    }
}

fn approximate_token_count(input: &str) -> usize {
    input.split_whitespace().count()
}

#[derive(Debug, Deserialize)]
struct SummaryEntry {
    #[serde(default)]
    summary_text: Option<String>,
    #[serde(default)]
    generated_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatCompletionPayload {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChatMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: Option<usize>,
    #[serde(default)]
    completion_tokens: Option<usize>,
    #[serde(default)]
    total_tokens: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_provider_prefixes() {
        let (provider, name) =
            parse_model_provider("huggingface/facebook/bart-large-cnn").expect("parse");
        assert_eq!(provider, LlmProvider::HuggingFace);
        assert_eq!(name, "facebook/bart-large-cnn");

        let (provider, name) = parse_model_provider("openrouter/openai/gpt-4o").expect("parse");
        assert_eq!(provider, LlmProvider::OpenRouter);
        assert_eq!(name, "openai/gpt-4o");
    }

    #[test]
    fn rejects_unknown_or_empty_models() {
        assert!(parse_model_provider("bart-large-cnn").is_err());
        assert!(parse_model_provider("huggingface/ ").is_err());
        let err = parse_model_provider("poe/gpt").unwrap_err();
        assert!(err.to_string().contains("unsupported provider prefix: poe"));
    }

    #[test]
    fn openrouter_summaries_use_a_deterministic_chat() {
        let request = SummarizationRequest {
            model: "openrouter/openai/gpt-4o-mini".into(),
            text: "Article body.".into(),
            min_length: 30,
            max_length: 150,
            instructions: "Summarize in 30 to 150 words.".into(),
        };
        let (_, provider_model) = parse_model_provider(&request.model).expect("parse");

        let payload = openrouter_payload(&openrouter_chat(provider_model, &request));
        assert_eq!(payload["model"], "openai/gpt-4o-mini");
        assert_eq!(payload["temperature"], json!(0.0));
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][0]["content"], "Summarize in 30 to 150 words.");
        assert_eq!(payload["messages"][1]["role"], "user");
        assert_eq!(payload["messages"][1]["content"], "Article body.");
    }

    #[test]
    fn extracts_summary_from_list_payload() {
        let body = json!([{ "summary_text": "Short summary." }]);
        assert_eq!(extract_summary_text(&body).as_deref(), Some("Short summary."));
    }

    #[test]
    fn extracts_summary_from_object_or_generated_text() {
        let body = json!({ "generated_text": "Generated." });
        assert_eq!(extract_summary_text(&body).as_deref(), Some("Generated."));
    }

    #[test]
    fn error_payload_yields_no_summary() {
        let body = json!({ "error": "Model facebook/bart-large-cnn is currently loading" });
        assert_eq!(extract_summary_text(&body), None);
        assert_eq!(extract_summary_text(&json!([])), None);
        assert_eq!(extract_summary_text(&json!("text")), None);
    }

    #[test]
    fn extracts_chat_completion_text_and_usage() {
        let body = json!({
            "choices": [{ "message": { "content": "A summary." } }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15 }
        });
        let (text, usage) = extract_chat_text_and_usage(&body).expect("chat payload");
        assert_eq!(text, "A summary.");
        let usage = usage.expect("usage");
        assert_eq!(usage.prompt_tokens, 12);
        assert_eq!(usage.response_tokens, 3);
    }

    #[test]
    fn preview_truncates_long_bodies() {
        let long = "x".repeat(ERROR_PREVIEW_CHARS + 10);
        let shortened = preview(&long);
        assert!(shortened.ends_with("..."));
        assert_eq!(shortened.len(), ERROR_PREVIEW_CHARS + 3);
        assert_eq!(preview("short"), "short");
    }
}
