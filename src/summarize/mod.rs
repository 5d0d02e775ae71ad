//! Abstractive summarization behind a swappable model capability.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    config::SummarizerSettings,
    llm::{LlmClient, SummarizationRequest},
};

/// Prefix of every user-visible summarization failure message.
pub const ERROR_MARKER: &str = "Error during summarization";

/// Target summary length, in model tokens (roughly words).
///
/// The bounds are passed through as given; callers constrain them with the
/// slider ranges, and `min_length < max_length` is not enforced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthBounds {
    pub min_length: u32,
    pub max_length: u32,
}

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("Error during summarization: {0}")]
    Model(String),
    #[error("Error during summarization: the model returned an empty summary")]
    EmptyOutput,
}

/// A pretrained sequence-to-sequence summarization model.
#[async_trait]
pub trait SummaryModel: Send + Sync {
    /// Human readable model identifier for logs.
    fn name(&self) -> &str;

    /// Runs one deterministic generation. Any failure is reported as `Err`.
    async fn generate(&self, text: &str, bounds: LengthBounds) -> anyhow::Result<String>;
}

/// Summarizes `text`, converting every model failure into [`SummarizeError`].
pub async fn summarize(
    model: &dyn SummaryModel,
    text: &str,
    bounds: LengthBounds,
) -> Result<String, SummarizeError> {
    match model.generate(text, bounds).await {
        Ok(summary) => {
            let summary = summary.trim();
            if summary.is_empty() {
                warn!(model = model.name(), "model returned an empty summary");
                return Err(SummarizeError::EmptyOutput);
            }
            Ok(summary.to_string())
        }
        Err(err) => {
            warn!(?err, model = model.name(), "summarization failed");
            Err(SummarizeError::Model(format!("{err:#}")))
        }
    }
}

/// [`SummaryModel`] backed by the shared provider client.
pub struct LlmSummaryModel {
    client: LlmClient,
    settings: SummarizerSettings,
}

impl LlmSummaryModel {
    pub fn new(client: LlmClient, settings: SummarizerSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl SummaryModel for LlmSummaryModel {
    fn name(&self) -> &str {
        &self.settings.model
    }

    async fn generate(&self, text: &str, bounds: LengthBounds) -> anyhow::Result<String> {
        let request = SummarizationRequest {
            model: self.settings.model.clone(),
            text: text.to_string(),
            min_length: bounds.min_length,
            max_length: bounds.max_length,
            instructions: self
                .settings
                .render_prompt(bounds.min_length, bounds.max_length),
        };

        let response = self.client.summarize(request).await?;
        info!(
            provider = %response.provider,
            model = %response.model,
            prompt_tokens = response.token_usage.prompt_tokens,
            response_tokens = response.token_usage.response_tokens,
            total_tokens = response.token_usage.total_tokens,
            "summary generated"
        );
        Ok(response.text)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use anyhow::anyhow;
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    /// Scripted model for tests: returns a fixed reply and records calls.
    pub struct ScriptedModel {
        reply: Result<String, String>,
        pub calls: AtomicUsize,
        pub last_bounds: Mutex<Option<LengthBounds>>,
    }

    impl ScriptedModel {
        pub fn replying(summary: &str) -> Self {
            Self {
                reply: Ok(summary.to_string()),
                calls: AtomicUsize::new(0),
                last_bounds: Mutex::new(None),
            }
        }

        pub fn failing(reason: &str) -> Self {
            Self {
                reply: Err(reason.to_string()),
                calls: AtomicUsize::new(0),
                last_bounds: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl SummaryModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, _text: &str, bounds: LengthBounds) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_bounds.lock().expect("bounds lock") = Some(bounds);
            self.reply.clone().map_err(|reason| anyhow!(reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedModel;
    use super::*;

    const BOUNDS: LengthBounds = LengthBounds {
        min_length: 30,
        max_length: 150,
    };

    #[tokio::test]
    async fn returns_trimmed_summary_on_success() {
        let model = ScriptedModel::replying("  A concise summary.\n");
        let summary = summarize(&model, "article", BOUNDS).await.expect("summary");
        assert_eq!(summary, "A concise summary.");
        assert_eq!(*model.last_bounds.lock().expect("lock"), Some(BOUNDS));
    }

    #[tokio::test]
    async fn model_failure_is_tagged_and_carries_marker() {
        let model = ScriptedModel::failing("index out of range in self");
        let err = summarize(&model, "article", BOUNDS).await.unwrap_err();

        assert!(matches!(err, SummarizeError::Model(_)));
        let message = err.to_string();
        assert!(message.starts_with(ERROR_MARKER));
        assert!(message.contains("index out of range in self"));
    }

    #[tokio::test]
    async fn blank_output_is_a_failure() {
        let model = ScriptedModel::replying("   ");
        let err = summarize(&model, "article", BOUNDS).await.unwrap_err();
        assert!(matches!(err, SummarizeError::EmptyOutput));
        assert!(err.to_string().starts_with(ERROR_MARKER));
    }

    #[tokio::test]
    async fn bounds_are_passed_through_unvalidated() {
        let model = ScriptedModel::replying("ok");
        let equal = LengthBounds {
            min_length: 100,
            max_length: 100,
        };
        summarize(&model, "article", equal).await.expect("summary");
        assert_eq!(*model.last_bounds.lock().expect("lock"), Some(equal));
    }

    #[tokio::test]
    async fn unknown_provider_surfaces_as_summarization_error() {
        let client = LlmClient::from_env().expect("client");
        let model = LlmSummaryModel::new(
            client,
            SummarizerSettings {
                model: "local/bart".to_string(),
                ..SummarizerSettings::default()
            },
        );

        let err = summarize(&model, "article", BOUNDS).await.unwrap_err();
        assert!(err.to_string().contains("unsupported provider prefix: local"));
    }
}
