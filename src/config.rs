use std::{env, ops::RangeInclusive, path::PathBuf};

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SUMMARY_MODEL: &str = "huggingface/facebook/bart-large-cnn";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const MIN_LENGTH_PLACEHOLDER: &str = "{{MIN_LENGTH}}";
pub const MAX_LENGTH_PLACEHOLDER: &str = "{{MAX_LENGTH}}";

const DEFAULT_SUMMARY_PROMPT: &str = "You are an abstractive summarizer for biomedical and scientific articles. \
Write a single-paragraph summary of the article supplied by the user in your own words. \
The summary must be between {{MIN_LENGTH}} and {{MAX_LENGTH}} words. \
Do not add information that is not in the article. Reply with the summary text only.";

/// Slider bounds for one of the two summary length controls.
#[derive(Clone, Debug)]
pub struct LengthControl {
    pub range: RangeInclusive<u32>,
    pub default: u32,
}

pub fn min_length_control() -> LengthControl {
    LengthControl {
        range: 30..=100,
        default: 30,
    }
}

pub fn max_length_control() -> LengthControl {
    LengthControl {
        range: 100..=300,
        default: 150,
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got `{value}`")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Clone, Debug)]
pub struct SummarizerSettings {
    /// Provider-prefixed model name, e.g. `huggingface/facebook/bart-large-cnn`.
    pub model: String,
    /// System prompt for chat providers; length placeholders are substituted per request.
    pub prompt: String,
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_SUMMARY_MODEL.to_string(),
            prompt: DEFAULT_SUMMARY_PROMPT.to_string(),
        }
    }
}

impl SummarizerSettings {
    pub fn render_prompt(&self, min_length: u32, max_length: u32) -> String {
        self.prompt
            .replace(MIN_LENGTH_PLACEHOLDER, &min_length.to_string())
            .replace(MAX_LENGTH_PLACEHOLDER, &max_length.to_string())
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub summarizer: SummarizerSettings,
    pub auth_users_file: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            summarizer: SummarizerSettings::default(),
            auth_users_file: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = SummarizerSettings::default();

        let port = match get("PORT") {
            Some(value) => value.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                expected: "a TCP port number",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(bytes) if bytes > 0 => bytes,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "MAX_UPLOAD_BYTES",
                        expected: "a positive byte count",
                        value,
                    });
                }
            },
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            port,
            summarizer: SummarizerSettings {
                model: get("SUMMARY_MODEL")
                    .map(|value| value.trim().to_string())
                    .unwrap_or(defaults.model),
                prompt: get("SUMMARY_PROMPT").unwrap_or(defaults.prompt),
            },
            auth_users_file: get("AUTH_USERS_FILE").map(PathBuf::from),
            max_upload_bytes,
        })
    }
}
