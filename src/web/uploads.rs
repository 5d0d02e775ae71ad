use std::collections::HashMap;

use axum::extract::Multipart;
use thiserror::Error;

/// Result type used by the shared upload helpers.
pub type UploadResult<T> = Result<T, UploadError>;

/// Error returned when a multipart form does not match its field configuration.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to parse upload form: {0}")]
    Malformed(String),
    #[error("failed to read field `{field}`: {reason}")]
    Field { field: String, reason: String },
    #[error("unexpected file field `{0}`")]
    UnexpectedField(String),
    #[error("field `{field}` accepts at most {max} file(s)")]
    TooManyFiles { field: String, max: usize },
    #[error("please choose a file to upload (field `{field}` needs at least {min})")]
    MissingFile { field: String, min: usize },
}

/// Expectations for a single multipart file field.
#[derive(Debug, Clone, Copy)]
pub struct FileFieldConfig<'a> {
    pub field_name: &'a str,
    pub max_files: usize,
    pub min_files: usize,
}

impl<'a> FileFieldConfig<'a> {
    pub fn new(field_name: &'a str, max_files: usize) -> Self {
        Self {
            field_name,
            max_files,
            min_files: if max_files == 0 { 0 } else { 1 },
        }
    }
}

/// An uploaded file held in memory. Nothing is written to disk.
#[derive(Debug, Clone)]
pub struct ReceivedFile {
    pub field_name: String,
    pub original_name: String,
    /// Sanitized name, safe to echo back in logs and pages.
    pub display_name: String,
    pub bytes: Vec<u8>,
}

/// Aggregated output of the shared upload reader.
#[derive(Debug, Default)]
pub struct UploadOutcome {
    pub files: Vec<ReceivedFile>,
    pub text_fields: HashMap<String, Vec<String>>,
}

impl UploadOutcome {
    /// Removes and returns the first file uploaded under `field_name`.
    pub fn take_file(&mut self, field_name: &str) -> Option<ReceivedFile> {
        let index = self
            .files
            .iter()
            .position(|file| file.field_name == field_name)?;
        Some(self.files.remove(index))
    }

    pub fn first_text(&self, field_name: &str) -> Option<&str> {
        self.text_fields
            .get(field_name)
            .and_then(|values| values.first().map(|s| s.as_str()))
    }
}

/// Reads a multipart form into memory, enforcing per-field file counts.
///
/// Parts without a filename are collected as text fields.
pub async fn read_upload_form(
    mut multipart: Multipart,
    field_configs: &[FileFieldConfig<'_>],
) -> UploadResult<UploadOutcome> {
    let mut counts: HashMap<&str, usize> = field_configs
        .iter()
        .map(|config| (config.field_name, 0))
        .collect();
    let mut outcome = UploadOutcome::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| UploadError::Malformed(err.to_string()))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        let Some(file_name) = field.file_name().map(str::to_string) else {
            let value = field.text().await.map_err(|err| UploadError::Field {
                field: field_name.clone(),
                reason: err.to_string(),
            })?;
            outcome
                .text_fields
                .entry(field_name)
                .or_default()
                .push(value);
            continue;
        };

        let Some(config) = field_configs
            .iter()
            .find(|config| config.field_name == field_name)
        else {
            return Err(UploadError::UnexpectedField(field_name));
        };
        let count = counts.entry(config.field_name).or_default();
        if *count >= config.max_files {
            return Err(UploadError::TooManyFiles {
                field: field_name,
                max: config.max_files,
            });
        }

        let bytes = field.bytes().await.map_err(|err| UploadError::Field {
            field: field_name.clone(),
            reason: err.to_string(),
        })?;

        // Browsers send an empty filename part when nothing was chosen.
        if file_name.is_empty() && bytes.is_empty() {
            continue;
        }

        *count += 1;
        outcome.files.push(ReceivedFile {
            field_name,
            display_name: display_name(&file_name, *count),
            original_name: file_name,
            bytes: bytes.to_vec(),
        });
    }

    for config in field_configs {
        let count = counts.get(config.field_name).copied().unwrap_or(0);
        if count < config.min_files {
            return Err(UploadError::MissingFile {
                field: config.field_name.to_string(),
                min: config.min_files,
            });
        }
    }

    Ok(outcome)
}

fn display_name(original: &str, index: usize) -> String {
    let sanitized = sanitize_filename::sanitize(original);
    if sanitized.is_empty() {
        format!("upload_{index}")
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_strips_path_separators() {
        let name = display_name("../../etc/passwd", 1);
        assert!(!name.contains('/'));
        assert!(name.contains("passwd"));
    }

    #[test]
    fn display_name_falls_back_when_empty() {
        assert_eq!(display_name("", 2), "upload_2");
    }

    #[test]
    fn file_field_requires_one_file_by_default() {
        let config = FileFieldConfig::new("file", 1);
        assert_eq!(config.min_files, 1);
        assert_eq!(FileFieldConfig::new("optional", 0).min_files, 0);
    }

    #[test]
    fn outcome_lookups_return_first_entries() {
        let mut outcome = UploadOutcome::default();
        outcome
            .text_fields
            .insert("min_length".into(), vec!["40".into(), "50".into()]);
        outcome.files.push(ReceivedFile {
            field_name: "file".into(),
            original_name: "a.txt".into(),
            display_name: "a.txt".into(),
            bytes: b"abc".to_vec(),
        });

        assert_eq!(outcome.first_text("min_length"), Some("40"));
        assert!(outcome.first_text("max_length").is_none());
        assert!(outcome.take_file("other").is_none());

        let taken = outcome.take_file("file").expect("file");
        assert_eq!(taken.original_name, "a.txt");
        assert_eq!(taken.bytes, b"abc");
        assert!(outcome.take_file("file").is_none());
    }
}
