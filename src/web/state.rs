use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    llm::LlmClient,
    summarize::{LlmSummaryModel, SummaryModel},
    web::{
        credentials::{Argon2Credentials, CredentialVerifier, StaticCredentials},
        session::SessionStore,
    },
};

#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    model: Arc<dyn SummaryModel>,
    credentials: Arc<dyn CredentialVerifier>,
    sessions: SessionStore,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let llm_client = LlmClient::from_env().context("failed to initialize LLM client")?;
        let model = LlmSummaryModel::new(llm_client, config.summarizer.clone());
        info!(model = %config.summarizer.model, "summary model configured");

        let credentials: Arc<dyn CredentialVerifier> = match &config.auth_users_file {
            Some(path) => {
                let table = Argon2Credentials::from_json_file(path)?;
                info!(users = table.len(), path = %path.display(), "loaded hashed credentials");
                Arc::new(table)
            }
            None => {
                warn!(
                    "AUTH_USERS_FILE not set; falling back to built-in plaintext accounts. Do not expose this instance publicly."
                );
                Arc::new(StaticCredentials::placeholder())
            }
        };

        Ok(Self::from_parts(config, Arc::new(model), credentials))
    }

    pub fn from_parts(
        config: AppConfig,
        model: Arc<dyn SummaryModel>,
        credentials: Arc<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            model,
            credentials,
            sessions: SessionStore::default(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn summary_model(&self) -> Arc<dyn SummaryModel> {
        Arc::clone(&self.model)
    }

    pub fn credentials(&self) -> &dyn CredentialVerifier {
        self.credentials.as_ref()
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}
