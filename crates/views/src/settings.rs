//! Settings page: the LLM analyzer configuration form.
//!
//! Not cache-backed -- the form reads once on open and writes on save,
//! directly through the client. A failed save keeps the form populated
//! for retry; nothing retries automatically.

use std::sync::Arc;

use vigil_client::TelemetryClient;
use vigil_core::LlmConfig;

/// Transient outcome notice after a load or save attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsNotice {
    Saved,
    Failed(String),
}

/// View model for the settings form.
pub struct SettingsForm {
    client: Arc<TelemetryClient>,
    config: LlmConfig,
    saving: bool,
    notice: Option<SettingsNotice>,
}

impl SettingsForm {
    pub fn new(client: Arc<TelemetryClient>) -> Self {
        SettingsForm {
            client,
            config: LlmConfig::default(),
            saving: false,
            notice: None,
        }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut LlmConfig {
        &mut self.config
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Take the transient notice (shown once, then cleared).
    pub fn take_notice(&mut self) -> Option<SettingsNotice> {
        self.notice.take()
    }

    /// Populate the form from the backend.
    pub async fn load(&mut self) {
        match self.client.get_llm_config().await {
            Ok(config) => {
                self.config = config;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load LLM settings");
                self.notice = Some(SettingsNotice::Failed(
                    "Failed to load settings".to_string(),
                ));
            }
        }
    }

    /// Save the form. The save is all-or-nothing: with any required
    /// field empty, nothing is sent and the failure notice names the
    /// missing fields. On backend failure the form stays populated.
    pub async fn save(&mut self) {
        let missing = self.config.missing_fields();
        if !missing.is_empty() {
            self.notice = Some(SettingsNotice::Failed(format!(
                "Required fields missing: {}",
                missing.join(", ")
            )));
            return;
        }

        self.saving = true;
        match self.client.set_llm_config(&self.config).await {
            Ok(saved) => {
                self.config = saved;
                self.notice = Some(SettingsNotice::Saved);
                tracing::info!("LLM settings saved");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to save LLM settings");
                self.notice = Some(SettingsNotice::Failed(format!(
                    "Failed to save settings: {e}"
                )));
            }
        }
        self.saving = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_config_fails_before_any_network_call() {
        // An unreachable endpoint: if the save tried the network, the
        // notice would be a transport failure instead.
        let client = Arc::new(
            TelemetryClient::new("http://127.0.0.1:1/api").expect("client builds"),
        );
        let mut form = SettingsForm::new(client);
        form.config_mut().endpoint = "https://api.example.com".to_string();

        futures::executor::block_on(form.save());

        match form.take_notice() {
            Some(SettingsNotice::Failed(msg)) => {
                assert!(msg.contains("model"));
                assert!(msg.contains("api_key"));
            }
            other => panic!("expected failure notice, got {other:?}"),
        }
        // Form stays populated for retry.
        assert_eq!(form.config().endpoint, "https://api.example.com");
    }
}
