use super::types::{ChatCompletionRequest, ChatCompletionResponse};
use crate::models::DEFAULT_OPENAI_BASE_URL;
use crate::{Error, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

pub struct OpenAiHttpClient {
    pub(crate) client: Client,
    api_key: SecretString,
    pub(crate) base_url: String,
    timeout: Duration,
}

impl OpenAiHttpClient {
    pub fn new_with_client(api_key: SecretString, timeout: Duration, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sends one chat completion request. Non-2xx responses carry the raw body.
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        let url = format!("{}{}", self.base_url, super::CHAT_COMPLETIONS_PATH);
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .inspect_err(|e| tracing::error!("OpenAI request failed: {}", e))?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::error!(%status, "OpenAI rejected the description request: {}", body);
            return Err(Error::AiProvider(format!(
                "OpenAI API error (status {}): {}",
                status, body
            )));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .inspect_err(|e| tracing::error!("Unparseable OpenAI response ({}): {}", e, body))?;
        Ok(parsed)
    }
}
