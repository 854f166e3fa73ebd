use crate::models::DEFAULT_STABILITY_BASE_URL;
use crate::{Error, Result};
use reqwest::multipart::Form;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

/// Thin Stability AI REST client for the v2beta image endpoints.
pub struct StabilityHttpClient {
    pub(crate) client: Client,
    api_key: SecretString,
    pub(crate) base_url: String,
    timeout: Duration,
}

impl StabilityHttpClient {
    pub fn new_with_client(api_key: SecretString, timeout: Duration, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_STABILITY_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Posts a multipart form and returns the raw image bytes of a success response.
    pub async fn post_image_form(&self, path: &str, form: Form) -> Result<Vec<u8>> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Accept", "image/*")
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Stability: {}", e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            let detail = describe_error_body(&error_text);
            tracing::error!("Stability API error (status {}): {}", status, detail);
            return Err(Error::AiProvider(format!(
                "Stability API error (status {}): {}",
                status, detail
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Stability reports failures as JSON (`{"name": ..., "errors": [...]}`);
/// anything else is passed through as text.
fn describe_error_body(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => json.to_string(),
        Err(_) => body.trim().to_string(),
    }
}
