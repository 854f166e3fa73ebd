use super::client::OpenAiHttpClient;
use super::types::{ChatCompletionRequest, ChatMessage, ChatMessageContent, ImageUrl, MessagePart};
use crate::ai::DescriptionService;
use crate::{prompts, sketch, Error, Result};
use async_trait::async_trait;
use base64::Engine as _;
use image::RgbImage;
use secrecy::SecretString;
use std::time::Duration;

const MAX_DESCRIPTION_TOKENS: u32 = 300;

/// Describes sketches through an OpenAI vision-capable chat model.
pub struct OpenAiDescriptionClient {
    http: OpenAiHttpClient,
    model: String,
}

impl OpenAiDescriptionClient {
    pub fn new(api_key: SecretString, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: SecretString, model: String, client: reqwest::Client) -> Self {
        Self {
            http: OpenAiHttpClient::new_with_client(api_key, Duration::from_secs(30), client),
            model,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl DescriptionService for OpenAiDescriptionClient {
    async fn describe(&self, image: &RgbImage) -> Result<String> {
        let png = sketch::encode_png(image).await?;
        tracing::debug!("Requesting sketch description ({} PNG bytes)", png.len());

        let data_url = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png)
        );

        let user_message = ChatMessage {
            role: "user".to_string(),
            content: Some(ChatMessageContent::Parts(vec![
                MessagePart::Text {
                    text: prompts::DESCRIBE_SKETCH.to_string(),
                },
                MessagePart::ImageUrl {
                    image_url: ImageUrl { url: data_url },
                },
            ])),
        };

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![user_message],
            max_tokens: MAX_DESCRIPTION_TOKENS,
        };

        let response = self.http.chat_completion(&request).await?;

        response
            .choices
            .first()
            .and_then(|choice| match &choice.message.content {
                Some(ChatMessageContent::Text(text)) => Some(text.trim().to_string()),
                _ => None,
            })
            .ok_or_else(|| Error::AiProvider("No description in OpenAI response".to_string()))
    }
}
