use super::client::StabilityHttpClient;
use crate::ai::ImageSynthesisService;
use crate::models::SynthesizedImage;
use crate::{sketch, Result};
use async_trait::async_trait;
use image::RgbImage;
use reqwest::multipart::{Form, Part};
use secrecy::SecretString;
use std::time::Duration;

const CONTROL_STRENGTH: f32 = 0.7;
const OUTPUT_FORMAT: &str = "webp";

/// Renders a sketch with Stability's sketch-control endpoint.
pub struct StabilitySketchClient {
    http: StabilityHttpClient,
}

impl StabilitySketchClient {
    pub fn new(api_key: SecretString) -> Self {
        Self::new_with_client(api_key, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: SecretString, client: reqwest::Client) -> Self {
        Self {
            http: StabilityHttpClient::new_with_client(api_key, Duration::from_secs(120), client),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl ImageSynthesisService for StabilitySketchClient {
    async fn synthesize(&self, image: &RgbImage, prompt: &str) -> Result<SynthesizedImage> {
        let png = sketch::encode_png(image).await?;
        tracing::debug!(
            "Requesting sketch synthesis ({} PNG bytes, prompt {} chars)",
            png.len(),
            prompt.len()
        );

        let image_part = Part::bytes(png)
            .file_name("sketch.png")
            .mime_str("image/png")?;

        let form = Form::new()
            .text("prompt", prompt.to_string())
            .text("control_strength", CONTROL_STRENGTH.to_string())
            .text("output_format", OUTPUT_FORMAT)
            .part("image", image_part);

        let bytes = self
            .http
            .post_image_form(super::CONTROL_SKETCH_PATH, form)
            .await?;

        tracing::debug!("Stability returned {} image bytes", bytes.len());
        Ok(SynthesizedImage::new(bytes))
    }
}
