//! Generation pipeline: sketch → description → styled prompt → synthesized image.

use crate::ai::{
    DescriptionService, ImageSynthesisService, OpenAiDescriptionClient, StabilitySketchClient,
};
use crate::models::{Config, Style, SynthesizedImage};
use crate::sketch::Sketch;
use crate::{prompts, Result};
use tracing::{error, info, warn};

pub const NOTHING_DRAWN_MESSAGE: &str = "Please draw something on the canvas first!";

/// One user submission: the captured canvas and the chosen style.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub sketch: Sketch,
    pub style: Style,
}

/// What the page should show after a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Generated {
        description: String,
        prompt: String,
        image: SynthesizedImage,
    },
    /// The canvas was empty; no provider was called.
    NothingDrawn,
    /// Description succeeded but synthesis did not. The output area goes back
    /// to its placeholder and `message` is shown.
    SynthesisFailed {
        description: String,
        prompt: String,
        message: String,
    },
}

/// Runs the two provider calls for a generation request.
pub struct App {
    describer: Box<dyn DescriptionService>,
    synthesizer: Box<dyn ImageSynthesisService>,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub describer: Box<dyn DescriptionService>,
    pub synthesizer: Box<dyn ImageSynthesisService>,
}

impl App {
    pub fn with_services(services: AppServices) -> Self {
        Self {
            describer: services.describer,
            synthesizer: services.synthesizer,
        }
    }

    /// Build the production clients from explicit configuration.
    pub fn from_config(config: &Config) -> Self {
        // Reuse one HTTP connection pool across provider clients.
        let http_client = reqwest::Client::new();

        info!(
            "Description provider: OpenAI (model: {}, base: {})",
            config.openai_model, config.openai_base_url
        );
        let describer = OpenAiDescriptionClient::new_with_client(
            config.openai_api_key.clone(),
            config.openai_model.clone(),
            http_client.clone(),
        )
        .with_base_url(config.openai_base_url.clone());

        info!(
            "Synthesis provider: Stability sketch control (base: {})",
            config.stability_base_url
        );
        let synthesizer =
            StabilitySketchClient::new_with_client(config.stability_api_key.clone(), http_client)
                .with_base_url(config.stability_base_url.clone());

        Self::with_services(AppServices {
            describer: Box::new(describer),
            synthesizer: Box::new(synthesizer),
        })
    }

    /// Runs the pipeline for one request.
    ///
    /// A description failure is returned as `Err`; a synthesis failure is
    /// reported through [`GenerationOutcome::SynthesisFailed`].
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutcome> {
        if request.sketch.is_blank() {
            warn!("Sketch is blank, skipping generation");
            return Ok(GenerationOutcome::NothingDrawn);
        }

        let image = request.sketch.to_rgb();

        let description = self.describer.describe(&image).await?;
        info!(
            "Generated description ({} chars): {}",
            description.len(),
            description
        );

        let prompt = prompts::compose(&description, request.style);

        match self.synthesizer.synthesize(&image, &prompt).await {
            Ok(image) => {
                info!(
                    "Generated image ({} bytes, {})",
                    image.bytes.len(),
                    image.mime_type()
                );
                Ok(GenerationOutcome::Generated {
                    description,
                    prompt,
                    image,
                })
            }
            Err(e) => {
                error!("Image synthesis failed: {}", e);
                Ok(GenerationOutcome::SynthesisFailed {
                    description,
                    prompt,
                    message: format!("Error generating image: {}", e),
                })
            }
        }
    }
}
