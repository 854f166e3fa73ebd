//! AI service integration for sketch description and image synthesis
//!
//! Each capability is a trait so the pipeline can run against the real
//! providers (OpenAI vision, Stability sketch control) or in-memory mocks.

pub mod mock;
pub mod openai;
pub mod stability;

pub use mock::{MockDescriptionClient, MockImageSynthesisClient};
pub use openai::OpenAiDescriptionClient;
pub use stability::StabilitySketchClient;

use crate::models::SynthesizedImage;
use crate::Result;
use async_trait::async_trait;
use image::RgbImage;

#[async_trait]
pub trait DescriptionService: Send + Sync {
    /// Returns a short natural-language description of the image.
    async fn describe(&self, image: &RgbImage) -> Result<String>;
}

#[async_trait]
pub trait ImageSynthesisService: Send + Sync {
    /// Renders `image` guided by `prompt`, returning the encoded result.
    async fn synthesize(&self, image: &RgbImage, prompt: &str) -> Result<SynthesizedImage>;
}
