//! Data models and structures
//!
//! Defines the rendering styles offered to the user, the synthesized image
//! payload, and the runtime configuration for the AI providers.

use crate::{Error, Result};
use base64::Engine as _;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rendering style appended to the sketch description before synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Style {
    #[default]
    Photorealistic,
    OilPainting,
    Watercolor,
    DigitalArt,
    PencilSketch,
    Anime,
    ComicBook,
    Abstract,
    Impressionist,
    PopArt,
}

impl Style {
    /// Every style, in the order the selector shows them.
    pub const ALL: [Style; 10] = [
        Style::Photorealistic,
        Style::OilPainting,
        Style::Watercolor,
        Style::DigitalArt,
        Style::PencilSketch,
        Style::Anime,
        Style::ComicBook,
        Style::Abstract,
        Style::Impressionist,
        Style::PopArt,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Style::Photorealistic => "Photorealistic",
            Style::OilPainting => "Oil painting",
            Style::Watercolor => "Watercolor",
            Style::DigitalArt => "Digital art",
            Style::PencilSketch => "Pencil sketch",
            Style::Anime => "Anime",
            Style::ComicBook => "Comic book",
            Style::Abstract => "Abstract",
            Style::Impressionist => "Impressionist",
            Style::PopArt => "Pop art",
        }
    }

    pub fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|style| style.label()).collect()
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Style {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let wanted = input.trim();
        Self::ALL
            .into_iter()
            .find(|style| style.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::UnknownStyle(input.to_string()))
    }
}

impl TryFrom<String> for Style {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Style> for String {
    fn from(style: Style) -> Self {
        style.label().to_string()
    }
}

/// Encoded image bytes returned by the synthesis provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedImage {
    pub bytes: Vec<u8>,
}

impl SynthesizedImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Sniffs the container format from the magic bytes.
    pub fn detected_mime_type(&self) -> Option<&'static str> {
        match self.bytes.as_slice() {
            [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
            [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
            [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
            _ => None,
        }
    }

    /// Detected MIME type, or `image/png` for unrecognized bytes.
    pub fn mime_type(&self) -> &'static str {
        self.detected_mime_type().unwrap_or("image/png")
    }

    pub fn to_data_url(&self) -> String {
        let mime_type = self.detected_mime_type().unwrap_or_else(|| {
            tracing::warn!(
                "Unrecognized synthesized image format (first 4 bytes: {:02X?}), labelling as image/png",
                &self.bytes[..self.bytes.len().min(4)]
            );
            "image/png"
        });
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{}", mime_type, encoded)
    }
}

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_STABILITY_BASE_URL: &str = "https://api.stability.ai";

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: SecretString,
    pub stability_api_key: SecretString,
    pub openai_model: String,
    pub openai_base_url: String,
    pub stability_base_url: String,
}

impl Config {
    /// Loads `.env` when present, then reads settings from the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &str| {
            get(key)
                .map(SecretString::from)
                .ok_or_else(|| Error::Config(format!("{} not set", key)))
        };

        Ok(Self {
            openai_api_key: required("OPEN_AI_API_KEY")?,
            stability_api_key: required("STABILITY_API_KEY")?,
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            stability_base_url: get("STABILITY_BASE_URL")
                .unwrap_or_else(|| DEFAULT_STABILITY_BASE_URL.to_string()),
        })
    }
}
