//! Browser-facing HTTP surface: the drawing page and its JSON API.

use crate::app::{App, GenerationOutcome, GenerationRequest, NOTHING_DRAWN_MESSAGE};
use crate::models::Style;
use crate::sketch::Sketch;
use crate::{Error, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

const INDEX_HTML: &str = include_str!("../assets/index.html");

pub const SUCCESS_MESSAGE: &str = "Image generated successfully!";

/// Upper bound on a submitted canvas data URL.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    /// `canvas.toDataURL("image/png")` output.
    pub sketch: String,
    #[serde(default)]
    pub style: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerateReply {
    Generated {
        message: String,
        description: String,
        prompt: String,
        /// Data URL of the synthesized image.
        image: String,
    },
    NothingDrawn {
        message: String,
    },
    SynthesisFailed {
        message: String,
        description: String,
        prompt: String,
    },
}

impl From<GenerationOutcome> for GenerateReply {
    fn from(outcome: GenerationOutcome) -> Self {
        match outcome {
            GenerationOutcome::Generated {
                description,
                prompt,
                image,
            } => GenerateReply::Generated {
                message: SUCCESS_MESSAGE.to_string(),
                description,
                prompt,
                image: image.to_data_url(),
            },
            GenerationOutcome::NothingDrawn => GenerateReply::NothingDrawn {
                message: NOTHING_DRAWN_MESSAGE.to_string(),
            },
            GenerationOutcome::SynthesisFailed {
                description,
                prompt,
                message,
            } => GenerateReply::SynthesisFailed {
                message,
                description,
                prompt,
            },
        }
    }
}

/// Maps pipeline errors onto HTTP statuses with a `{ "error": ... }` body.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::InvalidRequest(_) | Error::InvalidSketch(_) | Error::UnknownStyle(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::AiProvider(_) | Error::Http(_) | Error::Serialization(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

pub fn router(app: Arc<App>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/styles", get(styles))
        .route("/api/generate", post(generate))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(app)
}

/// Binds `listen` and serves until `shutdown` resolves.
pub async fn serve<F>(app: Arc<App>, listen: SocketAddr, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(listen).await?;
    let local_addr = listener.local_addr()?;
    info!(%local_addr, "server listening");

    axum::serve(listener, router(app))
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> &'static str {
    "ok"
}

async fn styles() -> Json<Vec<&'static str>> {
    Json(Style::labels())
}

async fn generate(
    State(app): State<Arc<App>>,
    body: std::result::Result<Json<GenerateBody>, JsonRejection>,
) -> std::result::Result<Json<GenerateReply>, ApiError> {
    let Json(body) = body.map_err(|rejection| Error::InvalidRequest(rejection.body_text()))?;
    let style: Style = match body.style.as_deref() {
        Some(label) => label.parse()?,
        None => Style::default(),
    };

    let span = info_span!("generate", request_id = %Uuid::new_v4(), style = %style);
    let reply = run_generation(&app, body.sketch, style)
        .instrument(span)
        .await?;

    Ok(Json(reply))
}

async fn run_generation(
    app: &App,
    data_url: String,
    style: Style,
) -> std::result::Result<GenerateReply, ApiError> {
    let sketch = tokio::task::spawn_blocking(move || Sketch::from_data_url(&data_url))
        .await
        .map_err(|e| Error::Invariant(format!("Sketch decoding task join error: {}", e)))??;

    let outcome = app
        .generate(GenerationRequest { sketch, style })
        .await
        .map_err(|e| {
            error!("Generation failed: {}", e);
            e
        })?;

    Ok(GenerateReply::from(outcome))
}
