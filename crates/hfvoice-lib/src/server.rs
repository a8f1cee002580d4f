//! HTTP API for the hfvoice gateway.
//!
//! Four routes: `/health`, `/stt`, `/chat`, `/tts`. CORS is fully permissive
//! so a browser recorder page on any origin can call it; tighten before
//! exposing publicly.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use hfvoice_core::types::{
    ChatRequest, ChatResponse, HealthResponse, ModelIds, SynthesisRequest, TranscriptionResponse,
};

use crate::error::ApiError;
use crate::inference::Inference;

/// Multipart field carrying the recorded clip.
pub const AUDIO_FIELD: &str = "audio";

/// Upload cap for `/stt`; axum's 2 MiB default is too small for recordings.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

const WAV_MEDIA_TYPE: &str = "audio/wav";

/// Read-only state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    models: Arc<ModelIds>,
    inference: Arc<dyn Inference>,
}

impl AppState {
    pub fn new(models: ModelIds, inference: Arc<dyn Inference>) -> Self {
        Self {
            models: Arc::new(models),
            inference,
        }
    }
}

/// Build the axum router with shared [`AppState`].
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stt", post(stt))
        .route("/chat", post(chat))
        .route("/tts", post(tts))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self {
            status: err.status(),
            detail: err.body_text(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        Self {
            status: err.status(),
            detail: err.body_text(),
        }
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::ok(&state.models))
}

async fn stt(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<TranscriptionResponse>, ApiError> {
    let (audio, content_type) = read_audio(&mut multipart).await?;
    if audio.is_empty() {
        return Err(ApiError::bad_request("Empty audio upload"));
    }

    let text = state
        .inference
        .transcribe(&state.models.stt, audio, content_type.as_deref())
        .await
        .map_err(|e| ApiError::upstream("STT error", e))?;

    Ok(Json(TranscriptionResponse {
        text: text.trim().to_string(),
    }))
}

/// Pull the `audio` part out of the form, skipping any other fields.
async fn read_audio(multipart: &mut Multipart) -> Result<(Bytes, Option<String>), ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        return Ok((bytes, content_type));
    }
    Err(ApiError::unprocessable("Missing audio file"))
}

async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = body?;
    let prompt = req
        .prompt()
        .ok_or_else(|| ApiError::bad_request("Empty prompt"))?;

    let reply = state
        .inference
        .generate(&state.models.llm, prompt)
        .await
        .map_err(|e| ApiError::upstream("LLM error", e))?;

    Ok(Json(ChatResponse {
        reply: reply.trim().to_string(),
    }))
}

async fn tts(
    State(state): State<AppState>,
    body: Result<Json<SynthesisRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = body?;
    let text = req
        .text()
        .ok_or_else(|| ApiError::bad_request("Empty text"))?;

    let audio = state
        .inference
        .synthesize(&state.models.tts, text)
        .await
        .map_err(|e| ApiError::upstream("TTS error", e))?;

    Ok(([(header::CONTENT_TYPE, WAV_MEDIA_TYPE)], audio).into_response())
}
