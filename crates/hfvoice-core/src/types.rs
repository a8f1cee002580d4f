//! Request and response bodies for the hfvoice HTTP API.
//!
//! Shared by hfvoice-lib (server side) and hfvoice-cli (client side) so the
//! wire shapes live in one place without pulling in axum or reqwest.

use serde::{Deserialize, Serialize};

// ─── Model defaults ────────────────────────────────────────────────────────

pub const DEFAULT_STT_MODEL: &str = "openai/whisper-small";
pub const DEFAULT_LLM_MODEL: &str = "HuggingFaceH4/zephyr-7b-beta";
pub const DEFAULT_TTS_MODEL: &str = "espnet/kan-bayashi_ljspeech_vits";

/// The three model identifiers passed to the inference provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelIds {
    pub stt: String,
    pub llm: String,
    pub tts: String,
}

impl Default for ModelIds {
    fn default() -> Self {
        Self {
            stt: DEFAULT_STT_MODEL.into(),
            llm: DEFAULT_LLM_MODEL.into(),
            tts: DEFAULT_TTS_MODEL.into(),
        }
    }
}

// ─── Health ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub models: ModelIds,
}

impl HealthResponse {
    pub fn ok(models: &ModelIds) -> Self {
        Self {
            status: "ok".into(),
            models: models.clone(),
        }
    }
}

// ─── STT ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    pub text: String,
}

// ─── Chat ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
}

impl ChatRequest {
    /// Trimmed prompt, or `None` when only whitespace was sent.
    pub fn prompt(&self) -> Option<&str> {
        non_blank(&self.prompt)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

// ─── TTS ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub text: String,
}

impl SynthesisRequest {
    /// Trimmed text, or `None` when only whitespace was sent.
    pub fn text(&self) -> Option<&str> {
        non_blank(&self.text)
    }
}

// ─── Errors ────────────────────────────────────────────────────────────────

/// Error payload returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
