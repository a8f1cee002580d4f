//! Inference provider client — speech-to-text, text generation, text-to-speech.
//!
//! Every call is a single `POST {base_url}/{model}` against the Hugging Face
//! Inference API, authenticated with the bearer credential. No retries and no
//! timeouts beyond reqwest's defaults.
//!
//! Provider responses are decoded into fixed shapes here; anything else is an
//! [`UpstreamError::UnexpectedResponse`] rather than being stringified.

use async_trait::async_trait;
use axum::body::Bytes;
use serde::{Deserialize, Serialize};

use hfvoice_core::settings::Credential;

use crate::error::UpstreamError;

pub const DEFAULT_INFERENCE_URL: &str = "https://router.huggingface.co/hf-inference/models";

/// Generation parameters, fixed for every `/chat` call.
pub const MAX_NEW_TOKENS: u32 = 256;
pub const TEMPERATURE: f64 = 0.3;

const FALLBACK_AUDIO_TYPE: &str = "application/octet-stream";

/// The three provider capabilities the HTTP surface needs.
#[async_trait]
pub trait Inference: Send + Sync {
    /// Transcribe an audio clip. `content_type` is the uploaded media type, if known.
    async fn transcribe(
        &self,
        model: &str,
        audio: Bytes,
        content_type: Option<&str>,
    ) -> Result<String, UpstreamError>;

    /// Generate a completion for `prompt`.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, UpstreamError>;

    /// Synthesize `text` into audio bytes (WAV).
    async fn synthesize(&self, model: &str, text: &str) -> Result<Bytes, UpstreamError>;
}

// ─── Wire shapes ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
}

#[derive(Serialize)]
struct GenerationParameters {
    max_new_tokens: u32,
    temperature: f64,
    return_full_text: bool,
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    inputs: &'a str,
}

#[derive(Deserialize)]
struct Transcription {
    text: String,
}

#[derive(Deserialize)]
struct Generated {
    generated_text: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GenerationOutput {
    Batch(Vec<Generated>),
    Single(Generated),
}

// ─── Client ────────────────────────────────────────────────────────────────

/// Hugging Face Inference API client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HfClient {
    http: reqwest::Client,
    base_url: String,
    token: Credential,
}

impl HfClient {
    pub fn new(token: Credential) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_INFERENCE_URL.to_string(),
            token,
        }
    }

    /// Point the client at a different provider root (tests, proxies, self-hosted).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, model: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}/{}", self.base_url, model))
            .bearer_auth(self.token.expose())
    }
}

/// Send the request and turn non-2xx statuses into [`UpstreamError::Status`].
async fn send(req: reqwest::RequestBuilder) -> Result<reqwest::Response, UpstreamError> {
    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(UpstreamError::Status { status, body });
    }
    Ok(resp)
}

fn decode<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, UpstreamError> {
    serde_json::from_slice(body).map_err(|e| {
        UpstreamError::UnexpectedResponse(format!(
            "{e}; raw={}",
            String::from_utf8_lossy(body)
        ))
    })
}

#[async_trait]
impl Inference for HfClient {
    async fn transcribe(
        &self,
        model: &str,
        audio: Bytes,
        content_type: Option<&str>,
    ) -> Result<String, UpstreamError> {
        tracing::debug!(model, bytes = audio.len(), "transcribe");
        let resp = send(
            self.request(model)
                .header(
                    reqwest::header::CONTENT_TYPE,
                    content_type.unwrap_or(FALLBACK_AUDIO_TYPE),
                )
                .body(audio),
        )
        .await?;

        let body = resp.bytes().await?;
        let out: Transcription = decode(&body)?;
        Ok(out.text)
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, UpstreamError> {
        tracing::debug!(model, chars = prompt.len(), "generate");
        let resp = send(self.request(model).json(&GenerationRequest {
            inputs: prompt,
            parameters: GenerationParameters {
                max_new_tokens: MAX_NEW_TOKENS,
                temperature: TEMPERATURE,
                return_full_text: false,
            },
        }))
        .await?;

        let body = resp.bytes().await?;
        match decode::<GenerationOutput>(&body)? {
            GenerationOutput::Single(g) => Ok(g.generated_text),
            GenerationOutput::Batch(batch) => batch
                .into_iter()
                .next()
                .map(|g| g.generated_text)
                .ok_or_else(|| UpstreamError::UnexpectedResponse("no generations returned".into())),
        }
    }

    async fn synthesize(&self, model: &str, text: &str) -> Result<Bytes, UpstreamError> {
        tracing::debug!(model, chars = text.len(), "synthesize");
        let resp = send(self.request(model).json(&SynthesisRequest { inputs: text })).await?;

        let audio = resp.bytes().await?;
        if audio.is_empty() {
            return Err(UpstreamError::UnexpectedResponse("empty audio body".into()));
        }
        Ok(audio)
    }
}
