//! hfvoice CLI — voice gateway server and client.
//!
//! ```text
//! hfvoice serve [--port 8000] [--host 127.0.0.1] [--env-file .env] [--inference-url URL]
//! hfvoice health [--server http://127.0.0.1:8000]
//! hfvoice chat "hello there" [--server ...]
//! hfvoice transcribe clip.webm [--server ...]
//! hfvoice synthesize "hello" --output reply.wav [--server ...]
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use hfvoice_lib::config::{self, DEFAULT_ENV_FILE};
use hfvoice_lib::inference::{DEFAULT_INFERENCE_URL, HfClient};
use hfvoice_lib::server::{self, AppState};

const DEFAULT_SERVER: &str = "http://127.0.0.1:8000";
const INFERENCE_URL_KEY: &str = "HF_INFERENCE_URL";

/// hfvoice — speech-to-text, chat and text-to-speech gateway
#[derive(Parser)]
#[command(name = "hfvoice", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the gateway server (requires HF_TOKEN in the environment)
    Serve {
        /// Listen port
        #[arg(long, default_value = "8000")]
        port: u16,
        /// Listen host
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Env file with STT_MODEL / LLM_MODEL / TTS_MODEL overrides
        #[arg(long, default_value = DEFAULT_ENV_FILE)]
        env_file: PathBuf,
        /// Inference provider base URL (falls back to HF_INFERENCE_URL)
        #[arg(long)]
        inference_url: Option<String>,
    },
    /// Show server status and configured models
    Health {
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// Send a prompt to the language model
    Chat {
        /// Prompt text
        prompt: String,
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// Transcribe an audio file
    Transcribe {
        /// Audio file to upload
        file: PathBuf,
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// Synthesize speech and save it as WAV
    Synthesize {
        /// Text to speak
        text: String,
        /// Output WAV path
        #[arg(long, short, default_value = "reply.wav")]
        output: PathBuf,
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "hfvoice=info,hfvoice_lib=info,hfvoice_core=info,tower_http=info".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Serve {
            port,
            host,
            env_file,
            inference_url,
        } => serve(&host, port, &env_file, inference_url).await,
        Command::Health { server } => get_json(&server, "health").await,
        Command::Chat { prompt, server } => {
            post_json(&server, "chat", serde_json::json!({ "prompt": prompt })).await
        }
        Command::Transcribe { file, server } => transcribe(&server, &file).await,
        Command::Synthesize {
            text,
            output,
            server,
        } => synthesize(&server, &text, &output).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn serve(
    host: &str,
    port: u16,
    env_file: &Path,
    inference_url: Option<String>,
) -> Result<(), String> {
    let settings = config::load(env_file).map_err(|e| e.to_string())?;

    let base_url = inference_url
        .or_else(|| std::env::var(INFERENCE_URL_KEY).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| DEFAULT_INFERENCE_URL.to_string());
    let client = HfClient::new(settings.token.clone()).with_base_url(base_url);
    tracing::info!("inference provider: {}", client.base_url());

    let app = server::router(AppState::new(settings.models, Arc::new(client)));

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("failed to bind {addr}: {e}"))?;
    tracing::info!("hfvoice listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("server error: {e}"))
}

async fn get_json(server: &str, endpoint: &str) -> Result<(), String> {
    let resp = reqwest::Client::new()
        .get(format!("{server}/{endpoint}"))
        .send()
        .await
        .map_err(|e| format!("request failed: {e}"))?;
    print_text(resp).await
}

async fn post_json(server: &str, endpoint: &str, body: serde_json::Value) -> Result<(), String> {
    let resp = reqwest::Client::new()
        .post(format!("{server}/{endpoint}"))
        .json(&body)
        .send()
        .await
        .map_err(|e| format!("request failed: {e}"))?;
    print_text(resp).await
}

async fn transcribe(server: &str, file: &Path) -> Result<(), String> {
    let audio = tokio::fs::read(file)
        .await
        .map_err(|e| format!("failed to read {}: {e}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string());

    let part = reqwest::multipart::Part::bytes(audio)
        .file_name(file_name)
        .mime_str(audio_mime(file))
        .map_err(|e| format!("mime error: {e}"))?;
    let form = reqwest::multipart::Form::new().part("audio", part);

    let resp = reqwest::Client::new()
        .post(format!("{server}/stt"))
        .multipart(form)
        .send()
        .await
        .map_err(|e| format!("request failed: {e}"))?;
    print_text(resp).await
}

async fn synthesize(server: &str, text: &str, output: &Path) -> Result<(), String> {
    let resp = reqwest::Client::new()
        .post(format!("{server}/tts"))
        .json(&serde_json::json!({ "text": text }))
        .send()
        .await
        .map_err(|e| format!("request failed: {e}"))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(format!("synthesis failed ({status}): {body}"));
    }

    let audio = resp
        .bytes()
        .await
        .map_err(|e| format!("response read error: {e}"))?;
    tokio::fs::write(output, &audio)
        .await
        .map_err(|e| format!("failed to write {}: {e}", output.display()))?;
    println!("wrote {} bytes to {}", audio.len(), output.display());
    Ok(())
}

async fn print_text(resp: reqwest::Response) -> Result<(), String> {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(format!("server returned {status}: {body}"));
    }
    println!("{body}");
    Ok(())
}

fn audio_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("wav") => "audio/wav",
        Some("webm") => "audio/webm",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("m4a") => "audio/mp4",
        _ => "application/octet-stream",
    }
}
