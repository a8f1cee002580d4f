//! Startup configuration resolution.
//!
//! Two sources feed the snapshot: key/values parsed from an env file and the
//! ambient process environment. Model ids prefer the file, then the
//! environment, then the built-in default. The credential is only ever read
//! from the environment.
//!
//! Both sources are passed in explicitly so resolution stays pure; reading
//! the file and the real environment happens in hfvoice-lib.

use std::collections::HashMap;
use std::fmt;

use crate::types::{DEFAULT_LLM_MODEL, DEFAULT_STT_MODEL, DEFAULT_TTS_MODEL, ModelIds};

pub const TOKEN_KEY: &str = "HF_TOKEN";
pub const STT_MODEL_KEY: &str = "STT_MODEL";
pub const LLM_MODEL_KEY: &str = "LLM_MODEL";
pub const TTS_MODEL_KEY: &str = "TTS_MODEL";

/// Parsed env-file contents.
pub type EnvFile = HashMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("HF_TOKEN not set in the process environment (env files are not consulted)")]
    MissingToken,
    #[error("failed to read env file {path}: {reason}")]
    EnvFile { path: String, reason: String },
}

/// Secret used to authenticate against the inference provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

/// Immutable configuration snapshot, built once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub models: ModelIds,
    pub token: Credential,
}

impl Settings {
    pub fn resolve(
        file: &EnvFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let token = resolve_credential(file, &env)?;
        let models = resolve_models(file, &env);
        Ok(Self { models, token })
    }
}

/// Resolve the three model ids: env file → environment → default.
pub fn resolve_models(file: &EnvFile, env: impl Fn(&str) -> Option<String>) -> ModelIds {
    ModelIds {
        stt: pick(file, &env, STT_MODEL_KEY, DEFAULT_STT_MODEL),
        llm: pick(file, &env, LLM_MODEL_KEY, DEFAULT_LLM_MODEL),
        tts: pick(file, &env, TTS_MODEL_KEY, DEFAULT_TTS_MODEL),
    }
}

/// Read the credential from the environment. A copy in the env file is
/// reported and dropped, never used as a fallback.
pub fn resolve_credential(
    file: &EnvFile,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Credential, ConfigError> {
    if file.contains_key(TOKEN_KEY) {
        tracing::warn!(
            "ignoring HF_TOKEN found in env file; secrets must come from the process environment"
        );
    }
    env(TOKEN_KEY)
        .filter(|v| !v.is_empty())
        .map(Credential)
        .ok_or(ConfigError::MissingToken)
}

fn pick(file: &EnvFile, env: impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    file.get(key)
        .filter(|v| !v.is_empty())
        .cloned()
        .or_else(|| env(key).filter(|v| !v.is_empty()))
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(pairs: &[(&str, &str)]) -> EnvFile {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn file_value_beats_environment() {
        let f = file(&[
            ("STT_MODEL", "file/stt"),
            ("LLM_MODEL", "file/llm"),
            ("TTS_MODEL", "file/tts"),
        ]);
        let e = env(&[
            ("STT_MODEL", "env/stt"),
            ("LLM_MODEL", "env/llm"),
            ("TTS_MODEL", "env/tts"),
        ]);
        let models = resolve_models(&f, e);
        assert_eq!(models.stt, "file/stt");
        assert_eq!(models.llm, "file/llm");
        assert_eq!(models.tts, "file/tts");
    }

    #[test]
    fn environment_used_when_file_absent() {
        let e = env(&[
            ("STT_MODEL", "env/stt"),
            ("LLM_MODEL", "env/llm"),
            ("TTS_MODEL", "env/tts"),
        ]);
        let models = resolve_models(&EnvFile::new(), e);
        assert_eq!(models.stt, "env/stt");
        assert_eq!(models.llm, "env/llm");
        assert_eq!(models.tts, "env/tts");
    }

    #[test]
    fn empty_file_value_falls_through_to_environment() {
        let f = file(&[("LLM_MODEL", "")]);
        let models = resolve_models(&f, env(&[("LLM_MODEL", "env/llm")]));
        assert_eq!(models.llm, "env/llm");
    }

    #[test]
    fn defaults_when_no_source() {
        let models = resolve_models(&EnvFile::new(), env(&[]));
        assert_eq!(models, ModelIds::default());
        assert_eq!(models.stt, "openai/whisper-small");
        assert_eq!(models.llm, "HuggingFaceH4/zephyr-7b-beta");
        assert_eq!(models.tts, "espnet/kan-bayashi_ljspeech_vits");
    }

    #[test]
    fn empty_environment_value_uses_default() {
        let models = resolve_models(&EnvFile::new(), env(&[("TTS_MODEL", "")]));
        assert_eq!(models.tts, DEFAULT_TTS_MODEL);
    }

    #[test]
    fn token_from_environment() {
        let token = resolve_credential(&EnvFile::new(), env(&[("HF_TOKEN", "hf_env")])).unwrap();
        assert_eq!(token.expose(), "hf_env");
    }

    #[test]
    fn token_in_file_only_is_rejected() {
        let f = file(&[("HF_TOKEN", "hf_file")]);
        let err = Settings::resolve(&f, env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));
    }

    #[test]
    fn token_in_file_never_overrides_environment() {
        let f = file(&[("HF_TOKEN", "hf_file")]);
        let settings = Settings::resolve(&f, env(&[("HF_TOKEN", "hf_env")])).unwrap();
        assert_eq!(settings.token.expose(), "hf_env");
    }

    #[test]
    fn empty_token_is_missing() {
        let err = resolve_credential(&EnvFile::new(), env(&[("HF_TOKEN", "")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));
    }

    #[test]
    fn credential_debug_is_redacted() {
        let rendered = format!("{:?}", Credential::new("hf_secret"));
        assert!(!rendered.contains("hf_secret"));
    }
}
