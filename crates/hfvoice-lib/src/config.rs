//! Env-file loading and startup settings.
//!
//! The env file is parsed into a map and never exported into the process
//! environment, so values from it cannot leak into `std::env::var` lookups.

use std::path::Path;

use hfvoice_core::settings::{ConfigError, EnvFile, Settings};

/// Default env file, relative to the working directory.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Parse an env file without touching the process environment.
///
/// A missing file is treated as empty. Lines that don't parse are skipped
/// with a warning; a bare `KEY` line is kept as an empty value so it still
/// shows up in the file (and falls through to the environment).
pub fn read_env_file(path: &Path) -> Result<EnvFile, ConfigError> {
    let env_file_err = |e: dotenvy::Error| ConfigError::EnvFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => {
            tracing::debug!("no env file at {}", path.display());
            return Ok(EnvFile::new());
        }
        Err(e) => return Err(env_file_err(e)),
    };

    let mut file = EnvFile::new();
    for item in iter {
        match item {
            Ok((key, value)) => {
                file.insert(key, value);
            }
            Err(dotenvy::Error::LineParse(line, _)) => match bare_key(&line) {
                Some(key) => {
                    file.insert(key.to_string(), String::new());
                }
                None => tracing::warn!(
                    "skipping unparseable line in {}: {:?}",
                    path.display(),
                    line.trim()
                ),
            },
            Err(e) => return Err(env_file_err(e)),
        }
    }
    Ok(file)
}

/// `KEY` or `export KEY` with no `=`.
fn bare_key(line: &str) -> Option<&str> {
    let line = line.trim();
    let key = line.strip_prefix("export ").map_or(line, str::trim);
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    valid.then_some(key)
}

/// Resolve settings from an env file and an explicit environment lookup.
pub fn load_with(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings, ConfigError> {
    let file = read_env_file(path)?;
    let settings = Settings::resolve(&file, env)?;
    tracing::info!(
        stt = %settings.models.stt,
        llm = %settings.models.llm,
        tts = %settings.models.tts,
        "models resolved"
    );
    Ok(settings)
}

/// Resolve settings from an env file and the real process environment.
pub fn load(path: &Path) -> Result<Settings, ConfigError> {
    load_with(path, |key| std::env::var(key).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_env(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    fn token_only(key: &str) -> Option<String> {
        (key == "HF_TOKEN").then(|| "hf_env".to_string())
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = read_env_file(&dir.path().join("absent.env")).unwrap();
        assert!(file.is_empty());
    }

    #[test]
    fn parses_model_overrides() {
        let f = write_env(
            "STT_MODEL=openai/whisper-large-v3\n# comment\nLLM_MODEL=\"mistralai/Mistral-7B\"\n",
        );
        let file = read_env_file(f.path()).unwrap();
        assert_eq!(
            file.get("STT_MODEL").map(String::as_str),
            Some("openai/whisper-large-v3")
        );
        assert_eq!(
            file.get("LLM_MODEL").map(String::as_str),
            Some("mistralai/Mistral-7B")
        );
        assert!(!file.contains_key("TTS_MODEL"));
    }

    #[test]
    fn file_overrides_apply_to_settings() {
        let f = write_env("TTS_MODEL=facebook/mms-tts-eng\n");
        let settings = load_with(f.path(), token_only).unwrap();
        assert_eq!(settings.models.tts, "facebook/mms-tts-eng");
        assert_eq!(settings.models.stt, "openai/whisper-small");
    }

    #[test]
    fn token_in_file_does_not_satisfy_startup() {
        let f = write_env("HF_TOKEN=hf_from_file\n");
        let err = load_with(f.path(), |_| None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));
    }

    #[test]
    fn token_in_file_is_not_exported() {
        let f = write_env("HF_TOKEN=hf_from_file\n");
        let settings = load_with(f.path(), token_only).unwrap();
        assert_eq!(settings.token.expose(), "hf_env");
    }

    #[test]
    fn unparseable_line_is_skipped() {
        let f = write_env("STT_MODEL=openai/whisper-large-v3\nthis line is a note\n");
        let settings = load_with(f.path(), token_only).unwrap();
        assert_eq!(settings.models.stt, "openai/whisper-large-v3");
        assert_eq!(settings.models.llm, "HuggingFaceH4/zephyr-7b-beta");
    }

    #[test]
    fn lines_after_a_bad_line_still_apply() {
        let f = write_env("STT_MODEL openai/whisper-small\nTTS_MODEL=facebook/mms-tts-eng\n");
        let file = read_env_file(f.path()).unwrap();
        assert_eq!(
            file.get("TTS_MODEL").map(String::as_str),
            Some("facebook/mms-tts-eng")
        );
        assert!(!file.contains_key("STT_MODEL"));
    }

    #[test]
    fn bare_token_line_is_kept_empty_and_ignored() {
        let f = write_env("HF_TOKEN\nTTS_MODEL=facebook/mms-tts-eng\n");
        let file = read_env_file(f.path()).unwrap();
        assert_eq!(file.get("HF_TOKEN").map(String::as_str), Some(""));

        let settings = load_with(f.path(), token_only).unwrap();
        assert_eq!(settings.models.tts, "facebook/mms-tts-eng");
        assert_eq!(settings.token.expose(), "hf_env");
    }

    #[test]
    fn bare_key_detection() {
        assert_eq!(bare_key("HF_TOKEN\n"), Some("HF_TOKEN"));
        assert_eq!(bare_key("export  STT_MODEL"), Some("STT_MODEL"));
        assert_eq!(bare_key("this line is a note"), None);
        assert_eq!(bare_key("   "), None);
    }
}
