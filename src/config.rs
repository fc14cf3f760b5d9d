//! Client configuration.
//!
//! Precedence, highest first: command-line flags, the process environment
//! (which includes anything loaded from `.env`), `settings.json`, built-in
//! defaults.

use std::time::Duration;

use anyhow::{Result, bail};
use tracing::debug;

use crate::app_settings::AppSettings;
use crate::llm::{DEFAULT_API_URL, DEFAULT_MODEL};

pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";
pub const MODEL_VAR: &str = "GEMINI_MODEL";
pub const API_URL_VAR: &str = "GEMINI_API_URL";

const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_key: String,
    pub model: String,
    pub api_url: String,
    pub startup_timeout: Duration,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model: Option<String>,
    pub api_url: Option<String>,
}

/// Loads `.env` from the working directory or the nearest parent that has
/// one. Variables already set in the environment are left alone.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) => debug!(error = %e, "no .env loaded"),
    }
}

impl ClientConfig {
    pub fn resolve(settings: Option<&AppSettings>, overrides: &Overrides) -> Result<Self> {
        Self::resolve_with(settings, overrides, |key| std::env::var(key).ok())
    }

    /// Like [`ClientConfig::resolve`] but reads variables through `env`.
    pub fn resolve_with(
        settings: Option<&AppSettings>,
        overrides: &Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let provider = settings.and_then(|s| s.provider.as_ref());

        let Some(api_key) = env(API_KEY_VAR).or_else(|| provider.and_then(|p| p.get_api_key()))
        else {
            bail!(
                "no API key configured: set {API_KEY_VAR} in the environment or a .env file, \
                 or add a provider to settings.json"
            );
        };
        let model = overrides
            .model
            .clone()
            .or_else(|| env(MODEL_VAR))
            .or_else(|| provider.map(|p| p.get_model()))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_url = overrides
            .api_url
            .clone()
            .or_else(|| env(API_URL_VAR))
            .or_else(|| provider.map(|p| p.get_api_url()))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let startup_timeout = settings
            .and_then(|s| s.startup_timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_STARTUP_TIMEOUT);

        Ok(Self {
            api_key,
            model,
            api_url,
            startup_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_settings::ProviderSettings;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    fn settings() -> AppSettings {
        AppSettings {
            provider: Some(ProviderSettings::Gemini {
                api_key: Some("from-file".into()),
                model: Some("file-model".into()),
                api_url: None,
            }),
            startup_timeout_secs: Some(3),
        }
    }

    #[test]
    fn missing_key_is_an_error() {
        let err = ClientConfig::resolve_with(None, &Overrides::default(), env_of(&[])).unwrap_err();
        assert!(err.to_string().contains(API_KEY_VAR));
    }

    #[test]
    fn defaults_fill_the_gaps() {
        let c = ClientConfig::resolve_with(None, &Overrides::default(), env_of(&[(API_KEY_VAR, "k")]))
            .unwrap();
        assert_eq!(c.model, DEFAULT_MODEL);
        assert_eq!(c.api_url, DEFAULT_API_URL);
        assert_eq!(c.startup_timeout, DEFAULT_STARTUP_TIMEOUT);
    }

    #[test]
    fn environment_beats_settings_and_flags_beat_both() {
        let s = settings();
        let env = env_of(&[(API_KEY_VAR, "from-env"), (MODEL_VAR, "env-model")]);
        let c = ClientConfig::resolve_with(Some(&s), &Overrides::default(), &env).unwrap();
        assert_eq!(c.api_key, "from-env");
        assert_eq!(c.model, "env-model");
        assert_eq!(c.startup_timeout, Duration::from_secs(3));

        let flags = Overrides {
            model: Some("flag-model".into()),
            api_url: Some("http://localhost:1234".into()),
        };
        let c = ClientConfig::resolve_with(Some(&s), &flags, &env).unwrap();
        assert_eq!(c.model, "flag-model");
        assert_eq!(c.api_url, "http://localhost:1234");
    }

    #[test]
    fn settings_file_supplies_the_key_when_env_is_blank() {
        let s = settings();
        let c = ClientConfig::resolve_with(Some(&s), &Overrides::default(), env_of(&[(API_KEY_VAR, "  ")]))
            .unwrap();
        assert_eq!(c.api_key, "from-file");
        assert_eq!(c.model, "file-model");
    }

    #[test]
    fn dotenv_values_outrank_the_settings_file() {
        let dotenv = "GOOGLE_API_KEY=from-dotenv\nGEMINI_MODEL=dotenv-model\n";
        let map: HashMap<String, String> = dotenvy::from_read_iter(dotenv.as_bytes())
            .collect::<Result<_, _>>()
            .unwrap();
        let env = move |k: &str| map.get(k).cloned();

        let c = ClientConfig::resolve_with(Some(&settings()), &Overrides::default(), env).unwrap();
        assert_eq!(c.api_key, "from-dotenv");
        assert_eq!(c.model, "dotenv-model");
    }
}
