use serde::{Deserialize, Serialize};

use crate::llm::{DEFAULT_API_URL, DEFAULT_MODEL};

/// Contents of `settings.json` in the user's config directory.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AppSettings {
    pub provider: Option<ProviderSettings>,
    /// Seconds to wait for a tool server's `initialize` reply.
    pub startup_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "id", rename_all = "lowercase")]
pub enum ProviderSettings {
    Gemini {
        api_key: Option<String>,
        model: Option<String>,
        api_url: Option<String>,
    },
}

impl ProviderSettings {
    pub fn get_api_url(&self) -> String {
        match &self {
            ProviderSettings::Gemini { api_url, .. } => api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        }
    }

    pub fn get_api_key(&self) -> Option<String> {
        match &self {
            ProviderSettings::Gemini { api_key, .. } => api_key.clone().filter(|k| !k.is_empty()),
        }
    }

    pub fn get_model(&self) -> String {
        match &self {
            ProviderSettings::Gemini { model, .. } => {
                model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_is_tagged_by_id() {
        let s: AppSettings = serde_json::from_str(
            r#"{"provider": {"id": "gemini", "api_key": "abc", "model": null, "api_url": null}}"#,
        )
        .unwrap();
        let p = s.provider.unwrap();
        assert_eq!(p.get_api_key().as_deref(), Some("abc"));
        assert_eq!(p.get_model(), DEFAULT_MODEL);
        assert_eq!(p.get_api_url(), DEFAULT_API_URL);
        assert_eq!(s.startup_timeout_secs, None);
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let p = ProviderSettings::Gemini {
            api_key: Some(String::new()),
            model: None,
            api_url: None,
        };
        assert_eq!(p.get_api_key(), None);
    }
}
