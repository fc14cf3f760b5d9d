//! Text-completion oracle: the hosted model the dispatch loop talks to.

use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Header that carries the API key; request URLs stay key-free.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Decoding settings sent with every completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_p: 0.9,
            top_k: 50,
            max_output_tokens: 2000,
            response_mime_type: "text/plain".into(),
        }
    }
}

impl GenerationConfig {
    /// Lower temperature and a shorter ceiling, for arithmetic.
    pub fn precise() -> Self {
        Self {
            temperature: 0.1,
            max_output_tokens: 1500,
            ..Self::default()
        }
    }
}

#[async_trait::async_trait]
pub trait Oracle: Send + Sync {
    async fn complete(&self, prompt: &str, config: &GenerationConfig) -> Result<String>;
}

/// Gemini `generateContent` over plain HTTPS.
pub struct GeminiClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_url: String, api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_url, self.model)
    }
}

#[async_trait::async_trait]
impl Oracle for GeminiClient {
    async fn complete(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": config,
        });
        debug!(model = %self.model, prompt_len = prompt.len(), "generateContent");

        let res = self
            .http
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            bail!("Gemini returned {status}: {body}");
        }

        let body: Value = res.json().await.map_err(reqwest::Error::without_url)?;
        extract_text(&body)
    }
}

/// Joins the text parts of the first candidate.
fn extract_text(body: &Value) -> Result<String> {
    if let Some(reason) = body.pointer("/promptFeedback/blockReason").and_then(|v| v.as_str()) {
        bail!("prompt was blocked by the model ({reason})");
    }
    let parts = body
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
        .ok_or_else(|| anyhow!("model returned no candidates"))?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();
    if text.trim().is_empty() {
        let reason = body
            .pointer("/candidates/0/finishReason")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        bail!("model returned an empty response (finish reason: {reason})");
    }
    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn completion_sends_generation_config() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-test:generateContent")
            .match_header("x-goog-api-key", "secret")
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": {
                    "temperature": 0.1,
                    "topK": 50,
                    "maxOutputTokens": 1500,
                    "responseMimeType": "text/plain"
                }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "candidates": [{
                        "content": { "parts": [{ "text": "  The answer " }, { "text": "is 42.  " }] },
                        "finishReason": "STOP"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = GeminiClient::new(server.url(), "secret".into(), "gemini-test".into());
        let text = client
            .complete("What is 15 + 27?", &GenerationConfig::precise())
            .await
            .unwrap();
        assert_eq!(text, "The answer is 42.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn http_errors_surface_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(429)
            .with_body("quota exceeded")
            .create_async()
            .await;

        let client = GeminiClient::new(server.url(), "k".into(), "m".into());
        let err = client
            .complete("hi", &GenerationConfig::default())
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("429"), "{err}");
        assert!(err.contains("quota exceeded"), "{err}");
    }

    #[tokio::test]
    async fn connection_errors_do_not_leak_the_key() {
        let client = GeminiClient::new("http://127.0.0.1:1".into(), "SECRET-KEY-123".into(), "m".into());
        let err = client.complete("hi", &GenerationConfig::default()).await.unwrap_err();
        let shown = format!("{err:#}");
        assert!(!shown.contains("SECRET-KEY-123"), "{shown}");
    }

    #[test]
    fn blocked_prompts_are_errors() {
        let body = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert!(extract_text(&body).unwrap_err().to_string().contains("SAFETY"));
        assert!(extract_text(&json!({ "candidates": [] })).is_err());
    }
}
