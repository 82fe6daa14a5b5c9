//! Gemini simplifier.
//!
//! Calls `POST {api_base}/v1beta/models/{model}:generateContent` directly
//! with the simplification prompt and returns the first candidate's text.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SimplifierConfig;
use crate::utils::preview;

use super::Simplifier;
use super::prompt::build_prompt;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

pub struct GeminiSimplifier {
    url: String,
    api_key: String,
    temperature: f64,
    max_output_tokens: u32,
    client: reqwest::Client,
}

impl GeminiSimplifier {
    pub fn new(config: &SimplifierConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            url: format!(
                "{}/v1beta/models/{}:generateContent",
                config.api_base.trim_end_matches('/'),
                config.model
            ),
            api_key,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            client,
        })
    }

    /// Read the API key from the environment variable named in the config.
    pub fn from_config(config: &SimplifierConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .with_context(|| format!("{} is not set", config.api_key_env))?;
        Self::new(config, api_key)
    }
}

#[async_trait]
impl Simplifier for GeminiSimplifier {
    async fn simplify(&self, text: &str, language: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(text, language),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };

        let response: GenerateResponse = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .context("generateContent request failed")?
            .error_for_status()
            .context("generateContent returned error status")?
            .json()
            .await
            .context("failed to parse generateContent response as JSON")?;

        let simplified = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow!("generateContent returned no text"))?;

        debug!(output = %preview(&simplified, 60), "Gemini simplification complete");
        Ok(simplified)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sign::http_stub::HttpStub;

    const PATH: &str = "/v1beta/models/gemini-3-flash:generateContent";

    fn simplifier(api_base: &str) -> GeminiSimplifier {
        let config = SimplifierConfig {
            provider: "gemini".to_string(),
            api_base: api_base.to_string(),
            ..Default::default()
        };
        GeminiSimplifier::new(&config, "test-key".to_string()).unwrap()
    }

    #[tokio::test]
    async fn returns_first_candidate_trimmed() {
        let stub = HttpStub::start(&[(
            "POST",
            PATH,
            200,
            r#"{"candidates":[{"content":{"parts":[{"text":"  We won the match (joyfully).\n"}]}},{"content":{"parts":[{"text":"other"}]}}]}"#,
        )])
        .await;

        let out = simplifier(&stub.base_url)
            .simplify("hum match jeet gaye", "English")
            .await
            .unwrap();
        assert_eq!(out, "We won the match (joyfully).");

        let request = &stub.requests()[0];
        assert_eq!(request.headers.get("x-goog-api-key").unwrap(), "test-key");
        let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body["generationConfig"]["temperature"], 0.2);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("[Raw Text]: \"hum match jeet gaye\""));
        assert!(prompt.contains("[Target Language]: \"English\""));
    }

    #[tokio::test]
    async fn no_candidates_is_an_error() {
        let stub = HttpStub::start(&[("POST", PATH, 200, r#"{"candidates":[]}"#)]).await;
        let err = simplifier(&stub.base_url)
            .simplify("hello", "English")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no text"));
    }

    #[tokio::test]
    async fn error_status_is_an_error() {
        let stub = HttpStub::start(&[("POST", PATH, 403, r#"{"error":{}}"#)]).await;
        assert!(
            simplifier(&stub.base_url)
                .simplify("hello", "English")
                .await
                .is_err()
        );
    }

    #[test]
    fn missing_api_key_fails_construction() {
        let config = SimplifierConfig {
            provider: "gemini".to_string(),
            api_key_env: "VAANI_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        let err = GeminiSimplifier::from_config(&config).err().unwrap();
        assert!(err.to_string().contains("VAANI_TEST_KEY_THAT_IS_NEVER_SET"));
    }
}
