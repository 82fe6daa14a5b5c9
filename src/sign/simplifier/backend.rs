//! Caption backend simplifier.
//!
//! `POST {endpoint}/simplify-text` with `{"text", "language"}`; the backend
//! answers `{"raw_text", "simple_text", "saved"}`.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SimplifierConfig;

use super::Simplifier;

#[derive(Debug, Serialize)]
struct SimplifyRequest<'a> {
    text: &'a str,
    language: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SimplifyResponse {
    pub raw_text: String,
    pub simple_text: String,
    /// Whether the backend stored the transcript.
    #[serde(default)]
    pub saved: bool,
}

pub struct BackendSimplifier {
    endpoint: String,
    client: reqwest::Client,
}

impl BackendSimplifier {
    pub fn new(config: &SimplifierConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub async fn request(&self, text: &str, language: &str) -> Result<SimplifyResponse> {
        if text.trim().is_empty() {
            bail!("refusing to simplify empty text");
        }
        let response: SimplifyResponse = self
            .client
            .post(format!("{}/simplify-text", self.endpoint))
            .json(&SimplifyRequest { text, language })
            .send()
            .await
            .context("simplify-text request failed")?
            .error_for_status()
            .context("simplify-text returned error status")?
            .json()
            .await
            .context("failed to parse simplify-text response as JSON")?;

        debug!(saved = response.saved, "Backend simplification complete");
        Ok(response)
    }
}

#[async_trait]
impl Simplifier for BackendSimplifier {
    async fn simplify(&self, text: &str, language: &str) -> Result<String> {
        Ok(self.request(text, language).await?.simple_text)
    }

    fn name(&self) -> &str {
        "backend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sign::http_stub::HttpStub;

    fn simplifier(endpoint: &str) -> BackendSimplifier {
        BackendSimplifier::new(&SimplifierConfig {
            endpoint: format!("{endpoint}/"),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn posts_text_and_language() {
        let stub = HttpStub::start(&[(
            "POST",
            "/simplify-text",
            200,
            r#"{"raw_text":"um the cat uh sat","simple_text":"The cat sat.","saved":true}"#,
        )])
        .await;

        let out = simplifier(&stub.base_url)
            .simplify("um the cat uh sat", "Hindi")
            .await
            .unwrap();
        assert_eq!(out, "The cat sat.");

        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"text": "um the cat uh sat", "language": "Hindi"})
        );
    }

    #[tokio::test]
    async fn saved_defaults_to_false() {
        let stub = HttpStub::start(&[(
            "POST",
            "/simplify-text",
            200,
            r#"{"raw_text":"hi","simple_text":"Hi."}"#,
        )])
        .await;
        let response = simplifier(&stub.base_url).request("hi", "English").await.unwrap();
        assert!(!response.saved);
        assert_eq!(response.raw_text, "hi");
    }

    #[tokio::test]
    async fn error_status_is_an_error() {
        let stub = HttpStub::start(&[(
            "POST",
            "/simplify-text",
            500,
            r#"{"detail":"Error processing text"}"#,
        )])
        .await;
        let err = simplifier(&stub.base_url)
            .simplify("hello", "English")
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("error status"));
    }

    #[tokio::test]
    async fn empty_text_is_rejected_locally() {
        let stub = HttpStub::start(&[]).await;
        assert!(simplifier(&stub.base_url).simplify("  ", "English").await.is_err());
        assert!(stub.requests().is_empty());
    }
}
