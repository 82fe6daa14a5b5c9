//! Text simplification providers.
//!
//! A [`Simplifier`] turns a raw speech transcript into short, plain
//! sentences in the target language before it is rendered as signs.

pub mod backend;
pub mod gemini;
pub mod mock;
pub mod prompt;

use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;

use crate::config::SimplifierConfig;

#[async_trait]
pub trait Simplifier: Send + Sync {
    /// Simplify `text` into `language`.
    async fn simplify(&self, text: &str, language: &str) -> Result<String>;

    /// Human-readable provider name.
    fn name(&self) -> &str;
}

/// Passes text through untouched.
#[derive(Debug, Clone, Default)]
pub struct IdentitySimplifier;

#[async_trait]
impl Simplifier for IdentitySimplifier {
    async fn simplify(&self, text: &str, _language: &str) -> Result<String> {
        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        "identity"
    }
}

/// Create a [`Simplifier`] from configuration.
///
/// Supported `provider` values:
/// - `"backend"`: the caption backend's `/simplify-text` endpoint.
/// - `"gemini"`: Gemini `generateContent` directly.
/// - `"identity"`: no simplification.
pub fn create_simplifier(config: &SimplifierConfig) -> Result<Arc<dyn Simplifier>> {
    match config.provider.as_str() {
        "backend" => Ok(Arc::new(backend::BackendSimplifier::new(config)?)),
        "gemini" => Ok(Arc::new(gemini::GeminiSimplifier::from_config(config)?)),
        "identity" => Ok(Arc::new(IdentitySimplifier)),
        other => bail!(
            "unknown simplifier provider: {other:?} (expected \"backend\", \"gemini\" or \"identity\")"
        ),
    }
}
