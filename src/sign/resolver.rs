//! Clip resolver: token → candidate clip locator.
//!
//! Pure string interpolation of `{base}/{Token}.{ext}`.  Existence is never
//! checked here; the player finds out when the device tries to load it.

use crate::config::{AssetLayout, SignConfig};

use super::playlist::{CandidateClip, Playlist};
use super::tokenizer::Token;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipResolver {
    /// Normalized base, without a trailing slash.
    prefix: String,
    /// Extension, without a leading dot.
    extension: String,
}

impl ClipResolver {
    /// `Root` forces a leading `/` on the base; `RelativeToPage` uses the
    /// base as given.  Absolute URLs are never touched.
    pub fn new(base_path: &str, layout: AssetLayout, extension: &str) -> Self {
        let trimmed = base_path.trim().trim_end_matches('/');
        let prefix = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            match layout {
                AssetLayout::Root => format!("/{}", trimmed.trim_start_matches('/')),
                AssetLayout::RelativeToPage => trimmed.to_string(),
            }
        };
        Self {
            prefix,
            extension: extension.trim().trim_start_matches('.').to_string(),
        }
    }

    /// Build from config, expanding `~` in local base paths.
    pub fn from_config(config: &SignConfig) -> Self {
        let base = shellexpand::tilde(&config.base_path);
        Self::new(&base, config.layout, &config.extension)
    }

    pub fn locator(&self, token: &Token) -> String {
        match self.prefix.as_str() {
            "" => format!("{}.{}", token, self.extension),
            "/" => format!("/{}.{}", token, self.extension),
            prefix => format!("{}/{}.{}", prefix, token, self.extension),
        }
    }

    pub fn resolve(&self, token: Token) -> CandidateClip {
        let locator = self.locator(&token);
        CandidateClip::new(token, locator)
    }

    /// Resolve every token, preserving order.
    pub fn playlist(&self, tokens: Vec<Token>) -> Playlist {
        Playlist::new(tokens.into_iter().map(|t| self.resolve(t)).collect())
    }
}

impl Default for ClipResolver {
    fn default() -> Self {
        Self::from_config(&SignConfig::default())
    }
}
