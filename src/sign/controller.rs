//! Caption controller.
//!
//! Glue between the transcript source and the sign player: keeps the
//! caption session, simplifies final transcripts (falling back to the raw
//! text when the simplifier fails), and turns each resulting chunk into a
//! playlist handed to the player under the configured supersede policy.

use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::{debug, info, warn};

use crate::config::{SignConfig, SupersedePolicy};
use crate::utils::preview;

use super::resolver::ClipResolver;
use super::runtime::PlayerHandle;
use super::session::CaptionSession;
use super::simplifier::Simplifier;
use super::tokenizer::{Token, Tokenizer};

/// What happened to a text chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// A playlist with these tokens was handed to the player.
    Submitted { tokens: Vec<Token> },
    /// The chunk had no words; current playback is left alone.
    Ignored,
}

/// Result of processing one final transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    pub raw: String,
    /// Text actually rendered as signs.
    pub simple: String,
    /// `false` when the simplifier failed and the raw text was used.
    pub simplified: bool,
    pub outcome: ChunkOutcome,
}

pub struct CaptionController {
    tokenizer: Tokenizer,
    resolver: ClipResolver,
    policy: SupersedePolicy,
    simplifier: Arc<dyn Simplifier>,
    player: PlayerHandle,
    session: CaptionSession,
}

impl CaptionController {
    pub fn new(
        config: &SignConfig,
        simplifier: Arc<dyn Simplifier>,
        player: PlayerHandle,
        language: impl Into<String>,
    ) -> Self {
        Self {
            tokenizer: Tokenizer::new(config.punctuation),
            resolver: ClipResolver::from_config(config),
            policy: config.supersede_policy,
            simplifier,
            player,
            session: CaptionSession::new(language),
        }
    }

    pub fn session(&self) -> &CaptionSession {
        &self.session
    }

    pub fn player(&self) -> &PlayerHandle {
        &self.player
    }

    pub fn policy(&self) -> SupersedePolicy {
        self.policy
    }

    // ── Playback ─────────────────────────────────────────────────

    /// Tokenize, resolve and play one chunk of caption text.
    pub fn on_text_chunk(&mut self, chunk: &str) -> Result<ChunkOutcome> {
        let tokens = self.tokenizer.tokenize(chunk);
        if tokens.is_empty() {
            debug!(chunk = %preview(chunk, 40), "Chunk has no words, ignoring");
            return Ok(ChunkOutcome::Ignored);
        }

        let playlist = self.resolver.playlist(tokens.clone());
        info!(
            clips = playlist.len(),
            policy = ?self.policy,
            chunk = %preview(chunk, 40),
            "Submitting sign playlist"
        );
        if !self.player.submit(playlist, self.policy) {
            bail!("sign player is no longer running");
        }
        Ok(ChunkOutcome::Submitted { tokens })
    }

    /// Play `text` again, e.g. after it was edited by hand.
    pub fn replay(&mut self, text: &str) -> Result<ChunkOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(ChunkOutcome::Ignored);
        }
        self.on_text_chunk(text)
    }

    // ── Transcripts ──────────────────────────────────────────────

    pub fn on_interim_transcript(&mut self, text: &str) {
        self.session.set_interim(text);
    }

    /// Record a final transcript segment, simplify it and play the result.
    ///
    /// Returns `None` for blank segments.
    pub async fn on_final_transcript(&mut self, text: &str) -> Result<Option<Caption>> {
        let Some(raw) = self.session.push_raw_final(text) else {
            return Ok(None);
        };

        let (simple, simplified) = self.simplify_or_raw(&raw).await;
        self.session.append_simple(&simple);
        let outcome = self.on_text_chunk(&simple)?;
        Ok(Some(Caption {
            raw,
            simple,
            simplified,
            outcome,
        }))
    }

    /// Simplify a hand-edited transcript as a whole, replace the
    /// simplified history with the result and play it.
    pub async fn resimplify(&mut self, edited: &str) -> Result<Option<Caption>> {
        let raw = edited.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        let raw = raw.to_string();

        self.session.mark_processing();
        let (simple, simplified) = self.simplify_or_raw(&raw).await;
        self.session.replace_simple(&simple);
        let outcome = self.replay(&simple)?;
        Ok(Some(Caption {
            raw,
            simple,
            simplified,
            outcome,
        }))
    }

    async fn simplify_or_raw(&self, raw: &str) -> (String, bool) {
        let language = self.session.language();
        match self.simplifier.simplify(raw, language).await {
            Ok(simple) if !simple.trim().is_empty() => (simple.trim().to_string(), true),
            Ok(_) => {
                warn!(
                    simplifier = self.simplifier.name(),
                    "Simplifier returned nothing, using raw text"
                );
                (raw.to_string(), false)
            }
            Err(e) => {
                warn!(
                    simplifier = self.simplifier.name(),
                    error = %format!("{e:#}"),
                    "Simplification failed, using raw text"
                );
                (raw.to_string(), false)
            }
        }
    }

    // ── Session ──────────────────────────────────────────────────

    pub fn start_listening(&mut self) {
        self.session.begin();
        info!(session = %self.session.id(), language = self.session.language(), "Listening");
    }

    pub fn stop_listening(&mut self) {
        self.session.end();
        info!(session = %self.session.id(), "Stopped listening");
    }

    pub fn clear(&mut self) {
        self.session.clear();
    }

    pub fn set_language(&mut self, language: &str) {
        debug!(language, "Target language changed");
        self.session.set_language(language);
    }
}
