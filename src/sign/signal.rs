//! Playback signals for the UI layer.

use serde::Serialize;

use super::tokenizer::Token;

/// Progress and terminal notifications emitted by the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackSignal {
    /// A new playlist took over the device.
    Loading,
    /// The clip at `index` started playing.
    Playing { token: Token, index: usize },
    /// Advisory: the clip at `index` could not be played and was skipped.
    ClipMissing {
        token: Token,
        index: usize,
        reason: String,
    },
    /// The playlist ran out without a single clip playing.
    Empty,
    /// The playlist ran out after at least one clip played.
    Idle,
}

impl PlaybackSignal {
    /// `Empty` and `Idle` end a playlist.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaybackSignal::Empty | PlaybackSignal::Idle)
    }

    /// Status line shown for this signal, if any.
    pub fn status_text(&self) -> Option<&'static str> {
        match self {
            PlaybackSignal::Loading => Some("Loading sign language..."),
            PlaybackSignal::Empty => Some("No sign language videos available for these words."),
            _ => None,
        }
    }
}
