//! Playlist data model.
//!
//! A [`Playlist`] is the ordered list of [`CandidateClip`]s built from one
//! caption, plus the playback cursor and the "anything shown yet" flag the
//! player needs to tell an empty result from a finished one.

use serde::Serialize;

use super::tokenizer::Token;

/// What is known about a clip's existence.  Only discovered by trying to
/// play it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipStatus {
    Unresolved,
    Available,
    Missing,
}

/// A resolved, not yet verified reference to a sign clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateClip {
    pub token: Token,
    pub locator: String,
    pub status: ClipStatus,
}

impl CandidateClip {
    pub fn new(token: Token, locator: String) -> Self {
        Self {
            token,
            locator,
            status: ClipStatus::Unresolved,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Playlist {
    clips: Vec<CandidateClip>,
    cursor: usize,
    any_played: bool,
}

impl Playlist {
    pub fn new(clips: Vec<CandidateClip>) -> Self {
        Self {
            clips,
            cursor: 0,
            any_played: false,
        }
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn any_played(&self) -> bool {
        self.any_played
    }

    pub fn clips(&self) -> &[CandidateClip] {
        &self.clips
    }

    /// The clip under the cursor, or `None` once exhausted.
    pub fn current(&self) -> Option<&CandidateClip> {
        self.clips.get(self.cursor)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.clips.len()
    }

    /// Rewind for a fresh run.
    pub(crate) fn reset(&mut self) {
        self.cursor = 0;
        self.any_played = false;
        for clip in &mut self.clips {
            clip.status = ClipStatus::Unresolved;
        }
    }

    pub(crate) fn mark_current(&mut self, status: ClipStatus) {
        if status == ClipStatus::Available {
            self.any_played = true;
        }
        if let Some(clip) = self.clips.get_mut(self.cursor) {
            clip.status = status;
        }
    }

    pub(crate) fn advance(&mut self) {
        if self.cursor < self.clips.len() {
            self.cursor += 1;
        }
    }
}
