//! Caption-to-sign playback pipeline
//!
//! Turns caption text into a sequence of short sign-language clips played
//! one after another on a single playback device:
//! text → tokens → candidate clips → playlist → device.
//!
//! A newer caption supersedes the one still playing (or queues behind it,
//! per [`SupersedePolicy`](crate::config::SupersedePolicy)).  Missing clips
//! are skipped silently and never stall the playlist.

pub mod controller;
pub mod device;
#[cfg(test)]
mod http_stub;
pub mod player;
pub mod playlist;
pub mod resolver;
pub mod runtime;
pub mod session;
pub mod signal;
pub mod simplifier;
pub mod tokenizer;

pub use controller::{Caption, CaptionController, ChunkOutcome};
pub use device::PlaybackDevice;
pub use player::{PlayerState, PlaylistPlayer};
pub use playlist::{CandidateClip, ClipStatus, Playlist};
pub use resolver::ClipResolver;
pub use runtime::{PlayerHandle, PlayerRuntime};
pub use session::CaptionSession;
pub use signal::PlaybackSignal;
pub use tokenizer::{Token, Tokenizer, tokenize};
