//! Vaani - real-time captions rendered as sign language
//!
//! This crate provides:
//! - Caption tokenizing and sign clip resolution
//! - A playlist player that drives a single playback device, with
//!   supersession of stale captions
//! - A caption controller that simplifies live transcripts before playing them
//! - Text simplification providers (caption backend, Gemini)

pub mod config;
pub mod sign;
pub mod utils;

pub use config::Config;
