//! Playback device contract.
//!
//! A device is the single surface clips are shown on (a video element in
//! the browser, [`headless::HeadlessDevice`] here).  It is driven by the
//! player one clip at a time: [`PlaybackDevice::load`] never blocks, and
//! the outcome comes back later as a [`DeviceEvent`] carrying the
//! [`Ticket`] it was issued with.  The player drops every event whose
//! ticket is not the one it is currently waiting on.

pub mod headless;
pub mod mock;

use thiserror::Error;
use tokio::sync::mpsc;

/// Monotonic tag identifying which playlist currently drives the device.
pub type Generation = u64;

/// Identifies one load request: which playlist, which clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub generation: Generation,
    pub index: usize,
}

/// Per-clip failures.  None of them are fatal to the playlist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipError {
    #[error("clip not found: {locator}")]
    ResourceMissing { locator: String },

    #[error("playback start rejected: {reason}")]
    PlaybackStartRejected { reason: String },

    #[error("failed to decode {locator}: {message}")]
    Decode { locator: String, message: String },

    #[error("failed to probe {locator}: {message}")]
    Probe { locator: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEventKind {
    /// The clip loaded and playback started.
    Started,
    /// Playback reached the end of the clip.
    Ended,
    /// Loading or starting failed.
    Failed(ClipError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEvent {
    pub ticket: Ticket,
    pub kind: DeviceEventKind,
}

impl DeviceEvent {
    pub fn started(ticket: Ticket) -> Self {
        Self {
            ticket,
            kind: DeviceEventKind::Started,
        }
    }

    pub fn ended(ticket: Ticket) -> Self {
        Self {
            ticket,
            kind: DeviceEventKind::Ended,
        }
    }

    pub fn failed(ticket: Ticket, error: ClipError) -> Self {
        Self {
            ticket,
            kind: DeviceEventKind::Failed(error),
        }
    }
}

pub type DeviceEventSender = mpsc::UnboundedSender<DeviceEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackOptions {
    pub muted: bool,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self { muted: true }
    }
}

/// A single load request handed to the device.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub ticket: Ticket,
    pub locator: String,
    pub options: PlaybackOptions,
    /// Where `Started` / `Ended` / `Failed` for this ticket must be sent.
    pub events: DeviceEventSender,
}

/// The one shared playback surface.
pub trait PlaybackDevice: Send {
    /// Replace whatever is loaded with `request.locator` and start it.
    fn load(&mut self, request: LoadRequest);

    /// Stop in-flight work.  Events already queued may still arrive and
    /// are filtered by ticket.
    fn halt(&mut self);

    /// Nothing to show: hide the surface.
    fn hide(&mut self);

    /// Human-readable device name.
    fn name(&self) -> &str;
}

impl<T: PlaybackDevice + ?Sized> PlaybackDevice for Box<T> {
    fn load(&mut self, request: LoadRequest) {
        (**self).load(request)
    }

    fn halt(&mut self) {
        (**self).halt()
    }

    fn hide(&mut self) {
        (**self).hide()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
