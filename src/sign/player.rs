//! Playlist player: the state machine that drives the playback device.
//!
//! ```text
//! Idle → Loading(i) → Playing(i) → (Ended | Failed) → Loading(i+1) … → Idle
//! ```
//!
//! The player owns the device and at most one active [`Playlist`].  Every
//! load is issued with a [`Ticket`] `{generation, index}`; starting a new
//! playlist bumps the generation in the same call that halts the device, so
//! any event still in flight for the old playlist is recognised as stale
//! and dropped before it can touch the new one.
//!
//! The player itself is synchronous.  [`super::runtime`] owns it inside a
//! single task and feeds it commands and device events.

use std::collections::VecDeque;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::SupersedePolicy;

use super::device::{
    ClipError, DeviceEvent, DeviceEventKind, DeviceEventSender, Generation, LoadRequest,
    PlaybackDevice, PlaybackOptions, Ticket,
};
use super::playlist::{ClipStatus, Playlist};
use super::signal::PlaybackSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Loading(usize),
    Playing(usize),
}

pub struct PlaylistPlayer<D: PlaybackDevice> {
    device: D,
    options: PlaybackOptions,
    state: PlayerState,
    generation: Generation,
    active: Option<Playlist>,
    /// Playlists waiting their turn under [`SupersedePolicy::Enqueue`].
    backlog: VecDeque<Playlist>,
    signals: mpsc::UnboundedSender<PlaybackSignal>,
    device_events: DeviceEventSender,
}

impl<D: PlaybackDevice> PlaylistPlayer<D> {
    /// `device_events` is handed to the device with every load; whoever owns
    /// the matching receiver must route its events into
    /// [`on_device_event`](Self::on_device_event).
    pub fn new(
        device: D,
        options: PlaybackOptions,
        signals: mpsc::UnboundedSender<PlaybackSignal>,
        device_events: DeviceEventSender,
    ) -> Self {
        Self {
            device,
            options,
            state: PlayerState::Idle,
            generation: 0,
            active: None,
            backlog: VecDeque::new(),
            signals,
            device_events,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn active(&self) -> Option<&Playlist> {
        self.active.as_ref()
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// `true` while a playlist is driving the device or waiting in the backlog.
    pub fn is_busy(&self) -> bool {
        self.active.is_some() || !self.backlog.is_empty()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Start `playlist` now, superseding whatever is playing or queued.
    ///
    /// Returns the generation bound to the new playlist.
    pub fn play(&mut self, playlist: Playlist) -> Generation {
        if let Some(old) = self.active.take() {
            info!(
                generation = self.generation,
                cursor = old.cursor(),
                remaining = old.len() - old.cursor(),
                "Superseding active playlist"
            );
            self.device.halt();
        }
        if !self.backlog.is_empty() {
            debug!(dropped = self.backlog.len(), "Dropping queued playlists");
            self.backlog.clear();
        }
        self.start(playlist)
    }

    /// Start `playlist` if nothing is playing, otherwise queue it behind
    /// the active one.
    pub fn enqueue(&mut self, playlist: Playlist) {
        if self.active.is_none() {
            self.start(playlist);
        } else {
            debug!(
                queued = self.backlog.len() + 1,
                clips = playlist.len(),
                "Playlist queued behind active playlist"
            );
            self.backlog.push_back(playlist);
        }
    }

    /// Dispatch according to `policy`.
    pub fn submit(&mut self, playlist: Playlist, policy: SupersedePolicy) {
        match policy {
            SupersedePolicy::Preempt => {
                self.play(playlist);
            }
            SupersedePolicy::Enqueue => self.enqueue(playlist),
        }
    }

    /// Detach from the device and forget everything queued.
    pub fn stop(&mut self) {
        self.generation += 1;
        if self.active.take().is_some() {
            self.device.halt();
        }
        self.backlog.clear();
        self.state = PlayerState::Idle;
    }

    /// Feed a device callback into the state machine.
    pub fn on_device_event(&mut self, event: DeviceEvent) {
        let DeviceEvent { ticket, kind } = event;

        if ticket.generation != self.generation {
            debug!(
                stale = ticket.generation,
                current = self.generation,
                index = ticket.index,
                "Ignoring event from superseded playlist"
            );
            return;
        }
        let Some(playlist) = self.active.as_mut() else {
            debug!(?ticket, "Ignoring device event while idle");
            return;
        };
        if ticket.index != playlist.cursor() {
            debug!(
                index = ticket.index,
                cursor = playlist.cursor(),
                "Ignoring event for a clip no longer current"
            );
            return;
        }

        match (self.state, kind) {
            (PlayerState::Loading(i), DeviceEventKind::Started) => {
                playlist.mark_current(ClipStatus::Available);
                self.state = PlayerState::Playing(i);
                if let Some(clip) = playlist.current() {
                    debug!(index = i, token = %clip.token, "Clip playing");
                    let token = clip.token.clone();
                    self.emit(PlaybackSignal::Playing { token, index: i });
                }
            }
            (PlayerState::Loading(i), DeviceEventKind::Failed(error)) => {
                playlist.mark_current(ClipStatus::Missing);
                if let Some(clip) = playlist.current() {
                    log_clip_failure(i, &clip.locator, &error);
                    let token = clip.token.clone();
                    self.emit(PlaybackSignal::ClipMissing {
                        token,
                        index: i,
                        reason: error.to_string(),
                    });
                }
                self.advance();
            }
            (PlayerState::Playing(i), DeviceEventKind::Failed(error)) => {
                warn!(index = i, error = %error, "Clip failed mid-playback, skipping");
                self.advance();
            }
            (PlayerState::Playing(_), DeviceEventKind::Ended) => self.advance(),
            (PlayerState::Loading(i), DeviceEventKind::Ended) => {
                debug!(index = i, "Clip ended before it was reported started");
                self.advance();
            }
            (state, kind) => {
                debug!(?state, ?kind, "Ignoring unexpected device event");
            }
        }
    }

    fn start(&mut self, mut playlist: Playlist) -> Generation {
        self.generation += 1;
        playlist.reset();
        debug!(
            generation = self.generation,
            clips = playlist.len(),
            "Starting playlist"
        );
        self.active = Some(playlist);
        self.emit(PlaybackSignal::Loading);
        let generation = self.generation;
        self.load_current();
        generation
    }

    fn advance(&mut self) {
        if let Some(playlist) = self.active.as_mut() {
            playlist.advance();
        }
        self.load_current();
    }

    /// Issue a load for the clip under the cursor, or finish the playlist.
    fn load_current(&mut self) {
        let Some(playlist) = self.active.as_ref() else {
            self.state = PlayerState::Idle;
            return;
        };
        let Some(clip) = playlist.current() else {
            self.finish();
            return;
        };

        let index = playlist.cursor();
        let request = LoadRequest {
            ticket: Ticket {
                generation: self.generation,
                index,
            },
            locator: clip.locator.clone(),
            options: self.options,
            events: self.device_events.clone(),
        };
        self.state = PlayerState::Loading(index);
        self.device.load(request);
    }

    fn finish(&mut self) {
        let any_played = self.active.take().is_some_and(|p| p.any_played());
        self.state = PlayerState::Idle;

        if any_played {
            debug!(generation = self.generation, "Playlist finished");
            self.emit(PlaybackSignal::Idle);
        } else {
            info!(generation = self.generation, "No clip in playlist could be played");
            self.device.hide();
            self.emit(PlaybackSignal::Empty);
        }

        if let Some(next) = self.backlog.pop_front() {
            self.start(next);
        }
    }

    fn emit(&self, signal: PlaybackSignal) {
        // A closed receiver only means nobody is watching.
        let _ = self.signals.send(signal);
    }
}

fn log_clip_failure(index: usize, locator: &str, error: &ClipError) {
    match error {
        ClipError::ResourceMissing { .. } => {
            warn!(index, locator, "Sign clip not found, skipping")
        }
        other => warn!(index, locator, error = %other, "Sign clip failed to start, skipping"),
    }
}
