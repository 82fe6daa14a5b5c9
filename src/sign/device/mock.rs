//! Scripted playback device for testing.
//!
//! Answers every load synchronously on the request's event channel
//! according to a per-locator script, and records what it was asked to do
//! in a shared [`DeviceLog`] so tests can inspect it after the device has
//! been moved into a player.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{ClipError, DeviceEvent, LoadRequest, PlaybackDevice, Ticket};

// ── Configuration ────────────────────────────────────────────────

/// How the scripted device answers a load for a given locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipOutcome {
    Plays,
    Missing,
    Undecodable,
}

/// Everything the device was asked to do.
#[derive(Debug, Default, Clone)]
pub struct DeviceLog {
    pub loads: Vec<(Ticket, String)>,
    /// Locators that actually started playing, in order.
    pub frames_shown: Vec<String>,
    pub halts: usize,
    pub hidden: bool,
}

/// Cloneable view on a [`ScriptedDevice`]'s log.
#[derive(Debug, Clone, Default)]
pub struct DeviceLogHandle(Arc<Mutex<DeviceLog>>);

impl DeviceLogHandle {
    pub fn lock(&self) -> MutexGuard<'_, DeviceLog> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn frames_shown(&self) -> Vec<String> {
        self.lock().frames_shown.clone()
    }

    pub fn loads(&self) -> Vec<(Ticket, String)> {
        self.lock().loads.clone()
    }
}

// ── Device ───────────────────────────────────────────────────────

pub struct ScriptedDevice {
    outcomes: HashMap<String, ClipOutcome>,
    default_outcome: ClipOutcome,
    /// Send `Ended` right after `Started`.
    auto_end: bool,
    /// Reject unmuted playback, like a browser autoplay policy.
    reject_audible: bool,
    log: DeviceLogHandle,
}

impl ScriptedDevice {
    /// Every clip plays; the test decides when clips end.
    pub fn new() -> Self {
        Self {
            outcomes: HashMap::new(),
            default_outcome: ClipOutcome::Plays,
            auto_end: false,
            reject_audible: true,
            log: DeviceLogHandle::default(),
        }
    }

    /// Every clip plays and ends immediately.
    pub fn instant() -> Self {
        Self::new().with_auto_end()
    }

    pub fn with_auto_end(mut self) -> Self {
        self.auto_end = true;
        self
    }

    pub fn with_outcome(mut self, locator: &str, outcome: ClipOutcome) -> Self {
        self.outcomes.insert(locator.to_string(), outcome);
        self
    }

    pub fn with_default_outcome(mut self, outcome: ClipOutcome) -> Self {
        self.default_outcome = outcome;
        self
    }

    /// Allow unmuted playback.
    pub fn allowing_audible(mut self) -> Self {
        self.reject_audible = false;
        self
    }

    pub fn log(&self) -> DeviceLogHandle {
        self.log.clone()
    }
}

impl Default for ScriptedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackDevice for ScriptedDevice {
    fn load(&mut self, request: LoadRequest) {
        let LoadRequest {
            ticket,
            locator,
            options,
            events,
        } = request;
        self.log.lock().loads.push((ticket, locator.clone()));

        let outcome = self
            .outcomes
            .get(&locator)
            .copied()
            .unwrap_or(self.default_outcome);

        let reply = match outcome {
            ClipOutcome::Missing => vec![DeviceEvent::failed(
                ticket,
                ClipError::ResourceMissing { locator },
            )],
            ClipOutcome::Undecodable => vec![DeviceEvent::failed(
                ticket,
                ClipError::Decode {
                    locator,
                    message: "unsupported codec".to_string(),
                },
            )],
            ClipOutcome::Plays if !options.muted && self.reject_audible => {
                vec![DeviceEvent::failed(
                    ticket,
                    ClipError::PlaybackStartRejected {
                        reason: "audible autoplay blocked".to_string(),
                    },
                )]
            }
            ClipOutcome::Plays => {
                self.log.lock().frames_shown.push(locator);
                let mut reply = vec![DeviceEvent::started(ticket)];
                if self.auto_end {
                    reply.push(DeviceEvent::ended(ticket));
                }
                reply
            }
        };

        for event in reply {
            if events.send(event).is_err() {
                return; // player gone
            }
        }
    }

    fn halt(&mut self) {
        self.log.lock().halts += 1;
    }

    fn hide(&mut self) {
        self.log.lock().hidden = true;
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
