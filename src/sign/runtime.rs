//! Player runtime: owns a [`PlaylistPlayer`] on a single task.
//!
//! Commands from any number of [`PlayerHandle`]s and device events are
//! funnelled through one `select!` loop, so every state transition is
//! serialized without locks.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::config::SupersedePolicy;

use super::device::{DeviceEvent, PlaybackDevice, PlaybackOptions};
use super::player::PlaylistPlayer;
use super::playlist::Playlist;
use super::signal::PlaybackSignal;

enum Command {
    Submit(Playlist, SupersedePolicy),
    Stop,
    /// Reply once nothing is playing or queued.
    WhenIdle(oneshot::Sender<()>),
}

/// Cloneable control surface for a running player.
#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl PlayerHandle {
    /// Hand a playlist to the player.  Returns `false` if the runtime is gone.
    pub fn submit(&self, playlist: Playlist, policy: SupersedePolicy) -> bool {
        self.commands
            .send(Command::Submit(playlist, policy))
            .is_ok()
    }

    pub fn stop(&self) -> bool {
        self.commands.send(Command::Stop).is_ok()
    }

    /// Wait until the active playlist and the backlog have drained.
    pub async fn wait_idle(&self) {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(Command::WhenIdle(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

pub struct PlayerRuntime;

impl PlayerRuntime {
    /// Spawn the player loop.  The loop exits once every handle is dropped.
    pub fn spawn<D>(
        device: D,
        options: PlaybackOptions,
    ) -> (PlayerHandle, mpsc::UnboundedReceiver<PlaybackSignal>)
    where
        D: PlaybackDevice + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        info!(device = device.name(), muted = options.muted, "Starting sign player");
        let player = PlaylistPlayer::new(device, options, signal_tx, event_tx);
        tokio::spawn(run(player, command_rx, event_rx));

        (
            PlayerHandle {
                commands: command_tx,
            },
            signal_rx,
        )
    }
}

async fn run<D: PlaybackDevice>(
    mut player: PlaylistPlayer<D>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut events: mpsc::UnboundedReceiver<DeviceEvent>,
) {
    let mut waiters: Vec<oneshot::Sender<()>> = Vec::new();

    loop {
        tokio::select! {
            biased;

            command = commands.recv() => {
                let Some(command) = command else { break };
                match command {
                    Command::Submit(playlist, policy) => player.submit(playlist, policy),
                    Command::Stop => player.stop(),
                    Command::WhenIdle(tx) => waiters.push(tx),
                }
            }
            Some(event) = events.recv() => player.on_device_event(event),
        }

        if !player.is_busy() {
            for waiter in waiters.drain(..) {
                let _ = waiter.send(());
            }
        }
    }

    player.stop();
    debug!("Sign player stopped");
}
