// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{fmt, sync::Arc, time::Duration};

use parking_lot::Mutex;
use rand::Rng;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, span, Instrument, Level};

use crate::{
    player::{PlaybackStatus, SharedPlayer},
    playsync::CancelHandle,
    util::format_seconds,
};

/// The transport state of the simulated audio player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Playing,
    Paused,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportState::Stopped => "stopped",
            TransportState::Playing => "playing",
            TransportState::Paused => "paused",
        })
    }
}

/// A simulated audio transport. Stands in for a real audio player by keeping a position that
/// advances with wall clock time while playing, and reporting it the way a platform status
/// callback would, optionally with sampling jitter.
pub struct Transport {
    /// The track length in seconds.
    duration: f64,
    /// The true playback position in seconds.
    position: f64,
    state: TransportState,
    /// The maximum error added to reported positions, in seconds.
    jitter: f64,
    /// Set when the track reached its end and the next report hasn't gone out yet.
    finished: bool,
    /// When playback last started, until the playback loop has accounted for it.
    resumed_at: Option<Instant>,
}

impl Transport {
    /// Creates a stopped transport for a track of the given length.
    pub fn new(duration: f64, jitter: Duration) -> Transport {
        Transport {
            duration: if duration.is_finite() {
                duration.max(0.0)
            } else {
                0.0
            },
            position: 0.0,
            state: TransportState::Stopped,
            jitter: jitter.as_secs_f64(),
            finished: false,
            resumed_at: None,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Starts or resumes playback. A track sitting at its end starts over.
    pub fn play(&mut self) {
        if self.position >= self.duration {
            self.position = 0.0;
        }
        if self.state != TransportState::Playing {
            self.resumed_at = Some(Instant::now());
        }
        self.state = TransportState::Playing;
    }

    /// Pauses playback, keeping the position.
    pub fn pause(&mut self) {
        if self.state == TransportState::Playing {
            self.state = TransportState::Paused;
        }
    }

    /// Stops playback and rewinds to the start.
    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
        self.position = 0.0;
        self.finished = false;
    }

    /// Moves the position, clamped to the track. Returns the position actually used.
    pub fn seek(&mut self, target: f64) -> f64 {
        self.position = if target.is_nan() {
            0.0
        } else {
            target.clamp(0.0, self.duration)
        };
        self.finished = false;
        self.position
    }

    /// Returns when playback last started, if that happened since the previous call.
    pub fn take_resumed_at(&mut self) -> Option<Instant> {
        self.resumed_at.take()
    }

    /// Moves playback forward by the elapsed time and returns the resulting status report.
    pub fn tick(&mut self, elapsed: Duration) -> PlaybackStatus {
        if self.state == TransportState::Playing {
            self.position += elapsed.as_secs_f64();
            if self.position >= self.duration {
                self.position = self.duration;
                self.state = TransportState::Stopped;
                self.finished = true;
            }
        }
        self.status()
    }

    /// Builds a status report for the current position. The end of track flag is only ever
    /// reported once.
    pub fn status(&mut self) -> PlaybackStatus {
        let did_just_finish = std::mem::take(&mut self.finished);
        PlaybackStatus {
            is_loaded: true,
            is_playing: self.state == TransportState::Playing,
            position: self.sampled_position(did_just_finish),
            did_just_finish,
        }
    }

    fn sampled_position(&self, exact: bool) -> f64 {
        if exact || self.jitter <= 0.0 {
            return self.position;
        }
        let error = rand::thread_rng().gen_range(-self.jitter..=self.jitter);
        (self.position + error).max(0.0)
    }
}

/// A transport shared between the playback loop and the controller.
pub type SharedTransport = Arc<Mutex<Transport>>;

/// Runs a simulated transport against a haptic player, ticking at a fixed cadence.
pub struct Simulation {
    transport: SharedTransport,
    player: SharedPlayer,
    cadence: Duration,
    cancel_handle: CancelHandle,
}

impl Simulation {
    /// Creates a new simulation.
    pub fn new(transport: Transport, player: SharedPlayer, cadence: Duration) -> Simulation {
        Simulation {
            transport: Arc::new(Mutex::new(transport)),
            player,
            cadence: cadence.max(Duration::from_millis(1)),
            cancel_handle: CancelHandle::new(),
        }
    }

    pub fn transport(&self) -> SharedTransport {
        self.transport.clone()
    }

    pub fn player(&self) -> SharedPlayer {
        self.player.clone()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel_handle.clone()
    }

    /// Feeds status reports to the player until cancelled. If stop_at_end is set, also returns
    /// once the track plays through to its end.
    pub async fn run(&self, stop_at_end: bool) {
        self.tick_loop(stop_at_end)
            .instrument(span!(Level::INFO, "simulation"))
            .await
    }

    async fn tick_loop(&self, stop_at_end: bool) {
        info!(
            duration = format_seconds(self.transport.lock().duration()),
            cadence = ?self.cadence,
            "Simulation started."
        );

        let mut interval = tokio::time::interval(self.cadence);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_tick = Instant::now();

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = self.cancel_handle.cancelled() => {
                    info!("Simulation cancelled.");
                    return;
                }
            }

            // Hold the transport while the player handles the report so a concurrent seek
            // can't land between the two.
            let (status, dispatched) = {
                let mut transport = self.transport.lock();
                let now = Instant::now();
                // Time before playback started doesn't move the position.
                let since = transport
                    .take_resumed_at()
                    .map_or(last_tick, |resumed_at| resumed_at.max(last_tick));
                last_tick = now;
                let status = transport.tick(now.duration_since(since));
                (status, self.player.on_status(&status))
            };
            if dispatched > 0 {
                debug!(
                    position = status.position,
                    dispatched,
                    progress = %self.player.progress(),
                    "Dispatched haptic events."
                );
            }

            if status.did_just_finish {
                info!(progress = %self.player.progress(), "Track finished.");
                if stop_at_end {
                    return;
                }
            }
        }
    }
}
