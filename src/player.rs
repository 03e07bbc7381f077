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
use std::{error::Error, sync::Arc};

use parking_lot::{Mutex, MutexGuard};
use tracing::{info, span, Level, Span};

use crate::{
    actuator::Actuator,
    haptics::{HapticData, Tier},
    sync::{Progress, SyncEngine},
};

/// Intensity fired by the manual test pulse.
const TEST_PULSE_INTENSITY: f64 = 0.8;

/// A single status report from the audio transport.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlaybackStatus {
    /// Whether a track is loaded at all.
    pub is_loaded: bool,
    /// Whether the transport is currently playing.
    pub is_playing: bool,
    /// The playback position in seconds.
    pub position: f64,
    /// Set on the one report where the track reached its natural end.
    pub did_just_finish: bool,
}

/// Plays back haptics for a track by feeding transport status reports to the sync engine and
/// firing due pulses on the actuator.
pub struct HapticPlayer {
    /// The sync engine for the loaded track.
    engine: SyncEngine,
    /// The actuator to fire pulses on.
    actuator: Arc<dyn Actuator>,
    /// The logging span.
    span: Span,
}

impl HapticPlayer {
    /// Creates a new player for the given haptic track.
    pub fn new(actuator: Arc<dyn Actuator>, data: HapticData) -> HapticPlayer {
        let mut player = HapticPlayer {
            engine: SyncEngine::default(),
            actuator,
            span: span!(Level::INFO, "haptic player"),
        };
        player.load(data);
        player
    }

    /// Replaces the haptic track. The cursor starts over.
    pub fn load(&mut self, data: HapticData) {
        let _enter = self.span.enter();

        let duration = data.metadata.as_ref().and_then(|m| m.duration);
        self.engine.load(data.events);
        self.engine.set_duration(duration);
        info!(
            events = self.engine.len(),
            duration = ?duration,
            "Loaded haptic track."
        );
    }

    /// Drops the haptic track.
    pub fn unload(&mut self) {
        self.load(HapticData::default());
    }

    /// Overrides the track length used to bound seeks.
    pub fn set_duration(&mut self, duration: f64) {
        self.engine.set_duration(Some(duration));
    }

    /// Handles a status report. Pulses only fire while the transport plays; the report that
    /// marks the natural end of the track still catches up to the final position before the
    /// cursor rewinds for the next pass. Returns the number of pulses dispatched.
    pub fn on_status(&mut self, status: &PlaybackStatus) -> usize {
        if !status.is_loaded {
            return 0;
        }

        let mut dispatched = 0;
        if status.is_playing || status.did_just_finish {
            dispatched = self
                .engine
                .advance_and_trigger(status.position, self.actuator.as_ref());
        }

        if status.did_just_finish {
            let _enter = self.span.enter();
            info!(progress = %self.engine.progress(), "Track finished, rewinding haptics.");
            self.engine.reset();
        }

        dispatched
    }

    /// Repositions the haptics for playback resuming at the given time.
    pub fn seek(&mut self, target_time: f64) {
        self.engine.seek(target_time);
    }

    /// Stops playback, rewinding to the start.
    pub fn stop(&mut self) {
        self.engine.reset();
    }

    /// Fires a heavy pulse outside of playback so the actuator can be checked.
    pub fn test_pulse(&self) -> Result<Tier, Box<dyn Error>> {
        let tier = Tier::from_intensity(TEST_PULSE_INTENSITY);
        self.actuator.trigger(tier)?;
        Ok(tier)
    }

    /// Returns the dispatch progress.
    pub fn progress(&self) -> Progress {
        self.engine.progress()
    }

    /// Returns the underlying engine.
    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }
}

/// A player that may be driven from more than one context, such as a periodic status update
/// and a user seeking. All access goes through one lock so status reports and seeks never
/// interleave.
#[derive(Clone)]
pub struct SharedPlayer {
    inner: Arc<Mutex<HapticPlayer>>,
}

impl SharedPlayer {
    pub fn new(player: HapticPlayer) -> SharedPlayer {
        SharedPlayer {
            inner: Arc::new(Mutex::new(player)),
        }
    }

    /// Locks the player for exclusive use.
    pub fn lock(&self) -> MutexGuard<'_, HapticPlayer> {
        self.inner.lock()
    }

    pub fn on_status(&self, status: &PlaybackStatus) -> usize {
        self.lock().on_status(status)
    }

    pub fn seek(&self, target_time: f64) {
        self.lock().seek(target_time)
    }

    pub fn stop(&self) {
        self.lock().stop()
    }

    pub fn progress(&self) -> Progress {
        self.lock().progress()
    }
}
