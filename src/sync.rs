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
use std::fmt;

use tracing::{debug, error, warn};

use crate::actuator::Actuator;
use crate::haptics::{EventList, HapticEvent, Tier};

/// Forward lookahead, in seconds, allowed between a sampled position and a pulse for the
/// pulse to be due. Covers the granularity of the transport's status updates.
pub const TOLERANCE: f64 = 0.05;

/// A pulse that became due during an advance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dispatch {
    /// The index of the event in the event list.
    pub index: usize,
    /// The event itself.
    pub event: HapticEvent,
    /// The tier to actuate with.
    pub tier: Tier,
}

/// How far through the event list playback has progressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub dispatched: usize,
    pub total: usize,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.dispatched, self.total)
    }
}

/// Maps playback positions to pulses. The engine keeps a cursor into the sorted event list;
/// everything before the cursor has been dispatched for the current pass, everything at or
/// after it has not.
///
/// The engine is driven entirely by its caller and is not safe for concurrent mutation;
/// callers that advance and seek from different contexts must serialize access.
#[derive(Debug, Default)]
pub struct SyncEngine {
    /// The events for the loaded track.
    events: EventList,
    /// Index of the next event to dispatch.
    next_index: usize,
    /// The track length, used to bound seeks.
    duration: Option<f64>,
}

impl SyncEngine {
    /// Creates a new engine positioned at the start of the given events.
    pub fn new(events: EventList) -> SyncEngine {
        SyncEngine {
            events,
            next_index: 0,
            duration: None,
        }
    }

    /// Sets the track length that seeks are clamped to.
    pub fn set_duration(&mut self, duration: Option<f64>) {
        self.duration = duration.filter(|d| d.is_finite()).map(|d| d.max(0.0));
    }

    /// Returns the track length, if known.
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Replaces the event list and rewinds the cursor.
    pub fn load(&mut self, events: EventList) {
        self.events = events;
        self.next_index = 0;
    }

    /// Returns the loaded events.
    pub fn events(&self) -> &EventList {
        &self.events
    }

    /// Dispatches every pending event that is due at the given position. The sweep only ever
    /// moves forward, so repeated or slightly regressed positions dispatch nothing new.
    pub fn advance(&mut self, current_time: f64) -> Vec<Dispatch> {
        let mut dispatched = Vec::new();
        if current_time.is_nan() {
            warn!("Ignoring NaN playback position.");
            return dispatched;
        }

        while let Some(event) = self.events.get(self.next_index) {
            if event.time > current_time + TOLERANCE {
                break;
            }

            dispatched.push(Dispatch {
                index: self.next_index,
                event: *event,
                tier: event.tier(),
            });
            self.next_index += 1;
        }

        dispatched
    }

    /// Advances to the given position and triggers every due pulse on the actuator, in order.
    /// A failing trigger is logged and skipped; it never stops the sweep or moves the cursor
    /// back. Returns the number of events dispatched.
    pub fn advance_and_trigger(&mut self, current_time: f64, actuator: &dyn Actuator) -> usize {
        let dispatched = self.advance(current_time);
        for dispatch in dispatched.iter() {
            debug!(
                index = dispatch.index,
                time = dispatch.event.time,
                tier = %dispatch.tier,
                "Triggering haptic event."
            );
            if let Err(e) = actuator.trigger(dispatch.tier) {
                error!(
                    err = e.as_ref(),
                    index = dispatch.index,
                    actuator = actuator.name(),
                    "Error triggering haptic event"
                );
            }
        }
        dispatched.len()
    }

    /// Repositions the cursor for playback resuming at the target time. Events at or before the
    /// target count as passed; everything after it is armed again, whichever way the seek went.
    pub fn seek(&mut self, target_time: f64) {
        let target_time = self.clamp_target(target_time);
        self.next_index = self
            .events
            .partition_point(|event| event.time <= target_time);
        debug!(
            target_time,
            next_index = self.next_index,
            "Repositioned haptic cursor."
        );
    }

    /// Rewinds to the start of the track. Unlike a seek to zero, every event is armed again,
    /// including any at exactly 0.0.
    pub fn reset(&mut self) {
        self.next_index = 0;
        debug!("Rewound haptic cursor.");
    }

    /// Returns the index of the next event to dispatch.
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// Returns the number of loaded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if no events are loaded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns true if every event has been dispatched (including empty lists).
    pub fn is_finished(&self) -> bool {
        self.next_index >= self.events.len()
    }

    /// Returns the dispatch progress for display.
    pub fn progress(&self) -> Progress {
        Progress {
            dispatched: self.next_index,
            total: self.events.len(),
        }
    }

    fn clamp_target(&self, target_time: f64) -> f64 {
        if target_time.is_nan() || target_time < 0.0 {
            warn!(target_time, "Seek target before start of track, clamping.");
            return 0.0;
        }

        match self.duration {
            Some(duration) if target_time > duration => {
                warn!(
                    target_time,
                    duration, "Seek target past end of track, clamping."
                );
                duration
            }
            _ => target_time,
        }
    }
}
