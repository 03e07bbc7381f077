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
use std::{error::Error, fmt, ops::Deref, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Intensity at or above which a pulse is heavy.
const HEAVY_THRESHOLD: f64 = 0.8;
/// Intensity at or above which a pulse is medium.
const MEDIUM_THRESHOLD: f64 = 0.5;

/// Default intensity of generated test patterns.
pub const DEFAULT_PATTERN_INTENSITY: f64 = 0.7;
/// Pulse length attached to generated test patterns.
const PATTERN_PULSE_DURATION: f64 = 0.1;

/// A single scheduled pulse, relative to the start of the track.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HapticEvent {
    /// The track position of the pulse in seconds.
    pub time: f64,
    /// The pulse intensity in [0, 1].
    pub intensity: f64,
    /// The pulse length in seconds as reported by the analyzer. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl HapticEvent {
    /// Creates a new event with no duration.
    pub fn new(time: f64, intensity: f64) -> HapticEvent {
        HapticEvent {
            time,
            intensity,
            duration: None,
        }
    }

    /// The tier this event is actuated with.
    pub fn tier(&self) -> Tier {
        Tier::from_intensity(self.intensity)
    }
}

/// The coarse intensity bucket a pulse is actuated with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    Light,
    Medium,
    Heavy,
}

impl Tier {
    /// Classifies an intensity. Each tier includes its lower bound.
    pub fn from_intensity(intensity: f64) -> Tier {
        if intensity >= HEAVY_THRESHOLD {
            Tier::Heavy
        } else if intensity >= MEDIUM_THRESHOLD {
            Tier::Medium
        } else {
            Tier::Light
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Light => "light",
            Tier::Medium => "medium",
            Tier::Heavy => "heavy",
        })
    }
}

impl FromStr for Tier {
    type Err = Box<dyn Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Tier::Light),
            "medium" => Ok(Tier::Medium),
            "heavy" => Ok(Tier::Heavy),
            _ => Err(format!("unknown tier '{}'", s).into()),
        }
    }
}

/// The immutable, time ordered pulse list for a single track. Cloning is cheap and the
/// list is never mutated in place; loading a new track replaces it wholesale.
#[derive(Clone, Debug)]
pub struct EventList {
    events: Arc<[HapticEvent]>,
}

impl EventList {
    /// Builds an event list, normalizing anything the analyzer got wrong: intensities are
    /// clamped to [0, 1], negative times are clamped to zero, non-finite times are dropped
    /// and an out of order list is stably sorted.
    pub fn new(events: Vec<HapticEvent>) -> EventList {
        let received = events.len();
        let mut events: Vec<HapticEvent> = events
            .into_iter()
            .filter(|event| event.time.is_finite())
            .map(|mut event| {
                event.time = event.time.max(0.0);
                event.intensity = if event.intensity.is_nan() {
                    0.0
                } else {
                    event.intensity.clamp(0.0, 1.0)
                };
                event
            })
            .collect();

        if events.len() != received {
            warn!(
                dropped = received - events.len(),
                "Dropped haptic events with non-finite times."
            );
        }

        if !events.windows(2).all(|pair| pair[0].time <= pair[1].time) {
            warn!(events = events.len(), "Haptic events were out of order, sorting.");
            events.sort_by(|a, b| a.time.total_cmp(&b.time));
        }

        EventList {
            events: events.into(),
        }
    }

    /// Returns the time of the last event, if any.
    pub fn last_time(&self) -> Option<f64> {
        self.events.last().map(|event| event.time)
    }

    /// Counts the events per tier as (light, medium, heavy).
    pub fn tier_counts(&self) -> (usize, usize, usize) {
        self.events
            .iter()
            .fold((0, 0, 0), |(light, medium, heavy), event| match event.tier() {
                Tier::Light => (light + 1, medium, heavy),
                Tier::Medium => (light, medium + 1, heavy),
                Tier::Heavy => (light, medium, heavy + 1),
            })
    }
}

impl Default for EventList {
    fn default() -> Self {
        EventList {
            events: Arc::from(Vec::new()),
        }
    }
}

impl Deref for EventList {
    type Target = [HapticEvent];

    fn deref(&self) -> &Self::Target {
        &self.events
    }
}

impl From<Vec<HapticEvent>> for EventList {
    fn from(events: Vec<HapticEvent>) -> Self {
        EventList::new(events)
    }
}

/// Metadata reported by the analyzer alongside the events.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HapticMetadata {
    /// The track length in seconds.
    pub duration: Option<f64>,
    pub tempo_bpm: Option<f64>,
    pub sample_rate: Option<u32>,
    pub total_events: Option<usize>,
    pub beat_events: Option<usize>,
    pub onset_events: Option<usize>,
}

/// The haptic track for a single audio track.
#[derive(Clone, Debug, Default)]
pub struct HapticData {
    /// The pulses to play.
    pub events: EventList,
    /// Analyzer metadata, if any was supplied.
    pub metadata: Option<HapticMetadata>,
}

impl HapticData {
    /// Creates new haptic data.
    pub fn new(events: EventList, metadata: Option<HapticMetadata>) -> HapticData {
        HapticData { events, metadata }
    }

    /// The track length. Uses the analyzer's duration when present, otherwise the end of the
    /// last pulse.
    pub fn track_duration(&self) -> f64 {
        if let Some(duration) = self.metadata.as_ref().and_then(|m| m.duration) {
            return duration.max(0.0);
        }

        self.events
            .last()
            .map(|event| event.time + event.duration.unwrap_or(0.0))
            .unwrap_or(0.0)
    }
}

/// Generates a fixed interval test pattern covering [0, duration).
pub fn generate_simple(
    duration: f64,
    interval: f64,
    intensity: f64,
) -> Result<Vec<HapticEvent>, crate::config::HapticDataError> {
    if !interval.is_finite() || interval <= 0.0 {
        return Err(crate::config::HapticDataError::InvalidInterval(interval));
    }
    if !duration.is_finite() {
        return Err(crate::config::HapticDataError::InvalidDuration(duration));
    }

    let mut events = Vec::new();
    let mut step: u64 = 0;
    loop {
        // Multiply instead of accumulating so long patterns don't drift.
        let time = step as f64 * interval;
        if time >= duration {
            break;
        }
        events.push(HapticEvent {
            time,
            intensity,
            duration: Some(PATTERN_PULSE_DURATION),
        });
        step += 1;
    }

    Ok(events)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(Tier::Medium, Tier::from_intensity(0.79));
        assert_eq!(Tier::Heavy, Tier::from_intensity(0.8));
        assert_eq!(Tier::Light, Tier::from_intensity(0.49));
        assert_eq!(Tier::Medium, Tier::from_intensity(0.5));
        assert_eq!(Tier::Light, Tier::from_intensity(0.0));
        assert_eq!(Tier::Heavy, Tier::from_intensity(1.0));
        assert_eq!(Tier::Light, Tier::from_intensity(f64::NAN));
    }

    #[test]
    fn test_tier_names() -> Result<(), Box<dyn Error>> {
        for tier in [Tier::Light, Tier::Medium, Tier::Heavy] {
            assert_eq!(tier, tier.to_string().parse::<Tier>()?);
        }
        assert_eq!(Tier::Heavy, "HEAVY".parse::<Tier>()?);
        assert!("thud".parse::<Tier>().is_err());
        Ok(())
    }

    #[test]
    fn test_event_list_clamps_intensity() {
        let events = EventList::new(vec![
            HapticEvent::new(0.0, -0.5),
            HapticEvent::new(1.0, 1.7),
            HapticEvent::new(2.0, f64::NAN),
        ]);

        let intensities: Vec<f64> = events.iter().map(|e| e.intensity).collect();
        assert_eq!(vec![0.0, 1.0, 0.0], intensities);
    }

    #[test]
    fn test_event_list_normalizes_times() {
        let events = EventList::new(vec![
            HapticEvent::new(-1.0, 0.5),
            HapticEvent::new(f64::NAN, 0.5),
            HapticEvent::new(f64::INFINITY, 0.5),
            HapticEvent::new(2.0, 0.5),
        ]);

        let times: Vec<f64> = events.iter().map(|e| e.time).collect();
        assert_eq!(vec![0.0, 2.0], times);
    }

    #[test]
    fn test_event_list_sorts_out_of_order() {
        let events = EventList::new(vec![
            HapticEvent::new(3.0, 0.1),
            HapticEvent::new(1.0, 0.2),
            HapticEvent::new(1.0, 0.3),
            HapticEvent::new(2.0, 0.4),
        ]);

        let times: Vec<f64> = events.iter().map(|e| e.time).collect();
        assert_eq!(vec![1.0, 1.0, 2.0, 3.0], times);

        // The sort is stable, so events sharing a time keep their order.
        assert_eq!(0.2, events[0].intensity);
        assert_eq!(0.3, events[1].intensity);
    }

    #[test]
    fn test_tier_counts() {
        let events = EventList::new(vec![
            HapticEvent::new(0.0, 0.1),
            HapticEvent::new(1.0, 0.6),
            HapticEvent::new(2.0, 0.9),
            HapticEvent::new(3.0, 0.95),
        ]);
        assert_eq!((1, 1, 2), events.tier_counts());
        assert_eq!(Some(3.0), events.last_time());
    }

    #[test]
    fn test_track_duration() {
        let events = EventList::new(vec![HapticEvent {
            time: 4.0,
            intensity: 0.5,
            duration: Some(0.15),
        }]);

        let data = HapticData::new(events.clone(), None);
        assert!((data.track_duration() - 4.15).abs() < 1e-9);

        let data = HapticData::new(
            events,
            Some(HapticMetadata {
                duration: Some(180.0),
                ..Default::default()
            }),
        );
        assert_eq!(180.0, data.track_duration());

        assert_eq!(0.0, HapticData::default().track_duration());
    }

    #[test]
    fn test_generate_simple() -> Result<(), Box<dyn Error>> {
        let events = generate_simple(2.0, 0.5, DEFAULT_PATTERN_INTENSITY)?;
        let times: Vec<f64> = events.iter().map(|e| e.time).collect();
        assert_eq!(vec![0.0, 0.5, 1.0, 1.5], times);
        assert!(events
            .iter()
            .all(|e| e.intensity == DEFAULT_PATTERN_INTENSITY && e.duration == Some(0.1)));

        assert!(generate_simple(0.0, 0.5, 0.7)?.is_empty());
        assert!(generate_simple(2.0, 0.0, 0.7).is_err());
        assert!(generate_simple(2.0, -1.0, 0.7).is_err());
        assert!(generate_simple(f64::NAN, 0.5, 0.7).is_err());
        Ok(())
    }
}
