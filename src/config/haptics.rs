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
use std::{fs, path::Path};

use serde::Deserialize;

use super::error::HapticDataError;
use crate::haptics::{EventList, HapticData, HapticEvent, HapticMetadata};

/// A haptic track on disk. Either the analyzer's full response or just its event list.
#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Response(AnalysisResponse),
    Events(Vec<HapticEvent>),
}

/// The analyzer's response to an uploaded track.
#[derive(Deserialize)]
struct AnalysisResponse {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    haptic_data: Vec<HapticEvent>,
    metadata: Option<HapticMetadata>,
    message: Option<String>,
}

fn default_success() -> bool {
    true
}

/// Parses a haptic track from a JSON file.
pub fn parse_haptics(path: &Path) -> Result<HapticData, HapticDataError> {
    parse_haptics_str(&fs::read_to_string(path)?)
}

/// Parses a haptic track from JSON.
pub fn parse_haptics_str(json: &str) -> Result<HapticData, HapticDataError> {
    match serde_json::from_str::<Document>(json)? {
        Document::Events(events) => Ok(HapticData::new(EventList::new(events), None)),
        Document::Response(response) => {
            if !response.success {
                return Err(HapticDataError::Rejected(
                    response
                        .message
                        .unwrap_or_else(|| "no message".to_string()),
                ));
            }
            Ok(HapticData::new(
                EventList::new(response.haptic_data),
                response.metadata,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_parse_response() {
        let json = r#"{
            "success": true,
            "haptic_data": [
                {"time": 0.52, "intensity": 0.91, "duration": 0.141},
                {"time": 1.04, "intensity": 0.43, "duration": 0.093}
            ],
            "metadata": {
                "duration": 183.2,
                "tempo_bpm": 117.45,
                "sample_rate": 44100,
                "total_events": 2,
                "beat_events": 2,
                "onset_events": 0
            },
            "message": "'song.mp3' was analyzed."
        }"#;

        let data = parse_haptics_str(json).unwrap();
        assert_eq!(2, data.events.len());
        assert_eq!(Some(0.141), data.events[0].duration);
        let metadata = data.metadata.unwrap();
        assert_eq!(Some(183.2), metadata.duration);
        assert_eq!(Some(44100), metadata.sample_rate);
    }

    #[test]
    fn test_parse_bare_events() {
        let json = r#"[{"time": 2.0, "intensity": 0.5}, {"time": 1.0, "intensity": 1.5}]"#;

        let data = parse_haptics_str(json).unwrap();
        assert!(data.metadata.is_none());
        let times: Vec<f64> = data.events.iter().map(|e| e.time).collect();
        assert_eq!(vec![1.0, 2.0], times);
        assert_eq!(1.0, data.events[0].intensity);
    }

    #[test]
    fn test_parse_rejected_response() {
        let json = r#"{"success": false, "message": "unsupported format"}"#;
        match parse_haptics_str(json) {
            Err(HapticDataError::Rejected(message)) => assert_eq!("unsupported format", message),
            _ => panic!("expected a rejected response"),
        }
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_haptics_str(r#"{"haptic_data": [{"time": "soon"}]}"#),
            Err(HapticDataError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.json");
        fs::write(&path, r#"[{"time": 0.5, "intensity": 0.8}]"#).unwrap();

        assert_eq!(1, parse_haptics(&path).unwrap().events.len());
        assert!(matches!(
            parse_haptics(&dir.path().join("missing.json")),
            Err(HapticDataError::Io(_))
        ));
    }
}
