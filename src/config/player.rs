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
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, File};
use duration_string::DurationString;
use serde::Deserialize;

use super::error::ConfigError;

/// How often the transport reports its position unless configured otherwise.
pub const DEFAULT_CADENCE: Duration = Duration::from_millis(100);
const DEFAULT_JITTER: Duration = Duration::ZERO;

/// Which controller drives the transport.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Controller {
    #[default]
    Keyboard,
    None,
}

/// The configuration for the haptic player.
#[derive(Deserialize, Clone, Debug)]
pub struct Player {
    /// The actuator to fire pulses on.
    actuator: String,
    /// The path to the haptic track, relative to the config file.
    haptics: String,
    /// Overrides the track length reported by the analyzer, in seconds.
    duration: Option<f64>,
    /// How often the transport reports its position.
    cadence: Option<String>,
    /// The maximum sampling error added to reported positions.
    jitter: Option<String>,
    /// The controller configuration.
    #[serde(default)]
    controller: Controller,
    /// The directory the config was loaded from.
    #[serde(skip)]
    base_path: PathBuf,
}

impl Player {
    /// Loads the player config from a file. The format follows the file extension.
    pub fn load(path: &Path) -> Result<Player, ConfigError> {
        let mut player: Player = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;
        player.base_path = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(player)
    }

    /// Returns the actuator name.
    pub fn actuator(&self) -> &str {
        &self.actuator
    }

    /// Returns the haptic track path, resolved against the config file's directory.
    pub fn haptics(&self) -> PathBuf {
        self.base_path.join(&self.haptics)
    }

    /// Returns the track length override.
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Returns the status report cadence (default: 100ms).
    pub fn cadence(&self) -> Result<Duration, ConfigError> {
        parse_duration(self.cadence.as_deref(), DEFAULT_CADENCE)
    }

    /// Returns the position jitter (default: none).
    pub fn jitter(&self) -> Result<Duration, ConfigError> {
        parse_duration(self.jitter.as_deref(), DEFAULT_JITTER)
    }

    /// Returns the controller configuration.
    pub fn controller(&self) -> &Controller {
        &self.controller
    }
}

/// Parses a duration string such as "100ms", falling back to the default when unset.
pub fn parse_duration(value: Option<&str>, default: Duration) -> Result<Duration, ConfigError> {
    match value {
        Some(value) => Ok(DurationString::from_string(value.to_string())
            .map_err(|e| ConfigError::Duration {
                value: value.to_string(),
                reason: e.to_string(),
            })?
            .into()),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, time::Duration};

    use config::{Config, File, FileFormat};

    use super::*;

    #[test]
    fn test_player_deserialize() {
        let yaml = r#"
            actuator: mock-pad
            haptics: song.json
            duration: 180
            cadence: 50ms
            jitter: 10ms
            controller:
              kind: none
        "#;

        let player: Player = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!("mock-pad", player.actuator());
        assert_eq!(Some(180.0), player.duration());
        assert_eq!(Duration::from_millis(50), player.cadence().unwrap());
        assert_eq!(Duration::from_millis(10), player.jitter().unwrap());
        assert_eq!(&Controller::None, player.controller());
    }

    #[test]
    fn test_player_defaults() {
        let yaml = r#"
            actuator: log
            haptics: song.json
        "#;

        let player: Player = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(None, player.duration());
        assert_eq!(DEFAULT_CADENCE, player.cadence().unwrap());
        assert_eq!(Duration::ZERO, player.jitter().unwrap());
        assert_eq!(&Controller::Keyboard, player.controller());
    }

    #[test]
    fn test_player_bad_cadence() {
        let yaml = r#"
            actuator: log
            haptics: song.json
            cadence: soon
        "#;

        let player: Player = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!(matches!(
            player.cadence(),
            Err(ConfigError::Duration { .. })
        ));
    }

    #[test]
    fn test_player_load_resolves_haptics() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player.yaml");
        fs::write(&path, "actuator: log\nhaptics: tracks/song.json\n").unwrap();

        let player = Player::load(&path).unwrap();
        assert_eq!(dir.path().join("tracks/song.json"), player.haptics());
    }

    #[test]
    fn test_player_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Player::load(&dir.path().join("missing.yaml")),
            Err(ConfigError::Load(_))
        ));
    }
}
