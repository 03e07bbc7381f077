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
use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::controller::{keyboard, Driver};
use crate::player::{HapticPlayer, SharedPlayer};
use crate::transport::{Simulation, Transport};
use crate::{actuator, util};

mod error;
mod haptics;
mod player;

pub use self::error::{ConfigError, HapticDataError};
pub use self::haptics::{parse_haptics, parse_haptics_str};
pub use self::player::{parse_duration, Controller, Player, DEFAULT_CADENCE};

/// Initializes a simulated playback session from the given player config. Returns the
/// simulation along with the driver configured to control it, if any.
pub fn init_simulation(
    player_path: &Path,
) -> Result<(Simulation, Option<Arc<dyn Driver>>), Box<dyn Error>> {
    let player_config = Player::load(player_path)?;
    let actuator = actuator::get_device(player_config.actuator())?;

    let haptics_path = player_config.haptics();
    let data = parse_haptics(&haptics_path)?;
    info!(
        file = util::filename_display(&haptics_path),
        events = data.events.len(),
        "Loaded haptic track."
    );

    let duration = player_config
        .duration()
        .unwrap_or_else(|| data.track_duration());
    let mut player = HapticPlayer::new(actuator, data);
    player.set_duration(duration);

    let simulation = Simulation::new(
        Transport::new(duration, player_config.jitter()?),
        SharedPlayer::new(player),
        player_config.cadence()?,
    );

    let driver: Option<Arc<dyn Driver>> = match player_config.controller() {
        Controller::Keyboard => Some(Arc::new(keyboard::Driver::new())),
        Controller::None => None,
    };

    Ok((simulation, driver))
}
