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
use std::{error::Error, fmt};

use tracing::info;

use crate::haptics::Tier;

pub(super) const NAME: &str = "log";

/// An actuator that only logs the pulses it would fire.
pub struct Device {}

impl Device {
    pub fn new() -> Device {
        Device {}
    }
}

impl super::Actuator for Device {
    fn name(&self) -> String {
        NAME.to_string()
    }

    fn trigger(&self, tier: Tier) -> Result<(), Box<dyn Error>> {
        info!(tier = %tier, "Pulse.");
        Ok(())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Logs pulses)", NAME)
    }
}
