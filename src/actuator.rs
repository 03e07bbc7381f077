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
use std::{error::Error, fmt, sync::Arc};

use crate::haptics::Tier;

mod bell;
mod log;
pub mod mock;

/// A haptic actuator that turns a tier into a physical pulse.
pub trait Actuator: fmt::Display + std::marker::Send + std::marker::Sync {
    /// Returns the name of the device.
    fn name(&self) -> String;

    /// Fires a single pulse. Triggers are fire and forget; a failure only affects this pulse.
    fn trigger(&self, tier: Tier) -> Result<(), Box<dyn Error>>;
}

/// Lists the built in actuators.
pub fn list_devices() -> Vec<Box<dyn Actuator>> {
    vec![
        Box::new(log::Device::new()),
        Box::new(bell::Device::stdout()),
        Box::new(mock::Device::get("mock")),
    ]
}

/// Gets an actuator with the given name.
pub fn get_device(name: &str) -> Result<Arc<dyn Actuator>, Box<dyn Error>> {
    if name.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(name)));
    };

    match name {
        log::NAME => Ok(Arc::new(log::Device::new())),
        bell::NAME => Ok(Arc::new(bell::Device::stdout())),
        _ => Err(format!("unknown actuator '{}'", name).into()),
    }
}
