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
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;
use tracing::info;

use crate::haptics::Tier;

/// A mock actuator. Records pulses instead of firing them.
#[derive(Clone)]
pub struct Device {
    name: String,
    triggered: Arc<Mutex<Vec<Tier>>>,
    failures: Arc<AtomicUsize>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            triggered: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns the tiers of every successful trigger, in order.
    pub fn triggered(&self) -> Vec<Tier> {
        self.triggered.lock().clone()
    }

    /// Clears the recorded triggers.
    pub fn reset_triggered(&self) {
        self.triggered.lock().clear();
    }

    /// Makes the next count triggers fail.
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::Relaxed);
    }
}

impl super::Actuator for Device {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn trigger(&self, tier: Tier) -> Result<(), Box<dyn Error>> {
        if self
            .failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |f| f.checked_sub(1))
            .is_ok()
        {
            return Err(format!("mock actuator {} failed to pulse", self.name).into());
        }

        info!(device = self.name, tier = %tier, "Pulse (mock).");
        self.triggered.lock().push(tier);
        Ok(())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name,)
    }
}
