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
    io::{self, Write},
};

use parking_lot::Mutex;

use crate::haptics::Tier;

pub(super) const NAME: &str = "bell";

const BELL: &[u8] = b"\x07";

/// An actuator that rings the terminal bell, once per tier step.
pub struct Device {
    out: Mutex<Box<dyn Write + Send>>,
}

impl Device {
    /// Creates a bell that rings on stdout.
    pub fn stdout() -> Device {
        Device::new(Box::new(io::stdout()))
    }

    fn new(out: Box<dyn Write + Send>) -> Device {
        Device {
            out: Mutex::new(out),
        }
    }

    fn rings(tier: Tier) -> usize {
        match tier {
            Tier::Light => 1,
            Tier::Medium => 2,
            Tier::Heavy => 3,
        }
    }
}

impl super::Actuator for Device {
    fn name(&self) -> String {
        NAME.to_string()
    }

    fn trigger(&self, tier: Tier) -> Result<(), Box<dyn Error>> {
        let mut out = self.out.lock();
        for _ in 0..Device::rings(tier) {
            out.write_all(BELL)?;
        }
        out.flush()?;
        Ok(())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Terminal bell)", NAME)
    }
}

#[cfg(test)]
mod test {
    use std::{
        io::{self, Write},
        sync::Arc,
    };

    use parking_lot::Mutex;

    use super::Device;
    use crate::{actuator::Actuator, haptics::Tier};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_bell_rings_per_tier() {
        let buffer = SharedBuffer::default();
        let device = Device::new(Box::new(buffer.clone()));

        device.trigger(Tier::Light).unwrap();
        assert_eq!(b"\x07".to_vec(), *buffer.0.lock());

        device.trigger(Tier::Heavy).unwrap();
        assert_eq!(4, buffer.0.lock().len());
    }
}
