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
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{error, info, span, Instrument, Level};

use crate::player::SharedPlayer;
use crate::playsync::CancelHandle;
use crate::transport::{Simulation, SharedTransport, TransportState};
use crate::util::format_seconds;

pub mod keyboard;

/// Controller events that will drive the transport and the haptics along with it.
#[derive(Debug, PartialEq)]
pub enum Event {
    /// Starts or resumes playback.
    Play,

    /// Pauses playback. If nothing is playing, does nothing.
    Pause,

    /// Stops playback and rewinds to the start of the track.
    Stop,

    /// Moves playback to the given position in seconds.
    Seek(f64),

    /// Fires a test pulse on the actuator.
    Test,

    /// Logs the current transport and haptic state.
    Status,

    /// Ends the session.
    Quit,
}

pub trait Driver: Send + Sync + 'static {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>>;
}

/// Controls a simulated transport and its haptic player.
pub struct Controller {
    handle: JoinHandle<()>,
}

impl Controller {
    /// Creates a new controller with the given driver. The simulation is cancelled when the
    /// driver closes or a quit is requested.
    pub fn new(simulation: &Simulation, driver: Arc<dyn Driver>) -> Controller {
        let transport = simulation.transport();
        let player = simulation.player();
        let cancel_handle = simulation.cancel_handle();
        Controller {
            handle: tokio::spawn(
                Controller::trigger_events(transport, player, cancel_handle, driver)
                    .instrument(span!(Level::INFO, "controller")),
            ),
        }
    }

    /// Join will block until the controller finishes.
    pub async fn join(&mut self) -> Result<(), JoinError> {
        (&mut self.handle).await
    }

    /// Drives the transport by watching the driver and getting events from it.
    async fn trigger_events(
        transport: SharedTransport,
        player: SharedPlayer,
        cancel_handle: CancelHandle,
        driver: Arc<dyn Driver>,
    ) {
        let (events_tx, mut events_rx) = mpsc::channel(1);
        let join_handle = driver.monitor_events(events_tx);

        info!(
            events = player.progress().total,
            "Controller started."
        );

        loop {
            if let Some(event) = events_rx.recv().await {
                info!(event = format!("{:?}", event), "Received event.");

                match Controller::apply(event, &transport, &player) {
                    Ok(true) => {
                        info!("Quit requested.");
                        cancel_handle.cancel();
                        return;
                    }
                    Ok(false) => {}
                    Err(e) => error!("Error talking to player: {}", e),
                }
            } else {
                info!("Controller closing.");
                cancel_handle.cancel();
                if let Err(e) = join_handle.await {
                    error!("Error waiting for event monitor to stop: {}", e);
                }
                return;
            }
        }
    }

    /// Applies a single event. Returns true if the session should end.
    fn apply(
        event: Event,
        transport: &SharedTransport,
        player: &SharedPlayer,
    ) -> Result<bool, Box<dyn Error>> {
        // The transport stays locked while the haptics follow it, matching the playback loop.
        let mut transport = transport.lock();
        match event {
            Event::Play => {
                let from_stop = transport.state() == TransportState::Stopped;
                transport.play();
                if from_stop {
                    // Starting from the top arms every pulse, including one at 0.0.
                    match transport.position() {
                        position if position > 0.0 => player.seek(position),
                        _ => player.stop(),
                    }
                }
            }
            Event::Pause => transport.pause(),
            Event::Stop => {
                transport.stop();
                player.stop();
            }
            Event::Seek(target) => {
                let position = transport.seek(target);
                player.seek(position);
            }
            Event::Test => {
                let tier = player.lock().test_pulse()?;
                info!(tier = %tier, "Fired test pulse.");
            }
            Event::Status => info!(
                state = %transport.state(),
                position = format_seconds(transport.position()),
                duration = format_seconds(transport.duration()),
                progress = %player.progress(),
                "Status."
            ),
            Event::Quit => return Ok(true),
        }
        Ok(false)
    }
}

#[cfg(test)]
mod test {
    use std::{
        error::Error,
        io,
        sync::{Arc, Barrier, Mutex},
        time::Duration,
    };

    use tokio::{sync::mpsc::Sender, task::JoinHandle};

    use crate::{
        actuator::mock,
        haptics::{EventList, HapticData, HapticEvent, Tier},
        player::{HapticPlayer, SharedPlayer},
        test::eventually,
        transport::{Simulation, Transport, TransportState},
    };

    use super::{Driver, Event};

    #[derive(Debug)]
    enum TestEvent {
        Unset,
        Send(Event),
        Close,
    }

    struct TestDriver {
        current_event: Arc<Mutex<TestEvent>>,
        barrier: Arc<Barrier>,
    }

    impl TestDriver {
        /// Creates a new test driver which is explicitly controlled by the next_event function.
        fn new() -> TestDriver {
            TestDriver {
                current_event: Arc::new(Mutex::new(TestEvent::Unset)),
                barrier: Arc::new(Barrier::new(2)),
            }
        }

        /// Signals the next event to the monitor thread.
        fn next_event(&self, event: TestEvent) {
            {
                let mut current_event = self.current_event.lock().expect("failed to get lock");
                *current_event = event;
            }
            // Wait until the thread goes to receive the event.
            self.barrier.wait();
            // Wait until the thread has taken the event.
            self.barrier.wait();
        }
    }

    impl Driver for TestDriver {
        fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
            let barrier = self.barrier.clone();
            let current_event = self.current_event.clone();
            tokio::task::spawn_blocking(move || loop {
                // Wait for next event to set the current event.
                barrier.wait();
                let event = {
                    let mut current_event = current_event.lock().expect("failed to get lock");
                    std::mem::replace(&mut *current_event, TestEvent::Unset)
                };
                // Let next event know that we got the event.
                barrier.wait();
                match event {
                    TestEvent::Unset => panic!("current event should not be unset"),
                    TestEvent::Send(event) => assert!(events_tx.blocking_send(event).is_ok()),
                    TestEvent::Close => return Ok(()),
                }
            })
        }
    }

    fn simulation() -> (Simulation, mock::Device) {
        let device = mock::Device::get("mock-controller");
        let events = EventList::new(vec![
            HapticEvent::new(1.0, 0.2),
            HapticEvent::new(2.0, 0.6),
            HapticEvent::new(3.0, 0.9),
        ]);
        let player = SharedPlayer::new(HapticPlayer::new(
            Arc::new(device.clone()),
            HapticData::new(events, None),
        ));
        (
            Simulation::new(
                Transport::new(4.0, Duration::ZERO),
                player,
                Duration::from_millis(10),
            ),
            device,
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_controller() -> Result<(), Box<dyn Error>> {
        let driver = Arc::new(TestDriver::new());
        let (simulation, device) = simulation();
        let transport = simulation.transport();
        let player = simulation.player();
        let mut controller = super::Controller::new(&simulation, driver.clone());

        driver.next_event(TestEvent::Send(Event::Seek(2.5)));
        eventually(
            || player.progress().dispatched == 2,
            "Haptics never followed the seek",
        );
        assert_eq!(2.5, transport.lock().position());

        driver.next_event(TestEvent::Send(Event::Play));
        eventually(
            || transport.lock().state() == TransportState::Playing,
            "Transport never started playing",
        );
        // Playing from a stop keeps the seeked position.
        assert_eq!(2, player.progress().dispatched);

        driver.next_event(TestEvent::Send(Event::Pause));
        eventually(
            || transport.lock().state() == TransportState::Paused,
            "Transport never paused",
        );

        driver.next_event(TestEvent::Send(Event::Test));
        eventually(
            || device.triggered() == vec![Tier::Heavy],
            "Test pulse never fired",
        );

        driver.next_event(TestEvent::Send(Event::Status));
        driver.next_event(TestEvent::Send(Event::Stop));
        eventually(
            || transport.lock().state() == TransportState::Stopped,
            "Transport never stopped",
        );
        assert_eq!(0, player.progress().dispatched);
        assert_eq!(0.0, transport.lock().position());

        driver.next_event(TestEvent::Close);
        assert!(
            controller.join().await.is_ok(),
            "Error waiting for controller",
        );
        assert!(simulation.cancel_handle().is_cancelled());

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_play_from_stop_fires_pulse_at_start() -> Result<(), Box<dyn Error>> {
        let driver = Arc::new(TestDriver::new());
        let device = mock::Device::get("mock-controller");
        let player = SharedPlayer::new(HapticPlayer::new(
            Arc::new(device.clone()),
            HapticData::new(
                EventList::new(vec![HapticEvent::new(0.0, 0.9), HapticEvent::new(1.0, 0.2)]),
                None,
            ),
        ));
        let simulation = Simulation::new(
            Transport::new(2.0, Duration::ZERO),
            player.clone(),
            Duration::from_millis(10),
        );
        let transport = simulation.transport();
        let mut controller = super::Controller::new(&simulation, driver.clone());

        driver.next_event(TestEvent::Send(Event::Play));
        eventually(
            || transport.lock().state() == TransportState::Playing,
            "Transport never started playing",
        );
        assert_eq!(0, player.progress().dispatched);

        // Nothing is ticking the transport, so report the start position directly.
        let status = transport.lock().status();
        player.on_status(&status);
        assert_eq!(vec![Tier::Heavy], device.triggered());

        // Stopping and playing again arms the pulse at the start once more.
        driver.next_event(TestEvent::Send(Event::Stop));
        eventually(
            || transport.lock().state() == TransportState::Stopped,
            "Transport never stopped",
        );
        driver.next_event(TestEvent::Send(Event::Play));
        eventually(
            || transport.lock().state() == TransportState::Playing,
            "Transport never restarted",
        );
        let status = transport.lock().status();
        player.on_status(&status);
        assert_eq!(vec![Tier::Heavy, Tier::Heavy], device.triggered());

        driver.next_event(TestEvent::Close);
        assert!(
            controller.join().await.is_ok(),
            "Error waiting for controller",
        );
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_controller_quit() {
        let driver = Arc::new(TestDriver::new());
        let (simulation, _) = simulation();
        let mut controller = super::Controller::new(&simulation, driver.clone());

        driver.next_event(TestEvent::Send(Event::Quit));
        assert!(controller.join().await.is_ok());
        assert!(simulation.cancel_handle().is_cancelled());

        // Release the monitor thread so the runtime can shut down.
        driver.next_event(TestEvent::Close);
    }
}
