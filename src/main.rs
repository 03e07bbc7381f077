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
use clap::{crate_version, Parser, Subcommand};
use hapticbeat::config;
use hapticbeat::controller::{keyboard, Controller, Driver};
use hapticbeat::haptics::{self, Tier};
use hapticbeat::player::{HapticPlayer, SharedPlayer};
use hapticbeat::transport::{Simulation, Transport};
use hapticbeat::{actuator, util};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A haptic track player."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists and verifies the events in a haptic track.
    Inspect {
        /// The path to the haptic track JSON.
        path: String,
    },
    /// Lists the available actuators.
    Devices {},
    /// Prints a fixed interval test pattern as JSON.
    Generate {
        /// The track length in seconds.
        duration: f64,
        /// The time between pulses in seconds.
        #[arg(short, long, default_value_t = 0.5)]
        interval: f64,
        /// The intensity of every pulse.
        #[arg(short = 'n', long, default_value_t = haptics::DEFAULT_PATTERN_INTENSITY)]
        intensity: f64,
    },
    /// Plays a haptic track against a simulated transport.
    Simulate {
        /// The path to the haptic track JSON.
        path: String,
        /// The actuator to fire pulses on.
        #[arg(short, long, default_value = "log")]
        actuator: String,
        /// How often the transport reports its position, e.g. 100ms.
        #[arg(short, long)]
        cadence: Option<String>,
        /// The maximum sampling error added to reported positions, e.g. 10ms.
        #[arg(short, long)]
        jitter: Option<String>,
        /// Overrides the track length in seconds.
        #[arg(short, long)]
        duration: Option<f64>,
        /// Control the transport from the keyboard instead of playing straight through.
        #[arg(short, long)]
        keyboard: bool,
    },
    /// Start will start a playback session from a player config.
    Start {
        /// The path to the player config.
        player_path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { path } => {
            let data = config::parse_haptics(&PathBuf::from(&path))?;

            if let Some(metadata) = data.metadata.as_ref() {
                if let Some(tempo) = metadata.tempo_bpm {
                    println!("Tempo: {:.1} BPM", tempo);
                }
                if let Some(sample_rate) = metadata.sample_rate {
                    println!("Sample rate: {} Hz", sample_rate);
                }
            }
            println!(
                "Duration: {}",
                util::format_seconds(data.track_duration())
            );

            if data.events.is_empty() {
                println!("No events found in {}.", path);
                return Ok(());
            }

            let (light, medium, heavy) = data.events.tier_counts();
            println!(
                "Events (count: {}, {}: {}, {}: {}, {}: {}):",
                data.events.len(),
                Tier::Light,
                light,
                Tier::Medium,
                medium,
                Tier::Heavy,
                heavy,
            );
            for event in data.events.iter() {
                println!(
                    "- {} ({:.3}s) intensity {:.2} -> {}",
                    util::format_seconds(event.time),
                    event.time,
                    event.intensity,
                    event.tier(),
                );
            }
        }
        Commands::Devices {} => {
            println!("Devices:");
            for device in actuator::list_devices() {
                println!("- {}", device);
            }
        }
        Commands::Generate {
            duration,
            interval,
            intensity,
        } => {
            let events = haptics::generate_simple(duration, interval, intensity)?;
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
        Commands::Simulate {
            path,
            actuator,
            cadence,
            jitter,
            duration,
            keyboard,
        } => {
            let simulation = simulation_from_args(
                Path::new(&path),
                &actuator,
                cadence,
                jitter,
                duration,
            )?;

            if keyboard {
                let driver: Arc<dyn Driver> = Arc::new(keyboard::Driver::new());
                run_with_driver(simulation, driver).await?;
            } else {
                simulation.transport().lock().play();
                simulation.run(true).await;
            }
        }
        Commands::Start { player_path } => {
            let (simulation, driver) = config::init_simulation(&PathBuf::from(player_path))?;
            match driver {
                Some(driver) => run_with_driver(simulation, driver).await?,
                None => {
                    simulation.transport().lock().play();
                    simulation.run(true).await;
                }
            }
        }
    }

    Ok(())
}

/// Builds a simulation from command line arguments.
fn simulation_from_args(
    path: &Path,
    actuator: &str,
    cadence: Option<String>,
    jitter: Option<String>,
    duration: Option<f64>,
) -> Result<Simulation, Box<dyn Error>> {
    let data = config::parse_haptics(path)?;
    let duration = duration.unwrap_or_else(|| data.track_duration());
    let mut player = HapticPlayer::new(actuator::get_device(actuator)?, data);
    player.set_duration(duration);

    let cadence = config::parse_duration(cadence.as_deref(), config::DEFAULT_CADENCE)?;
    let jitter = config::parse_duration(jitter.as_deref(), Duration::ZERO)?;
    Ok(Simulation::new(
        Transport::new(duration, jitter),
        SharedPlayer::new(player),
        cadence,
    ))
}

/// Runs the simulation until the driver closes or asks to quit.
async fn run_with_driver(
    simulation: Simulation,
    driver: Arc<dyn Driver>,
) -> Result<(), Box<dyn Error>> {
    let mut controller = Controller::new(&simulation, driver);
    simulation.run(false).await;
    controller.join().await?;
    Ok(())
}
