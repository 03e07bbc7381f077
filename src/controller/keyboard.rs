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
use std::{io, thread};

use tokio::{
    sync::{mpsc::Sender, oneshot},
    task::JoinHandle,
};
use tracing::{info, span, warn, Level};

use super::Event;

const PLAY: &str = "play";
const PAUSE: &str = "pause";
const STOP: &str = "stop";
const SEEK: &str = "seek";
const TEST: &str = "test";
const STATUS: &str = "status";
const QUIT: &str = "quit";

/// A controller that drives the transport using the keyboard.
pub struct Driver {}

impl Driver {
    pub fn new() -> Driver {
        Driver {}
    }

    /// Parses a single command line. Returns None for anything unrecognized.
    fn parse(input: &str) -> Option<Event> {
        let mut parts = input.split_whitespace();
        let command = parts.next()?.to_lowercase();
        let argument = parts.next();

        match (command.as_str(), argument) {
            (PLAY, None) => Some(Event::Play),
            (PAUSE, None) => Some(Event::Pause),
            (STOP, None) => Some(Event::Stop),
            (SEEK, Some(seconds)) => seconds.parse::<f64>().ok().map(Event::Seek),
            (TEST, None) => Some(Event::Test),
            (STATUS, None) => Some(Event::Status),
            (QUIT, None) => Some(Event::Quit),
            _ => None,
        }
    }

    /// Reads and forwards a single command. Returns false once the input is exhausted.
    fn monitor_io<R, W>(
        events_tx: &Sender<Event>,
        mut reader: R,
        mut writer: W,
    ) -> Result<bool, io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(
            writer,
            "Command ({}, {}, {}, {} <seconds>, {}, {}, {}): ",
            PLAY, PAUSE, STOP, SEEK, TEST, STATUS, QUIT,
        )?;
        writer.flush()?;
        let mut input: String = String::default();
        if reader.read_line(&mut input)? == 0 {
            return Ok(false);
        }

        match Driver::parse(&input) {
            Some(event) => events_tx
                .blocking_send(event)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?,
            None => warn!(input = input.trim(), "Unrecognized input"),
        }
        Ok(true)
    }
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        let (done_tx, done_rx) = oneshot::channel();

        // Not a blocking task, since the runtime waits on those at shutdown and stdin never returns.
        thread::spawn(move || {
            let span = span!(Level::INFO, "keyboard driver");
            let _enter = span.enter();

            info!("Keyboard driver started.");

            let result = loop {
                match Self::monitor_io(&events_tx, io::stdin().lock(), io::stdout()) {
                    Ok(true) => {}
                    Ok(false) => break Ok(()),
                    Err(e) => break Err(e),
                }
            };
            let _ = done_tx.send(result);
        });

        tokio::spawn(async move { done_rx.await.unwrap_or(Ok(())) })
    }
}
