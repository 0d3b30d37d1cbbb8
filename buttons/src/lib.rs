pub mod buttons {
    use log::*;
    use network::MotorsDirection;
    use std::io::{self, BufRead};
    use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
    use std::thread;
    use std::time::Duration;

    /// Operator input, one event per tick at most
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum UserEvent {
        Exit,
        TogglePause,
        /// One corner of the area, in frame pixels
        AreaCorner { x: u32, y: u32 },
        ResetArea,
        /// A single manual step, or stop
        Manual(MotorsDirection),
        /// Skip the current wait, refresh the frame or continue after a pause
        SkipWait,
    }

    /// Parses one console line.
    ///
    /// ```text
    /// q | exit            stop the supervisor
    /// p | pause           toggle pause after each step
    /// c <x> <y>           area corner (also `corner <x> <y>`)
    /// r | reset           forget the area
    /// n | next | go       skip the wait / continue
    /// up, up-right, ...   manual step, `stop` halts the motors
    /// ```
    pub fn parse_command(line: &str) -> Result<UserEvent, String> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Err("empty command".to_string());
        };

        let event = match command.to_ascii_lowercase().as_str() {
            "q" | "quit" | "exit" => UserEvent::Exit,
            "p" | "pause" => UserEvent::TogglePause,
            "r" | "reset" => UserEvent::ResetArea,
            "n" | "next" | "go" => UserEvent::SkipWait,
            "c" | "corner" => {
                let mut coordinate = |name: &str| -> Result<u32, String> {
                    words
                        .next()
                        .ok_or_else(|| format!("missing {name} coordinate"))?
                        .parse::<u32>()
                        .map_err(|e| format!("invalid {name} coordinate: {e}"))
                };
                let x = coordinate("x")?;
                let y = coordinate("y")?;
                UserEvent::AreaCorner { x, y }
            }
            other => UserEvent::Manual(other.parse::<MotorsDirection>()?),
        };

        if words.next().is_some() {
            return Err(format!("unexpected arguments in {line:?}"));
        }
        Ok(event)
    }

    /// Console commands read on a background thread and handed out one per tick.
    pub struct Buttons {
        events: Receiver<UserEvent>,
    }

    impl Buttons {
        pub fn from_stdin() -> Buttons {
            Buttons::from_reader(io::BufReader::new(io::stdin()))
        }

        pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Buttons {
            let (sender, events) = mpsc::channel();
            thread::spawn(move || {
                for line in reader.lines() {
                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            warn!("Console input closed: {}", e);
                            break;
                        }
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match parse_command(&line) {
                        Ok(event) => {
                            if sender.send(event).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Ignoring console command {:?}: {}", line.trim(), e),
                    }
                }
                debug!("Console reader stopped");
            });
            Buttons { events }
        }

        /// Waits up to `poll` for the next event
        pub fn tick(&mut self, poll: Duration) -> Option<UserEvent> {
            match self.events.recv_timeout(poll) {
                Ok(event) => Some(event),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => {
                    // No more input: keep the loop cadence
                    thread::sleep(poll);
                    None
                }
            }
        }
    }

}

pub use buttons::{parse_command, Buttons, UserEvent};
