//! Line-oriented terminal front end.
//!
//! Reads commands from stdin and prints session changes as they arrive.

use roulette_common::{SessionError, SessionState};
use roulette_session::{SessionEvent, SessionHandle, SessionSnapshot};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Skip,
    Status,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "next" | "n" => Some(Command::Next),
            "skip" | "s" => Some(Command::Skip),
            "status" | "st" => Some(Command::Status),
            "help" | "h" | "?" => Some(Command::Help),
            "quit" | "q" | "exit" => Some(Command::Quit),
            _ => None,
        }
    }
}

const HELP: &str = "commands: next (n), skip (s), status, help, quit (q)";

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// One-line summary of a snapshot.
pub fn describe(snapshot: &SessionSnapshot) -> String {
    let mut line = format!("[{}]", snapshot.state);
    if let Some(peer) = &snapshot.peer_id {
        line.push_str(&format!(" stranger: {peer}"));
    }
    if let Some(room) = &snapshot.room_code {
        line.push_str(&format!(" room: {room}"));
    }
    if let Some(role) = snapshot.role {
        line.push_str(&format!(" role: {role}"));
    }
    if snapshot.verified {
        line.push_str(" (verified)");
    }
    if let Some(error) = &snapshot.last_error {
        line.push_str(&format!(" error: {error}"));
    }
    line
}

fn state_message(state: SessionState) -> &'static str {
    match state {
        SessionState::Idle => "Not registered.",
        SessionState::Registered => "Registering...",
        SessionState::Queued => "Looking for a stranger...",
        SessionState::Matched => "Matched! Connecting to the relay...",
        SessionState::Negotiating => "Setting up the call...",
        SessionState::Connected => "Connected. Say hi!",
        SessionState::PeerDisconnected => "The stranger left. Type `next` to meet someone new.",
        SessionState::Errored => "Something went wrong. Type `next` to try again.",
    }
}

enum Flow {
    Continue,
    Quit,
}

pub struct Console {
    handle: SessionHandle,
    events: mpsc::Receiver<SessionEvent>,
    last_state: Option<SessionState>,
    confirming_skip: bool,
}

impl Console {
    pub fn new(handle: SessionHandle, events: mpsc::Receiver<SessionEvent>) -> Self {
        Self {
            handle,
            events,
            last_state: None,
            confirming_skip: false,
        }
    }

    /// Run until the user quits, stdin closes, or Ctrl-C.
    pub async fn run(mut self) -> Result<(), SessionError> {
        println!("{HELP}");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if let Flow::Quit = self.on_line(&line).await {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("stdin closed");
                        break;
                    }
                    Err(e) => {
                        debug!(error = %e, "stdin read failed");
                        break;
                    }
                },
                Some(event) = self.events.recv() => self.on_event(event),
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted");
                    break;
                }
            }
        }

        self.handle.shutdown().await
    }

    async fn on_line(&mut self, line: &str) -> Flow {
        if self.confirming_skip {
            self.confirming_skip = false;
            if is_yes(line) {
                self.report(self.handle.skip().await);
            } else {
                println!("Staying with this stranger.");
            }
            return Flow::Continue;
        }

        match Command::parse(line) {
            Some(Command::Next) => self.report(self.handle.find_next().await),
            Some(Command::Skip) => {
                if self.handle.snapshot().state.in_round() {
                    self.confirming_skip = true;
                    println!("Skip this stranger? [y/N]");
                } else {
                    self.report(self.handle.skip().await);
                }
            }
            Some(Command::Status) => println!("{}", describe(&self.handle.snapshot())),
            Some(Command::Help) => println!("{HELP}"),
            Some(Command::Quit) => return Flow::Quit,
            None if line.trim().is_empty() => {}
            None => println!("unknown command `{}`; {HELP}", line.trim()),
        }
        Flow::Continue
    }

    fn on_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::StateChanged(snapshot) => {
                if self.last_state == Some(snapshot.state) {
                    return;
                }
                self.last_state = Some(snapshot.state);
                println!("{}", state_message(snapshot.state));
                if snapshot.state == SessionState::Matched {
                    if let Some(peer) = &snapshot.peer_id {
                        println!("You are talking to {peer}.");
                    }
                }
            }
            SessionEvent::RemoteStream(stream) => {
                println!(
                    "Receiving the stranger's stream ({} track(s)).",
                    stream.tracks().len()
                );
            }
            SessionEvent::RemoteStreamEnded => println!("The stranger's stream ended."),
            SessionEvent::Error(e) => println!("error: {e}"),
        }
    }

    fn report(&self, result: Result<(), SessionError>) {
        if let Err(e) = result {
            println!("error: {e}");
        }
    }
}
