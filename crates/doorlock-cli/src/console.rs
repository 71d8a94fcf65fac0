//! Line-oriented console for the simulated door.
//!
//! Each line typed on stdin is one [`Command`]. Commands act on the mock
//! device handles, so the controller sees them exactly as it would see a real
//! keypad, card reader or motion sensor.

use std::io::BufRead;

use anyhow::{Context, Result, bail};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use doorlock_controller::ControllerStatus;
use doorlock_hardware::mock::MockDoorHandle;

pub const HELP: &str = "\
Commands:
  keys <keys>     press keys, e.g. `keys 5555#`
  card <tag>      present a card by its 8-digit hex tag
  motion on|off   set the motion sensor
  ready           mark the companion module ready
  status          show controller state and outputs
  display         show the display
  help            show this text
  quit            stop the door";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Keys(String),
    Card(String),
    Motion(bool),
    Ready,
    Status,
    Display,
    Help,
    Quit,
}

/// What the console should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Done,
    Text(String),
    Quit,
}

impl Command {
    /// Parse one console line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let arg = words.next();
        if words.next().is_some() {
            bail!("too many arguments for `{verb}`");
        }

        let command = match (verb.to_ascii_lowercase().as_str(), arg) {
            ("keys" | "k", Some(keys)) => Command::Keys(keys.to_string()),
            ("card" | "c", Some(tag)) => Command::Card(tag.to_string()),
            ("motion" | "m", Some("on")) => Command::Motion(true),
            ("motion" | "m", Some("off")) => Command::Motion(false),
            ("motion" | "m", _) => bail!("usage: motion on|off"),
            ("ready", None) => Command::Ready,
            ("status" | "s", None) => Command::Status,
            ("display" | "d", None) => Command::Display,
            ("help" | "?", None) => Command::Help,
            ("quit" | "q" | "exit", None) => Command::Quit,
            ("keys" | "k" | "card" | "c", None) => bail!("`{verb}` needs an argument"),
            (_, Some(_)) if is_known(verb) => bail!("`{verb}` takes no argument"),
            _ => bail!("unknown command `{verb}`, try `help`"),
        };
        Ok(Some(command))
    }

    /// Apply the command to the door.
    pub fn execute(
        &self,
        handle: &MockDoorHandle,
        status: &watch::Receiver<ControllerStatus>,
    ) -> Result<Reply> {
        match self {
            Command::Keys(keys) => {
                handle
                    .keypad
                    .type_str(keys)
                    .with_context(|| "keypad rejected input")?;
                Ok(Reply::Done)
            }
            Command::Card(tag) => {
                handle
                    .rfid
                    .present_tag(tag)
                    .with_context(|| format!("cannot present card {tag}"))?;
                Ok(Reply::Done)
            }
            Command::Motion(present) => {
                handle.motion.set_motion(*present);
                Ok(Reply::Done)
            }
            Command::Ready => {
                handle.notifier.set_ready(true);
                Ok(Reply::Done)
            }
            Command::Status => Ok(Reply::Text(status_report(handle, &status.borrow()))),
            Command::Display => Ok(Reply::Text(handle.display.snapshot().render())),
            Command::Help => Ok(Reply::Text(HELP.to_string())),
            Command::Quit => Ok(Reply::Quit),
        }
    }
}

fn is_known(verb: &str) -> bool {
    matches!(
        verb.to_ascii_lowercase().as_str(),
        "ready" | "status" | "s" | "display" | "d" | "help" | "?" | "quit" | "q" | "exit"
    )
}

/// Controller state plus every output line.
pub fn status_report(handle: &MockDoorHandle, status: &ControllerStatus) -> String {
    let lock = handle
        .lock
        .position()
        .map_or_else(|| "-".to_string(), |p| p.to_string());
    let identity = status
        .resolved_identity
        .map_or_else(|| "-".to_string(), |id| id.to_string());

    format!(
        "phase={} trials={} buffered={} identity={} notice={}\n\
         lock={} granted={} denied={} alarm={}\n{}",
        status.phase,
        status.trials,
        status.buffered,
        identity,
        status.showing_notice,
        lock,
        handle.granted_led.level(),
        handle.denied_led.level(),
        handle.alarm.level(),
        handle.display.snapshot().render(),
    )
}

/// Read stdin on a plain thread so a pending read never holds up shutdown.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Serve console commands until `quit`, end of input or cancellation.
pub async fn run(
    handle: MockDoorHandle,
    status: watch::Receiver<ControllerStatus>,
    cancel: CancellationToken,
) {
    let mut lines = spawn_stdin_reader();
    println!("{HELP}");

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.recv() => line,
        };
        let Some(line) = line else {
            debug!("Console input closed");
            cancel.cancel();
            break;
        };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match command.execute(&handle, &status) {
            Ok(Reply::Done) => {}
            Ok(Reply::Text(text)) => println!("{text}"),
            Ok(Reply::Quit) => {
                cancel.cancel();
                break;
            }
            Err(e) => warn!("{:#}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorlock_controller::Phase;
    use doorlock_hardware::mock::{MockNotifier, mock_door_with_notifier};
    use rstest::rstest;

    #[rstest]
    #[case("keys 5555#", Command::Keys("5555#".into()))]
    #[case("k 12*", Command::Keys("12*".into()))]
    #[case("card c976133f", Command::Card("c976133f".into()))]
    #[case("motion on", Command::Motion(true))]
    #[case("MOTION off", Command::Motion(false))]
    #[case("ready", Command::Ready)]
    #[case("  status  ", Command::Status)]
    #[case("q", Command::Quit)]
    fn test_parse(#[case] line: &str, #[case] expected: Command) {
        assert_eq!(Command::parse(line).unwrap(), Some(expected));
    }

    #[rstest]
    #[case("keys")]
    #[case("motion maybe")]
    #[case("status now")]
    #[case("card a b")]
    #[case("open")]
    fn test_parse_errors(#[case] line: &str) {
        assert!(Command::parse(line).is_err());
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(Command::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_execute_drives_handles() {
        let (_door, handle) = mock_door_with_notifier(MockNotifier::offline());
        let (_tx, status) = watch::channel(ControllerStatus::default());

        Command::Motion(true).execute(&handle, &status).unwrap();
        Command::Ready.execute(&handle, &status).unwrap();

        assert_eq!(
            Command::Quit.execute(&handle, &status).unwrap(),
            Reply::Quit
        );
        assert!(Command::Card("xyz".into()).execute(&handle, &status).is_err());
    }

    #[test]
    fn test_status_report() {
        let (_door, handle) = mock_door_with_notifier(MockNotifier::new());
        let status = ControllerStatus {
            phase: Phase::Lockout,
            trials: 3,
            ..ControllerStatus::default()
        };

        let report = status_report(&handle, &status);
        assert!(report.starts_with("phase=LOCKOUT trials=3 buffered=0 identity=-"));
        assert!(report.contains("lock=- granted=LOW denied=LOW alarm=LOW"));
    }
}
