//! Serial console adapter.
//!
//! A reader thread pulls lines from stdin (the UART / USB-CDC console on
//! device) and hands them to the main loop through a bounded
//! `embassy-sync` channel.  The main loop parses them into
//! [`AppCommand`]s between ticks.
//!
//! ```text
//! ┌──────────────┐  ConsoleLine  ┌──────────────┐
//! │ stdin reader │──────────────▶│  main loop   │
//! │  (thread)    │   try_send    │ parse_line() │
//! └──────────────┘               └──────────────┘
//! ```
//!
//! Grammar (one command per line, whitespace separated):
//!
//! | Line                     | Command                     |
//! |--------------------------|-----------------------------|
//! | `start <mode>`           | `Start(mode)`               |
//! | `stop <mode>`            | `Stop(mode)`                |
//! | `toggle <mode>`          | `Toggle(mode)`              |
//! | `code <mode> [attempt]`  | `SubmitPasscode(mode, ..)`  |
//! | `dismiss <mode>`         | `DismissPrompt(mode)`       |
//! | `close <mode>`           | `Teardown(mode)`            |
//! | `passcode set <value>`   | `SetPasscode(value)`        |
//! | `passcode on` / `off`    | `Enable/DisablePasscode`    |
//! | `status <mode>`          | `Status(mode)`              |
//!
//! `<mode>` is `alarm` or `capture`.  `attempt` and `value` are the rest of
//! the line, inner spaces included; whitespace at either end is trimmed.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

use crate::app::commands::AppCommand;
use crate::app::controller::SessionStatus;
use crate::fsm::context::Mode;

/// Longest console line kept, in bytes.  Longer lines are dropped.
pub const MAX_LINE: usize = 96;

pub type ConsoleLine = heapless::String<MAX_LINE>;

const CONSOLE_DEPTH: usize = 4;

/// Console reader thread → main loop.
pub static CONSOLE_CHANNEL: Channel<CriticalSectionRawMutex, ConsoleLine, CONSOLE_DEPTH> =
    Channel::new();

// ── Parsing ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    UnknownCommand(String),
    MissingMode,
    UnknownMode(String),
    MissingArgument(&'static str),
    TrailingInput,
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty line"),
            Self::UnknownCommand(c) => write!(f, "unknown command '{}'", c),
            Self::MissingMode => write!(f, "expected 'alarm' or 'capture'"),
            Self::UnknownMode(m) => write!(f, "unknown mode '{}'", m),
            Self::MissingArgument(what) => write!(f, "missing {}", what),
            Self::TrailingInput => write!(f, "unexpected trailing input"),
        }
    }
}

/// Split off the first word.  The remainder has its leading whitespace
/// removed.
fn next_word(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    let end = input.find(char::is_whitespace).unwrap_or(input.len());
    Some((&input[..end], input[end..].trim_start()))
}

fn parse_mode(input: &str) -> Result<(Mode, &str), ParseError> {
    let (word, rest) = next_word(input).ok_or(ParseError::MissingMode)?;
    let mode = match word {
        "alarm" => Mode::Alarm,
        "capture" => Mode::Capture,
        other => return Err(ParseError::UnknownMode(other.to_owned())),
    };
    Ok((mode, rest))
}

fn expect_end(rest: &str) -> Result<(), ParseError> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(ParseError::TrailingInput)
    }
}

/// Parse one console line.
pub fn parse_line(line: &str) -> Result<AppCommand, ParseError> {
    let (verb, rest) = next_word(line.trim_end()).ok_or(ParseError::Empty)?;

    let session = |command: fn(Mode) -> AppCommand| -> Result<AppCommand, ParseError> {
        let (mode, rest) = parse_mode(rest)?;
        expect_end(rest)?;
        Ok(command(mode))
    };

    match verb {
        "start" => session(AppCommand::Start),
        "stop" => session(AppCommand::Stop),
        "toggle" => session(AppCommand::Toggle),
        "dismiss" => session(AppCommand::DismissPrompt),
        "close" => session(AppCommand::Teardown),
        "status" => session(AppCommand::Status),
        "code" => {
            // An empty submission is a valid (rejected) answer.
            let (mode, attempt) = parse_mode(rest)?;
            Ok(AppCommand::SubmitPasscode(mode, attempt.to_owned()))
        }
        "passcode" => match next_word(rest) {
            Some(("set", "")) => Err(ParseError::MissingArgument("passcode value")),
            Some(("set", value)) => Ok(AppCommand::SetPasscode(value.to_owned())),
            Some(("on", rest)) => expect_end(rest).map(|()| AppCommand::EnablePasscode),
            Some(("off", rest)) => expect_end(rest).map(|()| AppCommand::DisablePasscode),
            _ => Err(ParseError::MissingArgument("'set', 'on' or 'off'")),
        },
        other => Err(ParseError::UnknownCommand(other.to_owned())),
    }
}

/// One-line JSON rendering of a session status.
pub fn render_status(status: &SessionStatus) -> Result<String, serde_json::Error> {
    serde_json::to_string(status)
}

// ── Reader ────────────────────────────────────────────────────

/// Spawn the stdin reader thread.  Lines arriving while the channel is
/// full are dropped with a warning.
pub fn spawn_reader() -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("console".into())
        .stack_size(4096)
        .spawn(|| {
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                match stdin.read_line(&mut line) {
                    Ok(0) => {
                        info!("Console: stdin closed");
                        return;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Console: read failed: {}", e);
                        continue;
                    }
                }
                let mut msg = ConsoleLine::new();
                if msg.push_str(line.trim()).is_err() {
                    warn!("Console: line longer than {} bytes dropped", MAX_LINE);
                    continue;
                }
                if CONSOLE_CHANNEL.try_send(msg).is_err() {
                    warn!("Console: queue full, line dropped");
                }
            }
        })
}

/// Next parsed command, if a line is waiting.  Blank lines are skipped
/// and parse errors are logged.
pub fn next_command() -> Option<AppCommand> {
    while let Ok(line) = CONSOLE_CHANNEL.try_receive() {
        match parse_line(&line) {
            Ok(cmd) => return Some(cmd),
            Err(ParseError::Empty) => {}
            Err(e) => warn!("Console: {}: '{}'", e, line),
        }
    }
    None
}
