//! Polled command input.
//!
//! The capture loop samples exactly one command per iteration, non-blocking.
//! Commands are a three-state enum rather than raw key codes so the session
//! core stays decoupled from any particular input mechanism.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One sampled user command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Persist the in-flight frame.
    Capture,
    /// End the session.
    Cancel,
    /// No pending input.
    Idle,
}

/// A polled source of discrete commands, sampled once per loop iteration.
pub trait CommandSource {
    fn poll(&mut self) -> Command;
}

/// Fixed command sequence, for tests and scripted sessions.
///
/// Reports `Cancel` once the script is exhausted so a session driven by it
/// always terminates.
pub struct ScriptedCommands {
    script: std::vec::IntoIter<Command>,
}

impl ScriptedCommands {
    pub fn new(commands: Vec<Command>) -> Self {
        Self {
            script: commands.into_iter(),
        }
    }
}

impl CommandSource for ScriptedCommands {
    fn poll(&mut self) -> Command {
        self.script.next().unwrap_or(Command::Cancel)
    }
}

/// Command source backed only by a shared cancel flag (e.g. a ctrl-c
/// handler). Used when no terminal input is available.
pub struct FlagCommands {
    cancel: Arc<AtomicBool>,
}

impl FlagCommands {
    pub fn new(cancel: Arc<AtomicBool>) -> Self {
        Self { cancel }
    }
}

impl CommandSource for FlagCommands {
    fn poll(&mut self) -> Command {
        if self.cancel.load(Ordering::Relaxed) {
            Command::Cancel
        } else {
            Command::Idle
        }
    }
}

/// Raw-mode terminal keys: SPACE captures, ESC or `q` cancels.
///
/// Puts stdout into raw mode for its lifetime so keys arrive unbuffered,
/// and reads from an asynchronous stdin handle so `poll` never blocks. A
/// shared cancel flag (set from a ctrl-c handler) also maps to `Cancel`
/// and is checked first.
#[cfg(feature = "terminal-input")]
pub struct TerminalCommands {
    keys: termion::input::Keys<termion::AsyncReader>,
    cancel: Arc<AtomicBool>,
    // Restores the terminal mode on drop.
    _raw: termion::raw::RawTerminal<std::io::Stdout>,
}

#[cfg(feature = "terminal-input")]
impl TerminalCommands {
    /// Fails when stdout is not a tty; callers can fall back to a
    /// flag-only source.
    pub fn new(cancel: Arc<AtomicBool>) -> anyhow::Result<Self> {
        use anyhow::Context;
        use termion::input::TermRead;
        use termion::raw::IntoRawMode;

        let raw = std::io::stdout()
            .into_raw_mode()
            .context("enter raw terminal mode")?;
        Ok(Self {
            keys: termion::async_stdin().keys(),
            cancel,
            _raw: raw,
        })
    }
}

#[cfg(feature = "terminal-input")]
impl CommandSource for TerminalCommands {
    fn poll(&mut self) -> Command {
        if self.cancel.load(Ordering::Relaxed) {
            return Command::Cancel;
        }
        match self.keys.next() {
            Some(Ok(termion::event::Key::Char(' '))) => Command::Capture,
            Some(Ok(termion::event::Key::Esc)) => Command::Cancel,
            Some(Ok(termion::event::Key::Char('q'))) => Command::Cancel,
            _ => Command::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_commands_cancel_when_exhausted() {
        let mut commands = ScriptedCommands::new(vec![Command::Capture, Command::Idle]);
        assert_eq!(commands.poll(), Command::Capture);
        assert_eq!(commands.poll(), Command::Idle);
        assert_eq!(commands.poll(), Command::Cancel);
        assert_eq!(commands.poll(), Command::Cancel);
    }

    #[test]
    fn flag_commands_follow_cancel_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut commands = FlagCommands::new(flag.clone());
        assert_eq!(commands.poll(), Command::Idle);
        flag.store(true, Ordering::Relaxed);
        assert_eq!(commands.poll(), Command::Cancel);
    }
}
