//! Terminal raw mode for interactive programs.
//!
//! LC-3 programs expect every keystroke to reach GETC immediately and
//! without the host echoing it, so the terminal is switched out of line
//! buffering for the duration of a run.

use crossterm::terminal;
use std::io::{self, IsTerminal};

/// Keeps the terminal in raw mode until dropped.
#[derive(Debug)]
pub struct RawModeGuard {
    _private: (),
}

impl RawModeGuard {
    /// Enable raw mode if stdin is an interactive terminal.
    ///
    /// Returns `Ok(None)` when stdin is redirected; there is nothing to
    /// configure in that case.
    pub fn enable() -> io::Result<Option<Self>> {
        if !io::stdin().is_terminal() {
            tracing::debug!("stdin is not a terminal, leaving it as is");
            return Ok(None);
        }
        terminal::enable_raw_mode()?;
        tracing::debug!("terminal raw mode enabled");
        Ok(Some(Self { _private: () }))
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        restore();
    }
}

/// True while the terminal is in raw mode.
pub fn is_raw() -> bool {
    terminal::is_raw_mode_enabled().unwrap_or(false)
}

/// Leave raw mode if it is active. Safe to call more than once.
pub fn restore() {
    if !is_raw() {
        return;
    }
    match terminal::disable_raw_mode() {
        Ok(()) => tracing::debug!("terminal raw mode disabled"),
        Err(e) => tracing::warn!("failed to restore terminal: {}", e),
    }
}
