//! Host-side devices and collaborators.
//!
//! This module provides:
//! - The memory-mapped keyboard mailbox shared with the input producer
//! - A stdin pump thread that acts as that producer
//! - A console writer for program output
//! - Terminal raw mode handling (feature `terminal`)

pub mod keyboard;
pub mod input;
pub mod console;

#[cfg(feature = "terminal")]
pub mod terminal;

pub use keyboard::{Keyboard, KeyboardBusy, KeyboardSender, KBDR, KBSR};
pub use input::{spawn_stdin_pump, PumpExit};
pub use console::ConsoleWriter;

#[cfg(feature = "terminal")]
pub use terminal::RawModeGuard;
