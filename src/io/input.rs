//! Asynchronous keyboard input.
//!
//! A background thread reads the host's stdin one byte at a time and feeds
//! each byte into the keyboard mailbox. The mailbox holds a single byte, so
//! the pump holds on to the next one until the program has consumed the
//! previous byte.

use crate::io::keyboard::KeyboardSender;
use std::io::{self, Read};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Byte produced by Ctrl+C when the terminal is in raw mode.
pub const CTRL_C: u8 = 0x03;

/// Byte produced by Enter when the terminal is in raw mode.
const CARRIAGE_RETURN: u8 = b'\r';

/// How long the pump sleeps between delivery attempts while the mailbox is full.
const RETRY_INTERVAL: Duration = Duration::from_millis(1);

/// Why the pump stopped reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    /// The input stream ended.
    Eof,
    /// Ctrl+C was read from a terminal in raw mode.
    Interrupted,
}

/// Feed every byte of `reader` into the keyboard, in order.
///
/// `raw` says the reader is a terminal in raw mode. A [`CTRL_C`] byte then
/// stops the pump instead of being delivered, and Enter (`\r`) is delivered
/// as `\n`.
pub fn pump<R: Read>(reader: R, sender: &KeyboardSender, raw: bool) -> io::Result<PumpExit> {
    for byte in reader.bytes() {
        let mut byte = byte?;
        if raw {
            match byte {
                CTRL_C => return Ok(PumpExit::Interrupted),
                CARRIAGE_RETURN => byte = b'\n',
                _ => {}
            }
        }
        while sender.try_deliver(byte).is_err() {
            thread::sleep(RETRY_INTERVAL);
        }
    }
    Ok(PumpExit::Eof)
}

/// Start a thread that pumps stdin into the keyboard.
///
/// With `raw` set the host no longer turns Ctrl+C into a signal, so the
/// thread restores the terminal and exits the process with status 130 on
/// Ctrl+C.
pub fn spawn_stdin_pump(sender: KeyboardSender, raw: bool) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("lc3-stdin".into())
        .spawn(move || {
            let stdin = io::stdin();
            match pump(stdin.lock(), &sender, raw) {
                Ok(PumpExit::Eof) => tracing::debug!("stdin closed"),
                Ok(PumpExit::Interrupted) => interrupted(),
                Err(e) => tracing::warn!("stdin read failed: {}", e),
            }
        })
}

fn interrupted() -> ! {
    tracing::debug!("interrupted from keyboard");
    #[cfg(feature = "terminal")]
    crate::io::terminal::restore();
    eprintln!();
    std::process::exit(130);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::keyboard::Keyboard;
    use crate::cpu::Memory;

    #[test]
    fn test_pump_delivers_in_order() {
        let mem = Memory::new();
        let sender = mem.keyboard_sender();
        let keyboard: &Keyboard = mem.keyboard();

        std::thread::scope(|s| {
            let producer = s.spawn(|| pump(&b"lc3"[..], &sender, false));

            let received: Vec<u16> = (0..3).map(|_| keyboard.wait_for_key()).collect();
            assert_eq!(received, vec![b'l' as u16, b'c' as u16, b'3' as u16]);

            assert_eq!(producer.join().unwrap().unwrap(), PumpExit::Eof);
        });
    }

    #[test]
    fn test_pump_intercepts_ctrl_c() {
        let mem = Memory::new();
        let sender = mem.keyboard_sender();

        let exit = pump(&[b'a', CTRL_C, b'b'][..], &sender, true).unwrap();

        assert_eq!(exit, PumpExit::Interrupted);
        assert_eq!(mem.keyboard().consume(), Some(b'a' as u16));
        assert_eq!(mem.keyboard().consume(), None);
    }

    #[test]
    fn test_pump_maps_enter_in_raw_mode() {
        let mem = Memory::new();
        let sender = mem.keyboard_sender();
        let keyboard = mem.keyboard();

        std::thread::scope(|s| {
            let producer = s.spawn(|| pump(&b"y\r"[..], &sender, true));

            assert_eq!(keyboard.wait_for_key(), b'y' as u16);
            assert_eq!(keyboard.wait_for_key(), b'\n' as u16);
            assert_eq!(producer.join().unwrap().unwrap(), PumpExit::Eof);
        });
    }

    #[test]
    fn test_pump_keeps_carriage_return_when_cooked() {
        let mem = Memory::new();
        let sender = mem.keyboard_sender();

        pump(&b"\r"[..], &sender, false).unwrap();

        assert_eq!(mem.keyboard().consume(), Some(b'\r' as u16));
    }

    #[test]
    fn test_pump_passes_ctrl_c_through() {
        let mem = Memory::new();
        let sender = mem.keyboard_sender();

        let exit = pump(&[CTRL_C][..], &sender, false).unwrap();

        assert_eq!(exit, PumpExit::Eof);
        assert_eq!(mem.keyboard().consume(), Some(CTRL_C as u16));
    }
}
