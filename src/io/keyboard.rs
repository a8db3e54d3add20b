//! The memory-mapped keyboard device.
//!
//! Two registers, KBSR (status) and KBDR (data), form a single-slot mailbox
//! between the input producer and the execution thread. Bit 15 of KBSR is
//! the ready flag: the producer sets it after writing KBDR, and the trap
//! handler that consumes the byte clears it.

use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Keyboard status register address.
pub const KBSR: u16 = 0xFE00;

/// Keyboard data register address.
pub const KBDR: u16 = 0xFE02;

/// KBSR bit that signals unconsumed data in KBDR.
pub const READY_BIT: u16 = 0x8000;

/// Keyboard device registers.
#[derive(Debug, Default)]
pub struct Keyboard {
    status: AtomicU16,
    data: AtomicU16,
    /// Held by the producer that is filling the slot.
    delivering: AtomicBool,
}

impl Keyboard {
    /// Create a keyboard with no pending input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of KBSR.
    #[inline]
    pub fn status(&self) -> u16 {
        self.status.load(Ordering::Acquire)
    }

    /// Current value of KBDR.
    #[inline]
    pub fn data(&self) -> u16 {
        self.data.load(Ordering::Acquire)
    }

    /// True while KBDR holds a byte nobody has consumed.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.status() & READY_BIT != 0
    }

    /// Program store to KBSR.
    pub(crate) fn write_status(&self, value: u16) {
        self.status.store(value, Ordering::Release);
    }

    /// Program store to KBDR.
    pub(crate) fn write_data(&self, value: u16) {
        self.data.store(value, Ordering::Release);
    }

    /// Take the pending byte, if any, and clear the ready bit.
    ///
    /// Only the execution thread consumes, so the ready bit cannot be
    /// cleared by anybody else between the check and the read.
    pub fn consume(&self) -> Option<u16> {
        if !self.is_ready() {
            return None;
        }
        let value = self.data();
        self.status.fetch_and(!READY_BIT, Ordering::Release);
        tracing::trace!(value, "keyboard byte consumed");
        Some(value)
    }

    /// Poll until a byte is available, then consume it.
    ///
    /// Blocks indefinitely, like the hardware polling loop it models.
    pub fn wait_for_key(&self) -> u16 {
        loop {
            if let Some(value) = self.consume() {
                return value;
            }
            std::hint::spin_loop();
            std::thread::yield_now();
        }
    }

    /// Offer a byte as a producer. Never blocks.
    ///
    /// Producers take turns through `delivering`, so with the ready bit clear
    /// only the claim holder can fill the slot.
    fn deliver(&self, byte: u8) -> Result<(), KeyboardBusy> {
        if self
            .delivering
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(KeyboardBusy(byte));
        }

        let result = if self.is_ready() {
            Err(KeyboardBusy(byte))
        } else {
            self.data.store(byte as u16, Ordering::Release);
            self.status.fetch_or(READY_BIT, Ordering::Release);
            tracing::trace!(byte, "keyboard byte delivered");
            Ok(())
        };

        self.delivering.store(false, Ordering::Release);
        result
    }
}

/// Producer-side handle to a [`Keyboard`].
///
/// This is the only write access an input producer gets to the machine.
/// Any number of senders may share one keyboard; each byte reported as
/// delivered is consumed exactly once.
#[derive(Debug, Clone)]
pub struct KeyboardSender {
    keyboard: Arc<Keyboard>,
}

impl KeyboardSender {
    pub(crate) fn new(keyboard: Arc<Keyboard>) -> Self {
        Self { keyboard }
    }

    /// Latch `byte` into KBDR and raise the ready bit.
    ///
    /// Fails with [`KeyboardBusy`] if the previous byte is still unconsumed;
    /// the caller decides whether to retry.
    pub fn try_deliver(&self, byte: u8) -> Result<(), KeyboardBusy> {
        self.keyboard.deliver(byte)
    }
}

/// The mailbox still holds an unconsumed byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("keyboard busy, byte {0:#04x} not delivered")]
pub struct KeyboardBusy(pub u8);
