//! LC-3 memory subsystem.
//!
//! 65,536 sixteen-bit words, addressed by any `u16`. The keyboard registers
//! KBSR and KBDR live in the same address space but are backed by the
//! [`Keyboard`] device rather than by plain storage.

use crate::io::keyboard::{Keyboard, KeyboardSender, KBDR, KBSR};
use std::sync::Arc;
use thiserror::Error;

/// The number of addressable words.
pub const MEMORY_SIZE: usize = 1 << 16;

/// LC-3 memory: 65,536 words plus memory-mapped devices.
pub struct Memory {
    cells: Box<[u16]>,
    keyboard: Arc<Keyboard>,
}

impl Memory {
    /// Create a new memory with all cells zeroed and an idle keyboard.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE].into_boxed_slice(),
            keyboard: Arc::new(Keyboard::new()),
        }
    }

    /// Read a word. KBSR and KBDR reads observe the keyboard device.
    #[inline]
    pub fn read(&self, addr: u16) -> u16 {
        match addr {
            KBSR => self.keyboard.status(),
            KBDR => self.keyboard.data(),
            _ => self.cells[addr as usize],
        }
    }

    /// Write a word. KBSR and KBDR writes go to the keyboard device.
    #[inline]
    pub fn write(&mut self, addr: u16, value: u16) {
        match addr {
            KBSR => self.keyboard.write_status(value),
            KBDR => self.keyboard.write_data(value),
            _ => self.cells[addr as usize] = value,
        }
    }

    /// The keyboard device behind KBSR/KBDR.
    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    /// A producer handle for feeding input into the keyboard.
    pub fn keyboard_sender(&self) -> KeyboardSender {
        KeyboardSender::new(Arc::clone(&self.keyboard))
    }

    /// Clear all memory to zeros. The keyboard device is left untouched.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Load a program into memory starting at `origin`.
    pub fn load_program(&mut self, origin: u16, program: &[u16]) -> Result<(), MemoryError> {
        let start = origin as usize;
        if start + program.len() > MEMORY_SIZE {
            return Err(MemoryError::ProgramTooLarge {
                origin,
                len: program.len(),
            });
        }

        for (i, &word) in program.iter().enumerate() {
            self.write((start + i) as u16, word);
        }

        Ok(())
    }

    /// Dump memory contents (for debugging).
    pub fn dump(&self, start: u16, count: usize) -> Vec<(u16, u16)> {
        let end = (start as usize + count).min(MEMORY_SIZE);
        (start as usize..end)
            .map(|i| (i as u16, self.read(i as u16)))
            .collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only count non-zero cells
        let non_zero = self.cells.iter().filter(|cell| **cell != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .field("keyboard", &self.keyboard)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Program does not fit between its origin and the top of memory.
    #[error("program of {len} words at {origin:#06x} runs past 0xFFFF")]
    ProgramTooLarge { origin: u16, len: usize },
}
