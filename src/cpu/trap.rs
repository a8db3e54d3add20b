//! Trap service routines.
//!
//! The LC-3 TRAP instruction calls fixed operating-system routines for
//! character I/O and for stopping the machine. They are implemented natively
//! here instead of as LC-3 code in a system image.

use crate::cpu::decode::TrapVector;
use crate::cpu::execute::{Cpu, CpuError, CpuState};
use crate::cpu::memory::MEMORY_SIZE;
use std::io::Write;

/// Text written by the IN trap before it waits for a key.
pub const IN_PROMPT: &str = "Enter a character: ";

impl Cpu {
    /// Execute the service routine for `vector`.
    pub(crate) fn trap<W: Write + ?Sized>(
        &mut self,
        vector: TrapVector,
        out: &mut W,
    ) -> Result<(), CpuError> {
        match vector {
            TrapVector::Getc => {
                let key = self.mem.keyboard().wait_for_key();
                self.regs.set(0, key);
            }

            TrapVector::Out => {
                let byte = self.regs.get(0) as u8;
                out.write_all(&[byte])?;
                out.flush()?;
            }

            TrapVector::Puts => {
                let text: Vec<u8> = self.string_at(self.regs.get(0))
                    .map(|word| word as u8)
                    .collect();
                out.write_all(&text)?;
                out.flush()?;
            }

            TrapVector::In => {
                out.write_all(IN_PROMPT.as_bytes())?;
                out.flush()?;

                let key = self.mem.keyboard().wait_for_key();
                self.regs.set(0, key);

                out.write_all(&[key as u8])?;
                out.flush()?;
            }

            TrapVector::Putsp => {
                let mut text = Vec::new();
                for word in self.string_at(self.regs.get(0)) {
                    text.push(word as u8);
                    let high = (word >> 8) as u8;
                    if high != 0 {
                        text.push(high);
                    }
                }
                out.write_all(&text)?;
                out.flush()?;
            }

            TrapVector::Halt => {
                self.state = CpuState::Halted;
                tracing::info!("halted after {} instructions", self.steps + 1);
            }

            TrapVector::Unknown(code) => {
                tracing::warn!(
                    "ignoring unknown trap vector {:#04x} at {:#06x}",
                    code,
                    self.regs.pc.wrapping_sub(1)
                );
            }
        }

        Ok(())
    }

    /// Words of a zero-terminated string starting at `addr`, terminator
    /// excluded.
    ///
    /// Addresses wrap at the top of memory; a string is never longer than
    /// memory itself.
    fn string_at(&self, addr: u16) -> impl Iterator<Item = u16> + '_ {
        (0..MEMORY_SIZE)
            .map(move |i| self.mem.read(addr.wrapping_add(i as u16)))
            .take_while(|word| *word != 0)
    }
}
