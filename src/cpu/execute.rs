//! CPU execution engine for the LC-3.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use crate::cpu::decode::{self, DecodeError, Instruction, JumpTarget, Operand};
use crate::cpu::memory::MemoryError;
use crate::cpu::registers::LINK_REGISTER;
use crate::cpu::{Memory, Registers};
use crate::obj::ObjImage;
use serde::{Serialize, Deserialize};
use std::io::Write;
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has halted (executed TRAP HALT).
    Halted,
    /// CPU fetched an instruction it cannot execute.
    Faulted,
}

/// An instruction that has just executed, and where it was fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Executed {
    pub pc: u16,
    pub word: u16,
    pub instruction: Instruction,
}

/// The LC-3 machine: registers, memory and run state.
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: CpuState,
    /// Instructions executed so far.
    pub steps: u64,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
}

impl Cpu {
    /// Create a new CPU with zeroed memory and PC at 0x3000.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: CpuState::Running,
            steps: 0,
            last_instr: None,
        }
    }

    /// Reset the CPU to initial state.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.state = CpuState::Running;
        self.steps = 0;
        self.last_instr = None;
    }

    /// Copy an object image into memory at its origin.
    ///
    /// The program counter is not moved; execution always starts at 0x3000.
    pub fn load_image(&mut self, image: &ObjImage) -> Result<(), MemoryError> {
        self.mem.load_program(image.origin(), image.words())?;
        tracing::debug!("loaded {} words at {:#06x}", image.len(), image.origin());
        Ok(())
    }

    /// Execute a single instruction, writing any trap output to `out`.
    ///
    /// Returns the instruction that was executed, or an error. Decode errors
    /// are fatal: the CPU moves to [`CpuState::Faulted`] and will not step
    /// again until reset.
    pub fn step<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<Instruction, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        // Fetch
        let pc = self.regs.advance_pc();
        let word = self.mem.read(pc);

        // Decode
        let instr = match decode::decode(word) {
            Ok(instr) => instr,
            Err(source) => {
                self.state = CpuState::Faulted;
                tracing::error!("decode fault at {:#06x}: {}", pc, source);
                return Err(CpuError::Decode { pc, source });
            }
        };

        // Execute
        self.execute(instr, out)?;

        self.steps += 1;
        self.last_instr = Some(instr);

        Ok(instr)
    }

    /// Run until halt or error.
    ///
    /// Returns the number of instructions executed.
    pub fn run<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<u64, CpuError> {
        let start_steps = self.steps;

        while self.state == CpuState::Running {
            self.step(out)?;
        }

        Ok(self.steps - start_steps)
    }

    /// Run for at most `max_steps` instructions.
    pub fn run_limited<W: Write + ?Sized>(
        &mut self,
        out: &mut W,
        max_steps: u64,
    ) -> Result<u64, CpuError> {
        self.run_traced(out, max_steps, |_, _| Ok(()))
    }

    /// Like [`Cpu::run_limited`], calling `on_step` after every instruction.
    ///
    /// An error from `on_step` stops the run and is returned as is.
    pub fn run_traced<W, F>(
        &mut self,
        out: &mut W,
        max_steps: u64,
        mut on_step: F,
    ) -> Result<u64, CpuError>
    where
        W: Write + ?Sized,
        F: FnMut(&Cpu, Executed) -> Result<(), CpuError>,
    {
        let start_steps = self.steps;
        let limit = self.steps.saturating_add(max_steps);

        while self.state == CpuState::Running && self.steps < limit {
            let pc = self.regs.pc;
            let word = self.mem.read(pc);
            let instruction = self.step(out)?;
            on_step(self, Executed { pc, word, instruction })?;
        }

        Ok(self.steps - start_steps)
    }

    /// Execute a decoded instruction.
    fn execute<W: Write + ?Sized>(&mut self, instr: Instruction, out: &mut W) -> Result<(), CpuError> {
        match instr {
            // ==================== Operate ====================

            Instruction::Add { dr, sr1, operand } => {
                let value = self.regs.get(sr1).wrapping_add(self.operand(operand));
                self.regs.set_with_cond(dr, value);
            }

            Instruction::And { dr, sr1, operand } => {
                let value = self.regs.get(sr1) & self.operand(operand);
                self.regs.set_with_cond(dr, value);
            }

            Instruction::Not { dr, sr } => {
                let value = !self.regs.get(sr);
                self.regs.set_with_cond(dr, value);
            }

            // ==================== Data Movement ====================

            Instruction::Ld { dr, offset } => {
                let value = self.mem.read(self.regs.pc_relative(offset));
                self.regs.set_with_cond(dr, value);
            }

            Instruction::Ldi { dr, offset } => {
                let ptr = self.mem.read(self.regs.pc_relative(offset));
                let value = self.mem.read(ptr);
                self.regs.set_with_cond(dr, value);
            }

            Instruction::Ldr { dr, base, offset } => {
                let addr = self.regs.get(base).wrapping_add(offset);
                let value = self.mem.read(addr);
                self.regs.set_with_cond(dr, value);
            }

            Instruction::Lea { dr, offset } => {
                let value = self.regs.pc_relative(offset);
                self.regs.set_with_cond(dr, value);
            }

            Instruction::St { sr, offset } => {
                let addr = self.regs.pc_relative(offset);
                self.mem.write(addr, self.regs.get(sr));
            }

            Instruction::Sti { sr, offset } => {
                let ptr = self.mem.read(self.regs.pc_relative(offset));
                self.mem.write(ptr, self.regs.get(sr));
            }

            Instruction::Str { sr, base, offset } => {
                let addr = self.regs.get(base).wrapping_add(offset);
                self.mem.write(addr, self.regs.get(sr));
            }

            // ==================== Control ====================

            Instruction::Br { nzp, offset } => {
                if self.regs.cond.matches(nzp) {
                    let target = self.regs.pc_relative(offset);
                    self.regs.jump(target);
                }
            }

            Instruction::Jmp { base } => {
                let target = self.regs.get(base);
                self.regs.jump(target);
            }

            Instruction::Jsr { target } => {
                // Resolve first: JSRR R7 must jump to the old R7.
                let target = match target {
                    JumpTarget::Reg(base) => self.regs.get(base),
                    JumpTarget::Offset(offset) => self.regs.pc_relative(offset),
                };
                self.regs.r[LINK_REGISTER] = self.regs.pc;
                self.regs.jump(target);
            }

            Instruction::Trap { vector } => {
                self.trap(vector, out)?;
            }
        }

        Ok(())
    }

    /// Value of the second ADD/AND operand.
    #[inline]
    fn operand(&self, operand: Operand) -> u16 {
        match operand {
            Operand::Reg(sr2) => self.regs.get(sr2),
            Operand::Imm(imm) => imm,
        }
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("steps", &self.steps)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("decode error at {pc:#06x}: {source}")]
    Decode {
        pc: u16,
        #[source]
        source: DecodeError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
