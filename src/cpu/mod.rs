//! CPU emulation for the LC-3.
//!
//! This module implements the complete LC-3 user-level architecture:
//! - 65,536 sixteen-bit memory words with memory-mapped keyboard registers
//! - 8 general-purpose registers, PC and the N/Z/P condition register
//! - 14 executable opcodes plus the TRAP service routines

pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;
pub mod trap;

pub use memory::{Memory, MemoryError};
pub use registers::{Condition, Registers, PC_START};
pub use decode::{Instruction, Opcode, TrapVector, DecodeError};
pub use execute::{Cpu, CpuError, CpuState, Executed};
