//! # LC-3 Emulator
//!
//! An instruction-level emulator of the LC-3, the 16-bit educational
//! computer from Patt and Patel's *Introduction to Computing Systems*.
//!
//! It runs assembled object images and is meant for watching programs
//! execute one instruction at a time, not for speed.

pub mod bits;
pub mod cpu;
pub mod io;
pub mod obj;

// Re-export commonly used types
pub use bits::{extract_field, sign_extend};
pub use cpu::{Cpu, CpuState, CpuError, Executed, Condition, Memory, Registers, Instruction, DecodeError};
pub use obj::{ObjImage, LoadError, load_obj};
