//! LC-3 register file.
//!
//! The LC-3 has:
//! - R0-R7: eight 16-bit general-purpose registers (R7 holds the return
//!   address after JSR/JSRR by convention)
//! - PC: 16-bit program counter
//! - COND: 3-bit condition register holding exactly one of N, Z or P

use serde::{Serialize, Deserialize};

/// Address the program counter points at when the machine starts.
pub const PC_START: u16 = 0x3000;

/// Index of the register that receives the subroutine return address.
pub const LINK_REGISTER: usize = 7;

/// The condition register.
///
/// The discriminants match the `nzp` bit positions used by BR, so a branch
/// test is a single bitwise AND.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    /// Last written value had bit 15 clear and was nonzero.
    Positive = 0b001,
    /// Last written value was zero.
    Zero = 0b010,
    /// Last written value had bit 15 set.
    Negative = 0b100,
}

impl Condition {
    /// All three conditions, in `nzp` bit order from low to high.
    pub const ALL: [Condition; 3] = [Condition::Positive, Condition::Zero, Condition::Negative];

    /// Classify a 16-bit value by its two's-complement sign.
    #[inline]
    pub const fn from_value(value: u16) -> Self {
        if value == 0 {
            Condition::Zero
        } else if value & 0x8000 != 0 {
            Condition::Negative
        } else {
            Condition::Positive
        }
    }

    /// The condition as its `nzp` bit.
    #[inline]
    pub const fn bits(self) -> u16 {
        self as u16
    }

    /// True if any bit of the BR flag field overlaps this condition.
    #[inline]
    pub const fn matches(self, nzp: u16) -> bool {
        nzp & self.bits() != 0
    }
}

impl Default for Condition {
    fn default() -> Self {
        Condition::Zero
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = match self {
            Condition::Positive => 'P',
            Condition::Zero => 'Z',
            Condition::Negative => 'N',
        };
        write!(f, "{}", c)
    }
}

/// The LC-3 register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// R0-R7
    pub r: [u16; 8],

    /// Program counter: address of the next instruction to fetch
    pub pc: u16,

    /// Condition register, recomputed by every condition-setting write
    pub cond: Condition,
}

impl Registers {
    /// Create a register file in the power-on state.
    pub fn new() -> Self {
        Self {
            r: [0; 8],
            pc: PC_START,
            cond: Condition::default(),
        }
    }

    /// Reset all registers to the power-on state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Read a general-purpose register. Only the low 3 bits of `index` are used.
    #[inline]
    pub fn get(&self, index: u16) -> u16 {
        self.r[(index & 0b111) as usize]
    }

    /// Write a general-purpose register without touching the condition.
    #[inline]
    pub fn set(&mut self, index: u16, value: u16) {
        self.r[(index & 0b111) as usize] = value;
    }

    /// Write a general-purpose register and recompute the condition from it.
    #[inline]
    pub fn set_with_cond(&mut self, index: u16, value: u16) {
        self.set(index, value);
        self.cond = Condition::from_value(value);
    }

    /// Increment the program counter by 1, wrapping at 0xFFFF.
    /// Returns the old value.
    pub fn advance_pc(&mut self) -> u16 {
        let old = self.pc;
        self.pc = self.pc.wrapping_add(1);
        old
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: u16) {
        self.pc = addr;
    }

    /// Address relative to the (already incremented) program counter.
    #[inline]
    pub fn pc_relative(&self, offset: u16) -> u16 {
        self.pc.wrapping_add(offset)
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
