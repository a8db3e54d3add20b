//! Instruction decoder for the LC-3.
//!
//! Every instruction is one 16-bit word. Bits 15-12 select one of sixteen
//! opcodes; the remaining twelve bits are opcode-specific operand fields.
//! Two opcodes (RTI and the reserved 0b1101) are not supported and fail to
//! decode.

use crate::bits::{extract_field, sign_extend};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The 4-bit opcode field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    Br = 0b0000,
    Add = 0b0001,
    Ld = 0b0010,
    St = 0b0011,
    Jsr = 0b0100,
    And = 0b0101,
    Ldr = 0b0110,
    Str = 0b0111,
    Rti = 0b1000,
    Not = 0b1001,
    Ldi = 0b1010,
    Sti = 0b1011,
    Jmp = 0b1100,
    Res = 0b1101,
    Lea = 0b1110,
    Trap = 0b1111,
}

impl Opcode {
    /// All opcodes, indexed by their encoding.
    pub const ALL: [Opcode; 16] = [
        Opcode::Br,
        Opcode::Add,
        Opcode::Ld,
        Opcode::St,
        Opcode::Jsr,
        Opcode::And,
        Opcode::Ldr,
        Opcode::Str,
        Opcode::Rti,
        Opcode::Not,
        Opcode::Ldi,
        Opcode::Sti,
        Opcode::Jmp,
        Opcode::Res,
        Opcode::Lea,
        Opcode::Trap,
    ];

    /// Opcode of an instruction word (bits 15-12).
    #[inline]
    pub fn of(word: u16) -> Self {
        Self::ALL[extract_field(word, 15, 12) as usize]
    }

    /// True for the two opcodes that have no defined behavior here.
    pub fn is_reserved(self) -> bool {
        matches!(self, Opcode::Rti | Opcode::Res)
    }
}

/// Trap service routines, keyed by the 8-bit trap vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrapVector {
    /// Read one character into R0, no echo
    Getc,
    /// Write the low byte of R0
    Out,
    /// Write a one-character-per-word string at R0
    Puts,
    /// Prompt, read one character into R0, echo it
    In,
    /// Write a two-characters-per-word string at R0
    Putsp,
    /// Stop the machine
    Halt,
    /// Any other vector; has no service routine and does nothing
    Unknown(u8),
}

impl TrapVector {
    /// Look up a trap vector.
    pub fn from_u8(vector: u8) -> Self {
        match vector {
            0x20 => TrapVector::Getc,
            0x21 => TrapVector::Out,
            0x22 => TrapVector::Puts,
            0x23 => TrapVector::In,
            0x24 => TrapVector::Putsp,
            0x25 => TrapVector::Halt,
            other => TrapVector::Unknown(other),
        }
    }

    /// The 8-bit vector as it appears in the instruction word.
    pub fn code(self) -> u8 {
        match self {
            TrapVector::Getc => 0x20,
            TrapVector::Out => 0x21,
            TrapVector::Puts => 0x22,
            TrapVector::In => 0x23,
            TrapVector::Putsp => 0x24,
            TrapVector::Halt => 0x25,
            TrapVector::Unknown(vector) => vector,
        }
    }
}

/// Second operand of ADD and AND.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    /// Register SR2 (bit 5 clear)
    Reg(u16),
    /// Sign-extended imm5 (bit 5 set)
    Imm(u16),
}

/// Target of JSR/JSRR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpTarget {
    /// JSRR: absolute address in a base register (bit 11 clear)
    Reg(u16),
    /// JSR: sign-extended PCoffset11 (bit 11 set)
    Offset(u16),
}

/// Decoded LC-3 instruction.
///
/// Register fields hold 3-bit indices. Offsets and immediates are already
/// sign-extended to 16 bits, so handlers only ever add them with wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    // ==================== Operate ====================

    /// DR := SR1 + operand
    Add { dr: u16, sr1: u16, operand: Operand },

    /// DR := SR1 & operand
    And { dr: u16, sr1: u16, operand: Operand },

    /// DR := !SR
    Not { dr: u16, sr: u16 },

    // ==================== Data Movement ====================

    /// DR := mem[PC + offset]
    Ld { dr: u16, offset: u16 },

    /// DR := mem[mem[PC + offset]]
    Ldi { dr: u16, offset: u16 },

    /// DR := mem[BaseR + offset]
    Ldr { dr: u16, base: u16, offset: u16 },

    /// DR := PC + offset
    Lea { dr: u16, offset: u16 },

    /// mem[PC + offset] := SR
    St { sr: u16, offset: u16 },

    /// mem[mem[PC + offset]] := SR
    Sti { sr: u16, offset: u16 },

    /// mem[BaseR + offset] := SR
    Str { sr: u16, base: u16, offset: u16 },

    // ==================== Control ====================

    /// If any of the `nzp` bits matches COND: PC := PC + offset
    Br { nzp: u16, offset: u16 },

    /// PC := BaseR (RET when BaseR is R7)
    Jmp { base: u16 },

    /// R7 := PC, then jump
    Jsr { target: JumpTarget },

    /// Invoke a trap service routine
    Trap { vector: TrapVector },
}

impl Instruction {
    /// The opcode this instruction encodes to.
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Add { .. } => Opcode::Add,
            Instruction::And { .. } => Opcode::And,
            Instruction::Not { .. } => Opcode::Not,
            Instruction::Ld { .. } => Opcode::Ld,
            Instruction::Ldi { .. } => Opcode::Ldi,
            Instruction::Ldr { .. } => Opcode::Ldr,
            Instruction::Lea { .. } => Opcode::Lea,
            Instruction::St { .. } => Opcode::St,
            Instruction::Sti { .. } => Opcode::Sti,
            Instruction::Str { .. } => Opcode::Str,
            Instruction::Br { .. } => Opcode::Br,
            Instruction::Jmp { .. } => Opcode::Jmp,
            Instruction::Jsr { .. } => Opcode::Jsr,
            Instruction::Trap { .. } => Opcode::Trap,
        }
    }
}

/// Decode a 16-bit instruction word.
///
/// Field layout:
/// - Bits 15-12: opcode
/// - Bits 11-9: DR / SR / `nzp`
/// - Bits 8-6: SR1 / BaseR
/// - Bits 8-0, 10-0, 5-0, 4-0: PC-relative offsets, base offset, imm5
/// - Bits 7-0: trap vector
pub fn decode(word: u16) -> Result<Instruction, DecodeError> {
    let opcode = Opcode::of(word);

    let r_high = extract_field(word, 11, 9);
    let r_mid = extract_field(word, 8, 6);
    let offset9 = sign_extend(extract_field(word, 8, 0), 9);
    let offset6 = sign_extend(extract_field(word, 5, 0), 6);

    let operand = || {
        if extract_field(word, 5, 5) == 1 {
            Operand::Imm(sign_extend(extract_field(word, 4, 0), 5))
        } else {
            Operand::Reg(extract_field(word, 2, 0))
        }
    };

    let instruction = match opcode {
        Opcode::Br => Instruction::Br { nzp: r_high, offset: offset9 },
        Opcode::Add => Instruction::Add { dr: r_high, sr1: r_mid, operand: operand() },
        Opcode::And => Instruction::And { dr: r_high, sr1: r_mid, operand: operand() },
        Opcode::Not => Instruction::Not { dr: r_high, sr: r_mid },
        Opcode::Ld => Instruction::Ld { dr: r_high, offset: offset9 },
        Opcode::Ldi => Instruction::Ldi { dr: r_high, offset: offset9 },
        Opcode::Ldr => Instruction::Ldr { dr: r_high, base: r_mid, offset: offset6 },
        Opcode::Lea => Instruction::Lea { dr: r_high, offset: offset9 },
        Opcode::St => Instruction::St { sr: r_high, offset: offset9 },
        Opcode::Sti => Instruction::Sti { sr: r_high, offset: offset9 },
        Opcode::Str => Instruction::Str { sr: r_high, base: r_mid, offset: offset6 },
        Opcode::Jmp => Instruction::Jmp { base: r_mid },
        Opcode::Jsr => {
            let target = if extract_field(word, 11, 11) == 1 {
                JumpTarget::Offset(sign_extend(extract_field(word, 10, 0), 11))
            } else {
                JumpTarget::Reg(r_mid)
            };
            Instruction::Jsr { target }
        }
        Opcode::Trap => {
            let vector = TrapVector::from_u8(extract_field(word, 7, 0) as u8);
            Instruction::Trap { vector }
        }
        Opcode::Rti | Opcode::Res => return Err(DecodeError::Reserved { opcode, word }),
    };

    Ok(instruction)
}

/// Encode an instruction back to a 16-bit word.
///
/// Offsets and immediates are truncated to their field widths, so any value
/// produced by [`decode`] encodes back to the word it came from (modulo
/// ignored bits such as JMP's unused fields).
pub fn encode(instr: &Instruction) -> u16 {
    const fn field(value: u16, width: u32, shift: u32) -> u16 {
        (value & ((1 << width) - 1)) << shift
    }

    let op = (instr.opcode() as u16) << 12;
    let operand_bits = |operand: &Operand| match *operand {
        Operand::Reg(sr2) => field(sr2, 3, 0),
        Operand::Imm(imm) => 1 << 5 | field(imm, 5, 0),
    };

    op | match instr {
        Instruction::Add { dr, sr1, operand } | Instruction::And { dr, sr1, operand } => {
            field(*dr, 3, 9) | field(*sr1, 3, 6) | operand_bits(operand)
        }
        Instruction::Not { dr, sr } => field(*dr, 3, 9) | field(*sr, 3, 6) | 0x3F,
        Instruction::Ld { dr, offset }
        | Instruction::Ldi { dr, offset }
        | Instruction::Lea { dr, offset } => field(*dr, 3, 9) | field(*offset, 9, 0),
        Instruction::St { sr, offset } | Instruction::Sti { sr, offset } => {
            field(*sr, 3, 9) | field(*offset, 9, 0)
        }
        Instruction::Ldr { dr, base, offset } => {
            field(*dr, 3, 9) | field(*base, 3, 6) | field(*offset, 6, 0)
        }
        Instruction::Str { sr, base, offset } => {
            field(*sr, 3, 9) | field(*base, 3, 6) | field(*offset, 6, 0)
        }
        Instruction::Br { nzp, offset } => field(*nzp, 3, 9) | field(*offset, 9, 0),
        Instruction::Jmp { base } => field(*base, 3, 6),
        Instruction::Jsr { target: JumpTarget::Reg(base) } => field(*base, 3, 6),
        Instruction::Jsr { target: JumpTarget::Offset(offset) } => 1 << 11 | field(*offset, 11, 0),
        Instruction::Trap { vector } => vector.code() as u16,
    }
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("reserved opcode {opcode:?} in instruction {word:#06x}")]
    Reserved { opcode: Opcode, word: u16 },
}
