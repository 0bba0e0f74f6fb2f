//! Fixed-width bytecode instruction record.
//!
//! The layout must match what the executing VM decodes: one opcode byte,
//! a byte holding the destination register in the low nibble and the source
//! register in the high nibble, a signed 16-bit offset and a signed 32-bit
//! immediate, little endian, 8 bytes total.

use core::mem::{align_of, size_of};

use static_assertions::const_assert_eq;

/// Size of one encoded instruction in bytes.
pub const INSTRUCTION_SIZE: usize = 8;

// Instruction classes (low three opcode bits).
pub const CLASS_LD: u8 = 0x00;
pub const CLASS_LDX: u8 = 0x01;
pub const CLASS_ST: u8 = 0x02;
pub const CLASS_STX: u8 = 0x03;
pub const CLASS_ALU: u8 = 0x04;
pub const CLASS_JMP: u8 = 0x05;
pub const CLASS_JMP32: u8 = 0x06;
pub const CLASS_ALU64: u8 = 0x07;

// Operand source bit.
pub const SRC_IMM: u8 = 0x00;
pub const SRC_REG: u8 = 0x08;

pub const OP_LDDW: u8 = CLASS_LD | 0x18;
pub const OP_MOV64_IMM: u8 = CLASS_ALU64 | SRC_IMM | 0xb0;
pub const OP_MOV64_REG: u8 = CLASS_ALU64 | SRC_REG | 0xb0;
pub const OP_ADD64_IMM: u8 = CLASS_ALU64 | SRC_IMM;
pub const OP_JA: u8 = CLASS_JMP;
pub const OP_CALL: u8 = CLASS_JMP | 0x80;
pub const OP_EXIT: u8 = CLASS_JMP | 0x90;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub opcode: u8,
    regs: u8,
    pub offset: i16,
    pub imm: i32,
}

const_assert_eq!(size_of::<Instruction>(), INSTRUCTION_SIZE);
const_assert_eq!(align_of::<Instruction>(), 4);

impl Instruction {
    /// Register numbers are truncated to four bits.
    pub const fn new(opcode: u8, dst: u8, src: u8, offset: i16, imm: i32) -> Self {
        Self {
            opcode,
            regs: (dst & 0x0f) | ((src & 0x0f) << 4),
            offset,
            imm,
        }
    }

    pub const fn exit() -> Self {
        Self::new(OP_EXIT, 0, 0, 0, 0)
    }

    pub const fn dst(&self) -> u8 {
        self.regs & 0x0f
    }

    pub const fn src(&self) -> u8 {
        self.regs >> 4
    }

    pub const fn class(&self) -> u8 {
        self.opcode & 0x07
    }

    pub fn to_le_bytes(&self) -> [u8; INSTRUCTION_SIZE] {
        let mut out = [0u8; INSTRUCTION_SIZE];
        out[0] = self.opcode;
        out[1] = self.regs;
        out[2..4].copy_from_slice(&self.offset.to_le_bytes());
        out[4..8].copy_from_slice(&self.imm.to_le_bytes());
        out
    }

    pub fn from_le_bytes(raw: [u8; INSTRUCTION_SIZE]) -> Self {
        Self {
            opcode: raw[0],
            regs: raw[1],
            offset: i16::from_le_bytes([raw[2], raw[3]]),
            imm: i32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]),
        }
    }
}
