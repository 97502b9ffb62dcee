//! Instruction encoding and decoding for the Kestrel instruction set.
//!
//! Every instruction is exactly 64 bits (8 bytes), encoded little-endian:
//! ```text
//! Byte 0:   opcode (u8)
//! Byte 1:   type_tag (u8)
//! Bytes 2-3: arg1 (u16, little-endian)
//! Bytes 4-5: arg2 (u16, little-endian)
//! Bytes 6-7: arg3 (u16, little-endian)
//! ```

use crate::error::DecodeError;
use crate::opcode::Opcode;
use crate::type_tag::TypeTag;

/// Size of one encoded instruction in bytes.
pub const INSTRUCTION_SIZE: usize = 8;

/// A single 64-bit Kestrel instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// The operation to perform.
    pub opcode: Opcode,
    /// Type operand. `TypeTag::None` unless the opcode takes one.
    pub type_tag: TypeTag,
    /// First operand. Meaning depends on opcode.
    pub arg1: u16,
    /// Second operand. Meaning depends on opcode.
    pub arg2: u16,
    /// Third operand. Reserved; always zero in valid chunks.
    pub arg3: u16,
}

impl Instruction {
    /// Create a new instruction.
    pub fn new(opcode: Opcode, type_tag: TypeTag, arg1: u16, arg2: u16, arg3: u16) -> Self {
        Self {
            opcode,
            type_tag,
            arg1,
            arg2,
            arg3,
        }
    }

    /// An instruction with no operands.
    pub fn simple(opcode: Opcode) -> Self {
        Self::new(opcode, TypeTag::None, 0, 0, 0)
    }

    /// An instruction with a single `arg1` operand.
    pub fn with_arg(opcode: Opcode, arg1: u16) -> Self {
        Self::new(opcode, TypeTag::None, arg1, 0, 0)
    }

    /// Encode this instruction to 8 bytes (little-endian).
    pub fn encode(&self) -> [u8; INSTRUCTION_SIZE] {
        let mut bytes = [0u8; INSTRUCTION_SIZE];
        bytes[0] = self.opcode as u8;
        bytes[1] = self.type_tag as u8;
        bytes[2..4].copy_from_slice(&self.arg1.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.arg2.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.arg3.to_le_bytes());
        bytes
    }

    /// Decode 8 bytes into an instruction (little-endian).
    pub fn decode(bytes: [u8; INSTRUCTION_SIZE]) -> Result<Self, DecodeError> {
        let opcode = Opcode::try_from(bytes[0])?;
        let type_tag = TypeTag::try_from(bytes[1])?;
        let arg1 = u16::from_le_bytes([bytes[2], bytes[3]]);
        let arg2 = u16::from_le_bytes([bytes[4], bytes[5]]);
        let arg3 = u16::from_le_bytes([bytes[6], bytes[7]]);

        Ok(Self {
            opcode,
            type_tag,
            arg1,
            arg2,
            arg3,
        })
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.opcode.mnemonic())?;
        if self.type_tag != TypeTag::None {
            write!(f, " {}", self.type_tag)?;
        }
        match self.opcode {
            Opcode::Call | Opcode::CallHost => write!(f, " {} {}", self.arg1, self.arg2),
            Opcode::Const
            | Opcode::LoadLocal
            | Opcode::StoreLocal
            | Opcode::GetGlobal
            | Opcode::SetGlobal
            | Opcode::Jump
            | Opcode::JumpIfFalse => write!(f, " {}", self.arg1),
            _ => Ok(()),
        }
    }
}
