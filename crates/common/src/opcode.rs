//! Opcode definitions for the Kestrel instruction set.

use crate::error::DecodeError;

/// Identifies the operation to perform.
///
/// The `#[repr(u8)]` attribute gives each variant its stable byte value in
/// the encoded instruction stream.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Stack & constants
    /// No operation.
    Nop = 0x01,
    /// Push constant `arg1` from the constant pool.
    Const = 0x02,
    /// Discard the top value.
    Pop = 0x03,
    /// Push a copy of the top value.
    Dup = 0x04,

    // Locals & globals
    /// Push local slot `arg1`. Arguments occupy the first `arity` slots.
    LoadLocal = 0x05,
    /// Pop into local slot `arg1`.
    StoreLocal = 0x06,
    /// Push the global named by string constant `arg1`.
    GetGlobal = 0x07,
    /// Pop into the global named by string constant `arg1`.
    SetGlobal = 0x08,

    // Arithmetic
    /// Pop two values, push their sum.
    Add = 0x10,
    /// Pop two values, push (second_popped - first_popped).
    Sub = 0x11,
    /// Pop two values, push their product.
    Mul = 0x12,
    /// Pop two values, push quotient. Integer division by zero traps.
    Div = 0x13,
    /// Pop two values, push remainder. I64 only.
    Mod = 0x14,
    /// Pop one value, push its negation.
    Neg = 0x15,

    // Comparison
    /// Pop two values, push Bool (equal).
    Eq = 0x20,
    /// Pop two values, push Bool (not equal).
    Neq = 0x21,
    /// Pop two, push Bool (second_popped < first_popped).
    Lt = 0x22,
    /// Pop two, push Bool (second_popped > first_popped).
    Gt = 0x23,
    /// Pop two, push Bool (second_popped <= first_popped).
    Lte = 0x24,
    /// Pop two, push Bool (second_popped >= first_popped).
    Gte = 0x25,

    // Logic
    /// Logical AND of two Bools.
    And = 0x30,
    /// Logical OR of two Bools.
    Or = 0x31,
    /// Logical NOT of a Bool.
    Not = 0x32,

    // Control flow
    /// Continue at instruction `arg1`.
    Jump = 0x40,
    /// Pop a Bool; continue at instruction `arg1` if it is false.
    JumpIfFalse = 0x41,

    // Calls
    /// Call function `arg1` of the chunk with `arg2` arguments.
    Call = 0x50,
    /// Call the host function named by string constant `arg1` with `arg2` arguments.
    CallHost = 0x51,
    /// Return the top value to the caller.
    Ret = 0x52,

    // Values
    /// Push Bool: does the top value carry `type_tag`? The value stays.
    IsType = 0x60,
    /// Pop two strings, push their concatenation.
    Concat = 0x61,
}

/// All valid opcodes, in definition order. Useful for exhaustive testing.
pub const ALL_OPCODES: [Opcode; 30] = [
    Opcode::Nop,
    Opcode::Const,
    Opcode::Pop,
    Opcode::Dup,
    Opcode::LoadLocal,
    Opcode::StoreLocal,
    Opcode::GetGlobal,
    Opcode::SetGlobal,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::Div,
    Opcode::Mod,
    Opcode::Neg,
    Opcode::Eq,
    Opcode::Neq,
    Opcode::Lt,
    Opcode::Gt,
    Opcode::Lte,
    Opcode::Gte,
    Opcode::And,
    Opcode::Or,
    Opcode::Not,
    Opcode::Jump,
    Opcode::JumpIfFalse,
    Opcode::Call,
    Opcode::CallHost,
    Opcode::Ret,
    Opcode::IsType,
    Opcode::Concat,
];

impl TryFrom<u8> for Opcode {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Err(DecodeError::IllegalOpcode),

            0x01 => Ok(Opcode::Nop),
            0x02 => Ok(Opcode::Const),
            0x03 => Ok(Opcode::Pop),
            0x04 => Ok(Opcode::Dup),

            0x05 => Ok(Opcode::LoadLocal),
            0x06 => Ok(Opcode::StoreLocal),
            0x07 => Ok(Opcode::GetGlobal),
            0x08 => Ok(Opcode::SetGlobal),

            0x10 => Ok(Opcode::Add),
            0x11 => Ok(Opcode::Sub),
            0x12 => Ok(Opcode::Mul),
            0x13 => Ok(Opcode::Div),
            0x14 => Ok(Opcode::Mod),
            0x15 => Ok(Opcode::Neg),

            0x20 => Ok(Opcode::Eq),
            0x21 => Ok(Opcode::Neq),
            0x22 => Ok(Opcode::Lt),
            0x23 => Ok(Opcode::Gt),
            0x24 => Ok(Opcode::Lte),
            0x25 => Ok(Opcode::Gte),

            0x30 => Ok(Opcode::And),
            0x31 => Ok(Opcode::Or),
            0x32 => Ok(Opcode::Not),

            0x40 => Ok(Opcode::Jump),
            0x41 => Ok(Opcode::JumpIfFalse),

            0x50 => Ok(Opcode::Call),
            0x51 => Ok(Opcode::CallHost),
            0x52 => Ok(Opcode::Ret),

            0x60 => Ok(Opcode::IsType),
            0x61 => Ok(Opcode::Concat),

            other => Err(DecodeError::InvalidOpcode(other)),
        }
    }
}

impl Opcode {
    /// Returns the assembly mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Nop => "NOP",
            Opcode::Const => "CONST",
            Opcode::Pop => "POP",
            Opcode::Dup => "DUP",
            Opcode::LoadLocal => "LOAD_LOCAL",
            Opcode::StoreLocal => "STORE_LOCAL",
            Opcode::GetGlobal => "GET_GLOBAL",
            Opcode::SetGlobal => "SET_GLOBAL",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Neg => "NEG",
            Opcode::Eq => "EQ",
            Opcode::Neq => "NEQ",
            Opcode::Lt => "LT",
            Opcode::Gt => "GT",
            Opcode::Lte => "LTE",
            Opcode::Gte => "GTE",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Not => "NOT",
            Opcode::Jump => "JUMP",
            Opcode::JumpIfFalse => "JUMP_IF_FALSE",
            Opcode::Call => "CALL",
            Opcode::CallHost => "CALL_HOST",
            Opcode::Ret => "RET",
            Opcode::IsType => "IS_TYPE",
            Opcode::Concat => "CONCAT",
        }
    }

    /// True for instructions after which execution never falls through.
    pub fn is_terminator(&self) -> bool {
        matches!(self, Opcode::Jump | Opcode::Ret)
    }
}
