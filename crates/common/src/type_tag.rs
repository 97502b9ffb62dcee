//! Type tags for Kestrel values.
//!
//! The same byte values are used for constant-pool entries, the `IsType`
//! instruction operand and the C API type checks.

use crate::error::DecodeError;

/// Identifies the type of a value or instruction context.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// No type / not applicable.
    None = 0x00,
    /// Signed 64-bit integer.
    I64 = 0x01,
    /// IEEE 754 64-bit float.
    F64 = 0x02,
    /// Boolean.
    Bool = 0x03,
    /// The unit value.
    Null = 0x04,
    /// Length-delimited byte string.
    Str = 0x05,
}

/// All valid type tags, in definition order.
pub const ALL_TYPE_TAGS: [TypeTag; 6] = [
    TypeTag::None,
    TypeTag::I64,
    TypeTag::F64,
    TypeTag::Bool,
    TypeTag::Null,
    TypeTag::Str,
];

impl TryFrom<u8> for TypeTag {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(TypeTag::None),
            0x01 => Ok(TypeTag::I64),
            0x02 => Ok(TypeTag::F64),
            0x03 => Ok(TypeTag::Bool),
            0x04 => Ok(TypeTag::Null),
            0x05 => Ok(TypeTag::Str),
            0x06..=0xFF => Err(DecodeError::ReservedTypeTag(value)),
        }
    }
}

impl TypeTag {
    /// Returns the display name for this type tag.
    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::None => "none",
            TypeTag::I64 => "i64",
            TypeTag::F64 => "f64",
            TypeTag::Bool => "bool",
            TypeTag::Null => "null",
            TypeTag::Str => "string",
        }
    }

    /// Returns true if values can carry this tag (everything but `None`).
    pub fn is_value_type(&self) -> bool {
        !matches!(self, TypeTag::None)
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
