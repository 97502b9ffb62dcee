//! Decode errors for Kestrel chunks.

use thiserror::Error;

/// Errors that occur while decoding a chunk or a single instruction.
///
/// A `DecodeError` means the bytes do not describe a chunk at all; a chunk
/// that decodes but is semantically wrong is reported by the verifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The buffer does not start with the chunk magic.
    #[error("bad magic: expected \"KSTL\"")]
    BadMagic,

    /// The header names a format version this loader does not read.
    #[error("unsupported chunk version {0}")]
    UnsupportedVersion(u16),

    /// Header flags are reserved and must be zero.
    #[error("reserved header flags set: {0:#06x}")]
    ReservedFlags(u16),

    /// The body checksum does not match the header.
    #[error("checksum mismatch: header {expected:02x?}, body {computed:02x?}")]
    ChecksumMismatch { expected: [u8; 8], computed: [u8; 8] },

    /// The input ended inside a section.
    #[error("unexpected end of input at offset {offset} while reading {what}")]
    Truncated { offset: usize, what: &'static str },

    /// Bytes remain after the last section.
    #[error("{count} trailing bytes after function table")]
    TrailingBytes { count: usize },

    /// Constant pool entry has a tag that is not a value type.
    #[error("invalid constant tag {0:#04x}")]
    InvalidConstantTag(u8),

    /// Boolean constant encoded as something other than 0 or 1.
    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),

    /// Function name is not valid UTF-8.
    #[error("function {index} has a name that is not valid UTF-8")]
    InvalidName { index: usize },

    /// Opcode 0x00 is illegal and always rejected.
    #[error("illegal opcode 0x00")]
    IllegalOpcode,

    /// Opcode not assigned to any instruction.
    #[error("invalid opcode: {0:#04x}")]
    InvalidOpcode(u8),

    /// Type tag in the reserved range.
    #[error("reserved type tag: {0:#04x}")]
    ReservedTypeTag(u8),

    /// Instruction decode failure inside a function body.
    #[error("function {function}, instruction {at}: {source}")]
    Instruction {
        function: usize,
        at: usize,
        #[source]
        source: Box<DecodeError>,
    },
}
