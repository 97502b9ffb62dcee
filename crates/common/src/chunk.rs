//! Chunk representation and binary codec.
//!
//! A chunk is the loadable unit of bytecode: a constant pool and a table
//! of named functions. The binary layout (all integers little-endian):
//!
//! ```text
//! 0   magic     b"KSTL"
//! 4   version   u16
//! 6   flags     u16 (reserved, zero)
//! 8   checksum  first 8 bytes of blake3(body)
//! 16  body      constant pool, function table
//! ```

use crate::error::DecodeError;
use crate::instruction::{Instruction, INSTRUCTION_SIZE};
use crate::type_tag::TypeTag;
use crate::value::Value;

/// Magic bytes at the start of every chunk.
pub const MAGIC: &[u8; 4] = b"KSTL";

/// Current chunk format version.
pub const VERSION: u16 = 1;

/// Size of the fixed header preceding the body.
pub const HEADER_SIZE: usize = 16;

/// Number of blake3 bytes kept in the header.
pub const CHECKSUM_SIZE: usize = 8;

/// A function defined in bytecode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    /// Name used to call the function from the host.
    pub name: String,
    /// Number of arguments. They occupy local slots `0..arity`.
    pub arity: u16,
    /// Total local slots, arguments included.
    pub locals: u16,
    /// The instruction stream.
    pub code: Vec<Instruction>,
}

impl Function {
    pub fn new(name: impl Into<String>, arity: u16, locals: u16, code: Vec<Instruction>) -> Self {
        Self {
            name: name.into(),
            arity,
            locals,
            code,
        }
    }
}

/// A decoded chunk. Decoding checks the format only; see the verifier for
/// semantic checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    /// Constant pool referenced by `Const` and by name operands.
    pub constants: Vec<Value>,
    /// Function table referenced by `Call`.
    pub functions: Vec<Function>,
}

impl Chunk {
    pub fn new(constants: Vec<Value>, functions: Vec<Function>) -> Self {
        Self {
            constants,
            functions,
        }
    }

    /// Index of the first function named `name`.
    pub fn function_index(&self, name: &str) -> Option<usize> {
        self.functions.iter().position(|f| f.name == name)
    }

    /// The first function named `name`.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Encode the chunk, header and checksum included.
    pub fn encode(&self) -> Vec<u8> {
        let mut body = Vec::new();

        put_u32(&mut body, self.constants.len() as u32);
        for constant in &self.constants {
            body.push(constant.type_tag() as u8);
            match constant {
                Value::I64(v) => body.extend_from_slice(&v.to_le_bytes()),
                Value::F64(v) => body.extend_from_slice(&v.to_bits().to_le_bytes()),
                Value::Bool(v) => body.push(u8::from(*v)),
                Value::Null => {}
                Value::Str(bytes) => {
                    put_u32(&mut body, bytes.len() as u32);
                    body.extend_from_slice(bytes);
                }
            }
        }

        put_u32(&mut body, self.functions.len() as u32);
        for func in &self.functions {
            put_u32(&mut body, func.name.len() as u32);
            body.extend_from_slice(func.name.as_bytes());
            body.extend_from_slice(&func.arity.to_le_bytes());
            body.extend_from_slice(&func.locals.to_le_bytes());
            put_u32(&mut body, func.code.len() as u32);
            for instr in &func.code {
                body.extend_from_slice(&instr.encode());
            }
        }

        let mut bytes = Vec::with_capacity(HEADER_SIZE + body.len());
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&VERSION.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&checksum(&body));
        bytes.extend_from_slice(&body);
        bytes
    }

    /// Decode a chunk from bytes.
    ///
    /// Rejects bad headers, checksum mismatches, truncated sections,
    /// unknown constant tags, non-UTF-8 names, undecodable instructions
    /// and trailing bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(bytes);

        if r.take(MAGIC.len(), "magic")? != MAGIC {
            return Err(DecodeError::BadMagic);
        }
        let version = r.u16("version")?;
        if version != VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }
        let flags = r.u16("flags")?;
        if flags != 0 {
            return Err(DecodeError::ReservedFlags(flags));
        }
        let mut expected = [0u8; CHECKSUM_SIZE];
        expected.copy_from_slice(r.take(CHECKSUM_SIZE, "checksum")?);
        let computed = checksum(&bytes[HEADER_SIZE..]);
        if expected != computed {
            return Err(DecodeError::ChecksumMismatch { expected, computed });
        }

        // Every constant takes at least its tag byte.
        let constant_count = r.count(1, "constant pool")?;
        let mut constants = Vec::with_capacity(constant_count);
        for _ in 0..constant_count {
            constants.push(r.constant()?);
        }

        // name length + arity + locals + code length
        let function_count = r.count(12, "function table")?;
        let mut functions = Vec::with_capacity(function_count);
        for index in 0..function_count {
            functions.push(r.function(index)?);
        }

        if r.remaining() > 0 {
            return Err(DecodeError::TrailingBytes {
                count: r.remaining(),
            });
        }

        Ok(Self {
            constants,
            functions,
        })
    }
}

/// First [`CHECKSUM_SIZE`] bytes of the blake3 hash of `body`.
pub fn checksum(body: &[u8]) -> [u8; CHECKSUM_SIZE] {
    let hash = blake3::hash(body);
    let mut out = [0u8; CHECKSUM_SIZE];
    out.copy_from_slice(&hash.as_bytes()[..CHECKSUM_SIZE]);
    out
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Bounds-checked cursor over the input buffer.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                what,
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    fn u8(&mut self, what: &'static str) -> Result<u8, DecodeError> {
        Ok(self.array::<1>(what)?[0])
    }

    fn u16(&mut self, what: &'static str) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.array(what)?))
    }

    fn u32(&mut self, what: &'static str) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.array(what)?))
    }

    fn u64(&mut self, what: &'static str) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.array(what)?))
    }

    /// Read an element count and reject it if `count * min_size` cannot fit
    /// in the remaining input.
    fn count(&mut self, min_size: usize, what: &'static str) -> Result<usize, DecodeError> {
        let at = self.pos;
        let count = self.u32(what)? as usize;
        match count.checked_mul(min_size) {
            Some(needed) if needed <= self.remaining() => Ok(count),
            _ => Err(DecodeError::Truncated { offset: at, what }),
        }
    }

    fn constant(&mut self) -> Result<Value, DecodeError> {
        let tag = self.u8("constant tag")?;
        let value = match TypeTag::try_from(tag) {
            Ok(TypeTag::I64) => Value::I64(self.u64("i64 constant")? as i64),
            Ok(TypeTag::F64) => Value::F64(f64::from_bits(self.u64("f64 constant")?)),
            Ok(TypeTag::Bool) => match self.u8("bool constant")? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                other => return Err(DecodeError::InvalidBool(other)),
            },
            Ok(TypeTag::Null) => Value::Null,
            Ok(TypeTag::Str) => {
                let len = self.count(1, "string constant")?;
                Value::string(self.take(len, "string constant")?)
            }
            Ok(TypeTag::None) | Err(_) => return Err(DecodeError::InvalidConstantTag(tag)),
        };
        Ok(value)
    }

    fn function(&mut self, index: usize) -> Result<Function, DecodeError> {
        let name_len = self.count(1, "function name")?;
        let name = String::from_utf8(self.take(name_len, "function name")?.to_vec())
            .map_err(|_| DecodeError::InvalidName { index })?;
        let arity = self.u16("function arity")?;
        let locals = self.u16("function locals")?;

        let code_len = self.count(INSTRUCTION_SIZE, "function code")?;
        let mut code = Vec::with_capacity(code_len);
        for at in 0..code_len {
            let raw = self.array::<INSTRUCTION_SIZE>("instruction")?;
            let instr = Instruction::decode(raw).map_err(|e| DecodeError::Instruction {
                function: index,
                at,
                source: Box::new(e),
            })?;
            code.push(instr);
        }

        Ok(Function {
            name,
            arity,
            locals,
            code,
        })
    }
}
