//! Runtime value representation for the Kestrel VM.
//!
//! Values are what live on the stack, in globals and in the constant pool.

use crate::type_tag::TypeTag;

/// Runtime value representation.
///
/// Scalars are plain copies. Strings own their bytes; they are not
/// required to be UTF-8 and may contain interior NULs.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Signed 64-bit integer.
    I64(i64),
    /// IEEE 754 64-bit float.
    F64(f64),
    /// Boolean value.
    Bool(bool),
    /// The unit value. Also the padding value for grown stack slots.
    #[default]
    Null,
    /// Byte string with explicit length.
    Str(Box<[u8]>),
}

// F64 compares by bit pattern so that Value can implement Eq; NaN equals
// itself and +0.0 differs from -0.0.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Value {
    /// Build a string value by copying `bytes`.
    pub fn string(bytes: impl AsRef<[u8]>) -> Self {
        Value::Str(bytes.as_ref().into())
    }

    /// Returns the type tag for this value.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::I64(_) => TypeTag::I64,
            Value::F64(_) => TypeTag::F64,
            Value::Bool(_) => TypeTag::Bool,
            Value::Null => TypeTag::Null,
            Value::Str(_) => TypeTag::Str,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Str(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::string(v)
    }
}
