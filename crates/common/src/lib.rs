//! Kestrel common types and chunk encoding.
//!
//! This crate provides the foundational data structures shared by the
//! verifier, the VM and the C API:
//!
//! - [`Value`]: tagged runtime value (i64, f64, bool, null, byte string)
//! - [`TypeTag`]: the tag of a value, also used as an instruction operand
//! - [`Opcode`] / [`Instruction`]: the fixed 64-bit instruction encoding
//! - [`Chunk`] / [`Function`]: the loadable unit and its binary codec
//! - [`DecodeError`]: errors from decoding byte streams

pub mod chunk;
pub mod error;
pub mod instruction;
pub mod opcode;
pub mod type_tag;
pub mod value;

// Re-export commonly used types at the crate root.
pub use chunk::{Chunk, Function};
pub use error::DecodeError;
pub use instruction::Instruction;
pub use opcode::Opcode;
pub use type_tag::TypeTag;
pub use value::Value;

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i64>().prop_map(Value::I64),
            any::<f64>().prop_map(Value::F64),
            any::<bool>().prop_map(Value::Bool),
            Just(Value::Null),
            prop::collection::vec(any::<u8>(), 0..32).prop_map(Value::string),
        ]
    }

    fn arb_instruction() -> impl Strategy<Value = Instruction> {
        (
            prop::sample::select(&opcode::ALL_OPCODES[..]),
            prop::sample::select(&type_tag::ALL_TYPE_TAGS[..]),
            any::<u16>(),
            any::<u16>(),
        )
            .prop_map(|(op, tt, a1, a2)| Instruction::new(op, tt, a1, a2, 0))
    }

    fn arb_function() -> impl Strategy<Value = Function> {
        (
            "[a-z_]{1,12}",
            any::<u16>(),
            any::<u16>(),
            prop::collection::vec(arb_instruction(), 0..16),
        )
            .prop_map(|(name, arity, locals, code)| Function::new(name, arity, locals, code))
    }

    proptest! {
        /// Any chunk survives encode then decode unchanged.
        #[test]
        fn chunk_roundtrip(
            constants in prop::collection::vec(arb_value(), 0..16),
            functions in prop::collection::vec(arb_function(), 0..6),
        ) {
            let chunk = Chunk::new(constants, functions);
            let decoded = Chunk::decode(&chunk.encode()).unwrap();
            prop_assert_eq!(chunk, decoded);
        }

        /// Decoding arbitrary bytes never panics.
        #[test]
        fn random_bytes_decode(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
            let _ = Chunk::decode(&bytes);
        }

        /// A valid header over a random body is rejected or accepted, never panics.
        #[test]
        fn random_body_with_valid_header(body in prop::collection::vec(any::<u8>(), 0..256)) {
            let mut bytes = Vec::new();
            bytes.extend_from_slice(chunk::MAGIC);
            bytes.extend_from_slice(&chunk::VERSION.to_le_bytes());
            bytes.extend_from_slice(&0u16.to_le_bytes());
            bytes.extend_from_slice(&chunk::checksum(&body));
            bytes.extend_from_slice(&body);
            if let Ok(chunk) = Chunk::decode(&bytes) {
                prop_assert_eq!(chunk.encode(), bytes);
            }
        }
    }
}
