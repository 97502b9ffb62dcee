//! Kestrel verifier: static analysis for decoded chunks.
//!
//! The verifier checks a [`Chunk`] before any of its code can run. It
//! collects ALL errors (not just the first) and returns them.
//!
//! # Usage
//!
//! ```
//! use kestrel_common::{Chunk, Function, Instruction, Opcode, Value};
//! use kestrel_verifier::verify;
//!
//! let chunk = Chunk::new(
//!     vec![Value::I64(42)],
//!     vec![Function::new(
//!         "answer",
//!         0,
//!         0,
//!         vec![
//!             Instruction::with_arg(Opcode::Const, 0),
//!             Instruction::simple(Opcode::Ret),
//!         ],
//!     )],
//! );
//!
//! assert!(verify(&chunk).is_ok());
//! ```
//!
//! # Passes
//!
//! 1. **Limits**: pool, table and function sizes
//! 2. **Structural**: names, unused fields, operand references, termination
//! 3. **Stack**: operand depth balance per function

pub mod error;
pub mod limits;
pub mod stack;
pub mod structural;

pub use error::VerifyError;

use kestrel_common::Chunk;

/// Verify a chunk for correctness.
///
/// Returns `Ok(())` if the chunk passes all checks, or
/// `Err(Vec<VerifyError>)` with all errors found.
///
/// The stack pass follows jump targets, so it is skipped when the
/// structural pass reports anything.
pub fn verify(chunk: &Chunk) -> Result<(), Vec<VerifyError>> {
    let mut all_errors = limits::check_limits(chunk);

    let structural_errors = structural::check_structural(chunk);
    let structural_clean = structural_errors.is_empty();
    all_errors.extend(structural_errors);

    if structural_clean {
        all_errors.extend(stack::check_stack(chunk));
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_common::{Function, Instruction, Opcode, Value};

    #[test]
    fn empty_chunk_is_valid() {
        assert!(verify(&Chunk::default()).is_ok());
    }

    #[test]
    fn structural_errors_skip_stack_pass() {
        // Underflow at 0 would be reported too if the stack pass ran.
        let chunk = Chunk::new(
            vec![],
            vec![Function::new(
                "f",
                0,
                0,
                vec![Instruction::simple(Opcode::Add), Instruction::with_arg(Opcode::Jump, 9)],
            )],
        );
        let errors = verify(&chunk).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], VerifyError::JumpOutOfRange { .. }));
    }

    #[test]
    fn collects_errors_from_several_functions() {
        let bad = vec![Instruction::simple(Opcode::Ret)];
        let chunk = Chunk::new(
            vec![Value::Null],
            vec![Function::new("a", 0, 0, bad.clone()), Function::new("b", 0, 0, bad)],
        );
        let errors = verify(&chunk).unwrap_err();
        let functions: Vec<_> = errors.iter().filter_map(VerifyError::function).collect();
        assert_eq!(functions, vec![0, 1]);
    }
}
