//! Limits checking for Kestrel chunks.

use crate::error::VerifyError;
use kestrel_common::Chunk;

/// Maximum constant pool size. Constant operands are `u16`.
pub const MAX_CONSTANTS: usize = 65_536;

/// Maximum number of functions in one chunk.
pub const MAX_FUNCTIONS: usize = 4_096;

/// Maximum function size in instructions. Jump targets are `u16`.
pub const MAX_FUNCTION_SIZE: usize = 65_536;

/// Maximum operand depth a single frame may reach.
pub const MAX_OPERAND_DEPTH: usize = 1_024;

/// Run the limits check.
pub fn check_limits(chunk: &Chunk) -> Vec<VerifyError> {
    let mut errors = Vec::new();

    if chunk.constants.len() > MAX_CONSTANTS {
        errors.push(VerifyError::TooManyConstants {
            count: chunk.constants.len(),
        });
    }

    if chunk.functions.len() > MAX_FUNCTIONS {
        errors.push(VerifyError::TooManyFunctions {
            count: chunk.functions.len(),
        });
    }

    for (function, func) in chunk.functions.iter().enumerate() {
        if func.code.len() > MAX_FUNCTION_SIZE {
            errors.push(VerifyError::FunctionTooLarge {
                function,
                size: func.code.len(),
            });
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_common::{Function, Instruction, Opcode, Value};

    #[test]
    fn small_chunk_passes() {
        let chunk = Chunk::new(
            vec![Value::I64(1)],
            vec![Function::new(
                "f",
                0,
                0,
                vec![
                    Instruction::with_arg(Opcode::Const, 0),
                    Instruction::simple(Opcode::Ret),
                ],
            )],
        );
        assert!(check_limits(&chunk).is_empty());
    }

    #[test]
    fn too_many_functions() {
        let functions = (0..MAX_FUNCTIONS + 1)
            .map(|i| Function::new(format!("f{i}"), 0, 0, vec![]))
            .collect();
        let errors = check_limits(&Chunk::new(vec![], functions));
        assert!(errors
            .iter()
            .any(|e| matches!(e, VerifyError::TooManyFunctions { count: 4097 })));
    }

    #[test]
    fn function_too_large() {
        let code = vec![Instruction::simple(Opcode::Nop); MAX_FUNCTION_SIZE + 1];
        let errors = check_limits(&Chunk::new(vec![], vec![Function::new("big", 0, 0, code)]));
        assert!(errors
            .iter()
            .any(|e| matches!(e, VerifyError::FunctionTooLarge { function: 0, .. })));
    }
}
