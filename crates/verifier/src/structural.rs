//! Structural validation pass for Kestrel chunks.
//!
//! Checks function headers, unused fields and every operand reference
//! (constants, locals, functions, jump targets, name operands). The stack
//! pass relies on these checks, so it only runs when this pass is clean.

use crate::error::VerifyError;
use kestrel_common::{Chunk, Function, Instruction, Opcode, TypeTag, Value};
use std::collections::HashSet;

/// Run the structural validation pass.
pub fn check_structural(chunk: &Chunk) -> Vec<VerifyError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (function, func) in chunk.functions.iter().enumerate() {
        if func.name.is_empty() {
            errors.push(VerifyError::EmptyFunctionName { function });
        } else if !seen.insert(func.name.as_str()) {
            errors.push(VerifyError::DuplicateFunction {
                function,
                name: func.name.clone(),
            });
        }

        if func.locals < func.arity {
            errors.push(VerifyError::LocalsBelowArity {
                function,
                arity: func.arity,
                locals: func.locals,
            });
        }

        match func.code.last() {
            None => errors.push(VerifyError::EmptyFunction { function }),
            Some(last) if !last.opcode.is_terminator() => {
                errors.push(VerifyError::MissingReturn { function })
            }
            Some(_) => {}
        }

        for (at, instr) in func.code.iter().enumerate() {
            check_unused_fields(instr, function, at, &mut errors);
            check_operands(chunk, func, instr, function, at, &mut errors);
        }
    }

    errors
}

fn check_operands(
    chunk: &Chunk,
    func: &Function,
    instr: &Instruction,
    function: usize,
    at: usize,
    errors: &mut Vec<VerifyError>,
) {
    match instr.opcode {
        Opcode::Const => {
            if chunk.constants.get(instr.arg1 as usize).is_none() {
                errors.push(VerifyError::ConstantOutOfRange {
                    function,
                    at,
                    index: instr.arg1,
                });
            }
        }
        Opcode::GetGlobal | Opcode::SetGlobal | Opcode::CallHost => {
            match chunk.constants.get(instr.arg1 as usize) {
                None => errors.push(VerifyError::ConstantOutOfRange {
                    function,
                    at,
                    index: instr.arg1,
                }),
                Some(Value::Str(name)) if !name.is_empty() => {}
                Some(_) => errors.push(VerifyError::NameNotString {
                    function,
                    at,
                    index: instr.arg1,
                }),
            }
        }
        Opcode::LoadLocal | Opcode::StoreLocal => {
            if instr.arg1 >= func.locals {
                errors.push(VerifyError::LocalOutOfRange {
                    function,
                    at,
                    index: instr.arg1,
                    locals: func.locals,
                });
            }
        }
        Opcode::Jump | Opcode::JumpIfFalse => {
            if instr.arg1 as usize >= func.code.len() {
                errors.push(VerifyError::JumpOutOfRange {
                    function,
                    at,
                    target: instr.arg1,
                });
            }
        }
        Opcode::Call => match chunk.functions.get(instr.arg1 as usize) {
            None => errors.push(VerifyError::FunctionOutOfRange {
                function,
                at,
                index: instr.arg1,
            }),
            Some(callee) if callee.arity != instr.arg2 => {
                errors.push(VerifyError::CallArityMismatch {
                    function,
                    at,
                    expected: callee.arity,
                    found: instr.arg2,
                })
            }
            Some(_) => {}
        },
        Opcode::IsType => {
            if !instr.type_tag.is_value_type() {
                errors.push(VerifyError::InvalidTypeOperand { function, at });
            }
        }
        _ => {}
    }
}

/// Check that fields an opcode does not use are zero.
fn check_unused_fields(
    instr: &Instruction,
    function: usize,
    at: usize,
    errors: &mut Vec<VerifyError>,
) {
    // (uses_type_tag, uses_arg1, uses_arg2); arg3 is always unused.
    let (used_tt, used_a1, used_a2) = match instr.opcode {
        Opcode::Const
        | Opcode::LoadLocal
        | Opcode::StoreLocal
        | Opcode::GetGlobal
        | Opcode::SetGlobal
        | Opcode::Jump
        | Opcode::JumpIfFalse => (false, true, false),

        Opcode::Call | Opcode::CallHost => (false, true, true),

        Opcode::IsType => (true, false, false),

        Opcode::Nop
        | Opcode::Pop
        | Opcode::Dup
        | Opcode::Add
        | Opcode::Sub
        | Opcode::Mul
        | Opcode::Div
        | Opcode::Mod
        | Opcode::Neg
        | Opcode::Eq
        | Opcode::Neq
        | Opcode::Lt
        | Opcode::Gt
        | Opcode::Lte
        | Opcode::Gte
        | Opcode::And
        | Opcode::Or
        | Opcode::Not
        | Opcode::Ret
        | Opcode::Concat => (false, false, false),
    };

    let has_nonzero = (!used_tt && instr.type_tag != TypeTag::None)
        || (!used_a1 && instr.arg1 != 0)
        || (!used_a2 && instr.arg2 != 0)
        || instr.arg3 != 0;

    if has_nonzero {
        errors.push(VerifyError::NonZeroUnusedField { function, at });
    }
}
