//! Stack balance analysis for Kestrel functions.
//!
//! Abstract interpretation over operand depth: every instruction gets the
//! depth it starts with, every control-flow merge must agree on it, and no
//! instruction may pop more than is there. Assumes the structural pass
//! found no errors (jump targets and constant indices are in range).

use crate::error::VerifyError;
use crate::limits::MAX_OPERAND_DEPTH;
use kestrel_common::{Chunk, Function, Instruction, Opcode};

/// Run the stack balance check over every function in the chunk.
pub fn check_stack(chunk: &Chunk) -> Vec<VerifyError> {
    let mut errors = Vec::new();
    for (function, func) in chunk.functions.iter().enumerate() {
        check_function(function, func, &mut errors);
    }
    errors
}

fn check_function(function: usize, func: &Function, errors: &mut Vec<VerifyError>) {
    let code = &func.code;
    if code.is_empty() {
        return;
    }

    let mut depth_at: Vec<Option<usize>> = vec![None; code.len()];
    let mut worklist = vec![(0usize, 0usize)];

    while let Some((pc, depth)) = worklist.pop() {
        match depth_at[pc] {
            Some(known) if known == depth => continue,
            Some(known) => {
                errors.push(VerifyError::StackHeightMismatch {
                    function,
                    at: pc,
                    expected: known,
                    found: depth,
                });
                continue;
            }
            None => depth_at[pc] = Some(depth),
        }

        let instr = &code[pc];
        let (pops, pushes) = stack_effect(instr);
        if depth < pops {
            errors.push(VerifyError::StackUnderflow { function, at: pc });
            continue;
        }

        let after = depth - pops + pushes;
        if after > MAX_OPERAND_DEPTH {
            errors.push(VerifyError::StackTooDeep {
                function,
                at: pc,
                depth: after,
            });
            continue;
        }

        for next in successors(instr, pc, code.len()) {
            worklist.push((next, after));
        }
    }
}

/// Operand count an instruction pops and pushes.
pub fn stack_effect(instr: &Instruction) -> (usize, usize) {
    match instr.opcode {
        Opcode::Nop | Opcode::Jump => (0, 0),
        Opcode::Const | Opcode::LoadLocal | Opcode::GetGlobal => (0, 1),
        Opcode::Pop | Opcode::StoreLocal | Opcode::SetGlobal | Opcode::JumpIfFalse => (1, 0),
        Opcode::Dup | Opcode::IsType => (1, 2),
        Opcode::Add
        | Opcode::Sub
        | Opcode::Mul
        | Opcode::Div
        | Opcode::Mod
        | Opcode::Eq
        | Opcode::Neq
        | Opcode::Lt
        | Opcode::Gt
        | Opcode::Lte
        | Opcode::Gte
        | Opcode::And
        | Opcode::Or
        | Opcode::Concat => (2, 1),
        Opcode::Neg | Opcode::Not => (1, 1),
        Opcode::Call | Opcode::CallHost => (instr.arg2 as usize, 1),
        Opcode::Ret => (1, 0),
    }
}

fn successors(instr: &Instruction, pc: usize, len: usize) -> Vec<usize> {
    let fallthrough = (pc + 1 < len).then_some(pc + 1);
    match instr.opcode {
        Opcode::Ret => Vec::new(),
        Opcode::Jump => vec![instr.arg1 as usize],
        Opcode::JumpIfFalse => {
            let mut next = vec![instr.arg1 as usize];
            next.extend(fallthrough);
            next
        }
        _ => fallthrough.into_iter().collect(),
    }
}
