//! Integration tests for the Kestrel verifier.
//!
//! Chunks are built in memory, and some go through the binary codec first
//! to check that decode and verify compose the way the loader uses them.

use kestrel_common::{Chunk, Function, Instruction, Opcode, TypeTag, Value};
use kestrel_verifier::limits::{MAX_CONSTANTS, MAX_FUNCTIONS};
use kestrel_verifier::{verify, VerifyError};
use proptest::prelude::*;

fn instr(opcode: Opcode, type_tag: TypeTag, arg1: u16, arg2: u16, arg3: u16) -> Instruction {
    Instruction::new(opcode, type_tag, arg1, arg2, arg3)
}

fn op(opcode: Opcode) -> Instruction {
    Instruction::simple(opcode)
}

fn arg(opcode: Opcode, arg1: u16) -> Instruction {
    Instruction::with_arg(opcode, arg1)
}

fn has_error(result: &Result<(), Vec<VerifyError>>, pred: impl Fn(&VerifyError) -> bool) -> bool {
    match result {
        Ok(()) => false,
        Err(errors) => errors.iter().any(pred),
    }
}

/// `add(a, b)`, `main()` calling it, a host call and a global round trip.
fn sample_chunk() -> Chunk {
    Chunk::new(
        vec![
            Value::I64(2),
            Value::I64(3),
            Value::string("print"),
            Value::string("total"),
        ],
        vec![
            Function::new(
                "add",
                2,
                2,
                vec![
                    arg(Opcode::LoadLocal, 0),
                    arg(Opcode::LoadLocal, 1),
                    op(Opcode::Add),
                    op(Opcode::Ret),
                ],
            ),
            Function::new(
                "main",
                0,
                1,
                vec![
                    arg(Opcode::Const, 0),
                    arg(Opcode::Const, 1),
                    instr(Opcode::Call, TypeTag::None, 0, 2, 0),
                    op(Opcode::Dup),
                    arg(Opcode::SetGlobal, 3),
                    instr(Opcode::CallHost, TypeTag::None, 2, 1, 0),
                    op(Opcode::Pop),
                    arg(Opcode::GetGlobal, 3),
                    op(Opcode::Ret),
                ],
            ),
        ],
    )
}

// ========================================================
// Valid chunks pass verification
// ========================================================

#[test]
fn accept_sample_chunk() {
    let result = verify(&sample_chunk());
    assert!(result.is_ok(), "{result:?}");
}

#[test]
fn accept_after_codec_round_trip() {
    let bytes = sample_chunk().encode();
    let decoded = Chunk::decode(&bytes).expect("decodes");
    assert!(verify(&decoded).is_ok());
}

#[test]
fn accept_counting_loop() {
    // local0 = 0; while local0 < 10 { local0 = local0 + 1 }; return local0
    let chunk = Chunk::new(
        vec![Value::I64(0), Value::I64(10), Value::I64(1)],
        vec![Function::new(
            "count",
            0,
            1,
            vec![
                arg(Opcode::Const, 0),
                arg(Opcode::StoreLocal, 0),
                arg(Opcode::LoadLocal, 0), // 2
                arg(Opcode::Const, 1),
                op(Opcode::Lt),
                arg(Opcode::JumpIfFalse, 11),
                arg(Opcode::LoadLocal, 0),
                arg(Opcode::Const, 2),
                op(Opcode::Add),
                arg(Opcode::StoreLocal, 0),
                arg(Opcode::Jump, 2),
                arg(Opcode::LoadLocal, 0), // 11
                op(Opcode::Ret),
            ],
        )],
    );
    let result = verify(&chunk);
    assert!(result.is_ok(), "{result:?}");
}

#[test]
fn accept_type_dispatch() {
    let chunk = Chunk::new(
        vec![Value::string("a"), Value::string("b")],
        vec![Function::new(
            "describe",
            1,
            1,
            vec![
                arg(Opcode::LoadLocal, 0),
                instr(Opcode::IsType, TypeTag::Str, 0, 0, 0),
                arg(Opcode::JumpIfFalse, 5),
                arg(Opcode::Const, 0),
                op(Opcode::Concat),
                op(Opcode::Ret), // 5
            ],
        )],
    );
    // Both paths reach Ret at 5 with depth 1.
    let result = verify(&chunk);
    assert!(result.is_ok(), "{result:?}");
}

// ========================================================
// Rejections
// ========================================================

#[test]
fn reject_too_many_functions() {
    let body = vec![arg(Opcode::Jump, 0)];
    let functions = (0..=MAX_FUNCTIONS)
        .map(|i| Function::new(format!("f{i}"), 0, 0, body.clone()))
        .collect();
    let result = verify(&Chunk::new(vec![], functions));
    assert!(has_error(&result, |e| matches!(
        e,
        VerifyError::TooManyFunctions { count } if *count == MAX_FUNCTIONS + 1
    )));
}

#[test]
fn reject_too_many_constants() {
    let chunk = Chunk::new(vec![Value::Null; MAX_CONSTANTS + 1], vec![]);
    let result = verify(&chunk);
    assert!(has_error(&result, |e| matches!(
        e,
        VerifyError::TooManyConstants { .. }
    )));
}

#[test]
fn reject_wrong_call_arity() {
    let mut chunk = sample_chunk();
    chunk.functions[1].code[2] = instr(Opcode::Call, TypeTag::None, 0, 1, 0);
    let result = verify(&chunk);
    assert!(has_error(&result, |e| matches!(
        e,
        VerifyError::CallArityMismatch {
            function: 1,
            at: 2,
            expected: 2,
            found: 1
        }
    )));
}

#[test]
fn reject_host_call_with_numeric_name() {
    let mut chunk = sample_chunk();
    chunk.functions[1].code[5] = instr(Opcode::CallHost, TypeTag::None, 0, 1, 0);
    let result = verify(&chunk);
    assert!(has_error(&result, |e| matches!(
        e,
        VerifyError::NameNotString { index: 0, .. }
    )));
}

#[test]
fn reject_empty_string_name() {
    let chunk = Chunk::new(
        vec![Value::string(""), Value::I64(1)],
        vec![Function::new(
            "f",
            0,
            0,
            vec![arg(Opcode::Const, 1), arg(Opcode::SetGlobal, 0), arg(Opcode::Const, 1), op(Opcode::Ret)],
        )],
    );
    assert!(has_error(&verify(&chunk), |e| matches!(
        e,
        VerifyError::NameNotString { .. }
    )));
}

#[test]
fn reject_fallthrough_past_end() {
    let chunk = Chunk::new(
        vec![Value::I64(1)],
        vec![Function::new("f", 0, 0, vec![arg(Opcode::Const, 0)])],
    );
    assert!(has_error(&verify(&chunk), |e| matches!(
        e,
        VerifyError::MissingReturn { function: 0 }
    )));
}

#[test]
fn reject_type_tag_on_arithmetic() {
    let chunk = Chunk::new(
        vec![Value::I64(1)],
        vec![Function::new(
            "f",
            0,
            0,
            vec![
                arg(Opcode::Const, 0),
                arg(Opcode::Const, 0),
                instr(Opcode::Add, TypeTag::I64, 0, 0, 0),
                op(Opcode::Ret),
            ],
        )],
    );
    assert!(has_error(&verify(&chunk), |e| matches!(
        e,
        VerifyError::NonZeroUnusedField { at: 2, .. }
    )));
}

#[test]
fn reject_stack_imbalance_at_merge() {
    let chunk = Chunk::new(
        vec![Value::Bool(false), Value::I64(1)],
        vec![Function::new(
            "f",
            0,
            0,
            vec![
                arg(Opcode::Const, 0),
                arg(Opcode::JumpIfFalse, 3),
                arg(Opcode::Const, 1),
                arg(Opcode::Const, 1), // 3: reached with depth 0 and 1
                op(Opcode::Ret),
            ],
        )],
    );
    assert!(has_error(&verify(&chunk), |e| matches!(
        e,
        VerifyError::StackHeightMismatch { at: 3, .. }
    )));
}

#[test]
fn reports_every_error() {
    let chunk = Chunk::new(
        vec![],
        vec![
            Function::new("a", 0, 0, vec![]),
            Function::new("a", 3, 1, vec![arg(Opcode::Const, 5), op(Opcode::Ret)]),
        ],
    );
    let errors = verify(&chunk).unwrap_err();
    assert!(errors.len() >= 4, "{errors:?}");
    assert!(errors
        .iter()
        .any(|e| matches!(e, VerifyError::EmptyFunction { function: 0 })));
    assert!(errors
        .iter()
        .any(|e| matches!(e, VerifyError::DuplicateFunction { function: 1, .. })));
    assert!(errors
        .iter()
        .any(|e| matches!(e, VerifyError::LocalsBelowArity { function: 1, .. })));
    assert!(errors
        .iter()
        .any(|e| matches!(e, VerifyError::ConstantOutOfRange { function: 1, .. })));
}

// ========================================================
// Robustness
// ========================================================

fn any_opcode() -> impl Strategy<Value = Opcode> {
    prop::sample::select(kestrel_common::opcode::ALL_OPCODES.to_vec())
}

fn any_type_tag() -> impl Strategy<Value = TypeTag> {
    prop::sample::select(kestrel_common::type_tag::ALL_TYPE_TAGS.to_vec())
}

fn any_instruction() -> impl Strategy<Value = Instruction> {
    (any_opcode(), any_type_tag(), 0u16..8, 0u16..4, 0u16..2)
        .prop_map(|(opcode, tag, a1, a2, a3)| Instruction::new(opcode, tag, a1, a2, a3))
}

proptest! {
    /// The verifier is total: arbitrary instruction soup never panics.
    #[test]
    fn verify_never_panics(
        code in prop::collection::vec(any_instruction(), 0..40),
        arity in 0u16..3,
        locals in 0u16..4,
    ) {
        let chunk = Chunk::new(
            vec![Value::I64(1), Value::string("g"), Value::Bool(true)],
            vec![Function::new("f", arity, locals, code)],
        );
        let _ = verify(&chunk);
    }
}
