//! Verification errors for the Kestrel verifier.
//!
//! Every error names the function (index into the function table) and,
//! where it applies, the instruction index. The verifier collects ALL
//! errors, not just the first.

use thiserror::Error;

/// Errors found during static verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    // --- Limits ---
    /// Constant pool exceeds the addressable size.
    #[error("too many constants: {count} (max 65536)")]
    TooManyConstants { count: usize },

    /// Function table exceeds the maximum size.
    #[error("too many functions: {count} (max 4096)")]
    TooManyFunctions { count: usize },

    /// Function body exceeds the addressable size.
    #[error("function {function} too large: {size} instructions (max 65536)")]
    FunctionTooLarge { function: usize, size: usize },

    // --- Structural ---
    /// Function has no instructions.
    #[error("function {function} has no instructions")]
    EmptyFunction { function: usize },

    /// Function has an empty name.
    #[error("function {function} has an empty name")]
    EmptyFunctionName { function: usize },

    /// Two functions share a name.
    #[error("function {function} redefines '{name}'")]
    DuplicateFunction { function: usize, name: String },

    /// Fewer local slots than arguments.
    #[error("function {function} declares {locals} locals for {arity} arguments")]
    LocalsBelowArity {
        function: usize,
        arity: u16,
        locals: u16,
    },

    /// Unused operand field is nonzero.
    #[error("non-zero unused field in function {function} at instruction {at}")]
    NonZeroUnusedField { function: usize, at: usize },

    /// Constant index beyond the constant pool.
    #[error("constant {index} out of range in function {function} at instruction {at}")]
    ConstantOutOfRange {
        function: usize,
        at: usize,
        index: u16,
    },

    /// Local slot beyond the function's locals.
    #[error(
        "local {index} out of range (locals {locals}) in function {function} at instruction {at}"
    )]
    LocalOutOfRange {
        function: usize,
        at: usize,
        index: u16,
        locals: u16,
    },

    /// Call target beyond the function table.
    #[error("call to function {index} out of range in function {function} at instruction {at}")]
    FunctionOutOfRange {
        function: usize,
        at: usize,
        index: u16,
    },

    /// Jump target outside the function body.
    #[error("jump target {target} out of range in function {function} at instruction {at}")]
    JumpOutOfRange {
        function: usize,
        at: usize,
        target: u16,
    },

    /// Name operand does not refer to a string constant.
    #[error("constant {index} is not a string name in function {function} at instruction {at}")]
    NameNotString {
        function: usize,
        at: usize,
        index: u16,
    },

    /// Call argument count differs from the callee's arity.
    #[error(
        "call passes {found} arguments, callee expects {expected}, in function {function} at instruction {at}"
    )]
    CallArityMismatch {
        function: usize,
        at: usize,
        expected: u16,
        found: u16,
    },

    /// IS_TYPE without a value type operand.
    #[error("IS_TYPE needs a value type in function {function} at instruction {at}")]
    InvalidTypeOperand { function: usize, at: usize },

    /// Execution can run past the last instruction.
    #[error("function {function} does not end with RET or JUMP")]
    MissingReturn { function: usize },

    // --- Stack ---
    /// Stack underflow detected statically.
    #[error("stack underflow in function {function} at instruction {at}")]
    StackUnderflow { function: usize, at: usize },

    /// Two paths reach an instruction with different operand depths.
    #[error(
        "stack height mismatch in function {function} at instruction {at}: {expected} vs {found}"
    )]
    StackHeightMismatch {
        function: usize,
        at: usize,
        expected: usize,
        found: usize,
    },

    /// Operand depth exceeds the static maximum.
    #[error("operand depth {depth} too large in function {function} at instruction {at}")]
    StackTooDeep {
        function: usize,
        at: usize,
        depth: usize,
    },
}

impl VerifyError {
    /// Index of the function the error was found in, if any.
    pub fn function(&self) -> Option<usize> {
        match self {
            VerifyError::TooManyConstants { .. } | VerifyError::TooManyFunctions { .. } => None,
            VerifyError::FunctionTooLarge { function, .. }
            | VerifyError::EmptyFunction { function }
            | VerifyError::EmptyFunctionName { function }
            | VerifyError::DuplicateFunction { function, .. }
            | VerifyError::LocalsBelowArity { function, .. }
            | VerifyError::NonZeroUnusedField { function, .. }
            | VerifyError::ConstantOutOfRange { function, .. }
            | VerifyError::LocalOutOfRange { function, .. }
            | VerifyError::FunctionOutOfRange { function, .. }
            | VerifyError::JumpOutOfRange { function, .. }
            | VerifyError::NameNotString { function, .. }
            | VerifyError::CallArityMismatch { function, .. }
            | VerifyError::InvalidTypeOperand { function, .. }
            | VerifyError::MissingReturn { function }
            | VerifyError::StackUnderflow { function, .. }
            | VerifyError::StackHeightMismatch { function, .. }
            | VerifyError::StackTooDeep { function, .. } => Some(*function),
        }
    }
}
