//! Errors for the Kestrel VM.
//!
//! [`RuntimeError`] is a trap raised while bytecode runs; it always
//! carries the function name and instruction index. [`VmError`] is what
//! every fallible [`Vm`](crate::Vm) operation returns, and maps onto the
//! C-facing [`Status`] codes.

use crate::status::Status;
use kestrel_common::{DecodeError, TypeTag};
use kestrel_verifier::VerifyError;
use std::path::PathBuf;
use thiserror::Error;

/// A trap raised by the interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} in function '{function}' at instruction {at}")]
pub struct RuntimeError {
    /// What went wrong.
    pub kind: TrapKind,
    /// Name of the bytecode function that trapped.
    pub function: String,
    /// Index of the trapping instruction.
    pub at: usize,
}

/// The cause of a [`RuntimeError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrapKind {
    /// Integer division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// An operand had a type the instruction does not accept.
    #[error("{op} cannot take a {found} operand")]
    TypeMismatch { op: &'static str, found: TypeTag },

    /// Pop from an empty frame.
    #[error("stack underflow")]
    StackUnderflow,

    /// The interpreter hit the configured stack bound.
    #[error("stack overflow (limit {limit})")]
    StackOverflow { limit: usize },

    /// Nested calls hit the configured depth bound.
    #[error("call depth exceeded (limit {limit})")]
    CallDepthExceeded { limit: usize },

    /// Operand refers outside the chunk or frame.
    #[error("invalid operand {index}")]
    InvalidOperand { index: u16 },

    /// `GetGlobal` on an unbound name.
    #[error("unknown global '{name}'")]
    UnknownGlobal { name: String },

    /// `CallHost` on an unregistered name.
    #[error("unknown host function '{name}'")]
    UnknownHostFunction { name: String },

    /// `CallHost` with a different argument count than registered.
    #[error("host function '{name}' takes {expected} arguments, got {found}")]
    HostArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    /// Host function left other than one value for the bytecode caller.
    #[error("host function '{name}' left {count} results, expected 1")]
    HostResultCount { name: String, count: usize },

    /// Host function returned a non-OK status.
    #[error("host function '{name}' failed: {status}")]
    HostFailed { name: String, status: Status },
}

impl RuntimeError {
    /// Result code reported for this trap.
    pub fn status(&self) -> Status {
        match &self.kind {
            TrapKind::TypeMismatch { .. } => Status::ErrorType,
            TrapKind::StackOverflow { .. } | TrapKind::CallDepthExceeded { .. } => {
                Status::ErrorMemory
            }
            TrapKind::HostFailed { status, .. } => *status,
            TrapKind::DivisionByZero
            | TrapKind::StackUnderflow
            | TrapKind::InvalidOperand { .. }
            | TrapKind::UnknownGlobal { .. }
            | TrapKind::UnknownHostFunction { .. }
            | TrapKind::HostArityMismatch { .. }
            | TrapKind::HostResultCount { .. } => Status::ErrorRuntime,
        }
    }
}

/// Errors returned by VM operations.
#[derive(Debug, Error)]
pub enum VmError {
    /// A global or function name was empty.
    #[error("empty {what} name")]
    EmptyName { what: &'static str },

    /// An operation needed a value but the stack was empty.
    #[error("stack is empty")]
    EmptyStack,

    /// `get_global` on an unbound name.
    #[error("global '{name}' not found")]
    GlobalNotFound { name: String },

    /// `call` on a name that is neither registered nor defined.
    #[error("function '{name}' not found")]
    FunctionNotFound { name: String },

    /// `call` with a different argument count than the callee declares.
    #[error("function '{name}' takes {expected} arguments, got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    /// `call` asked for more arguments than the stack holds.
    #[error("call wants {requested} arguments but the stack holds {available}")]
    NotEnoughArguments { requested: usize, available: usize },

    /// Nested host re-entry hit the configured depth bound.
    #[error("call depth exceeded (limit {limit})")]
    CallDepthExceeded { limit: usize },

    /// `load_chunk` on an empty buffer.
    #[error("chunk buffer is empty")]
    EmptyChunk,

    /// Chunk file could not be read.
    #[error("cannot read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Chunk file could not be written.
    #[error("cannot write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `save_file` with no chunk loaded.
    #[error("no chunk loaded")]
    NoChunk,

    /// Bytes are not a well-formed chunk.
    #[error("malformed chunk: {0}")]
    Decode(#[from] DecodeError),

    /// Chunk decoded but failed static verification.
    #[error("chunk failed verification: {}", join_errors(.0))]
    Verify(Vec<VerifyError>),

    /// Bytecode trapped.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Host function returned a non-OK status.
    #[error("host function '{name}' failed: {status}")]
    HostFailed { name: String, status: Status },
}

impl VmError {
    /// Result code reported for this error.
    pub fn status(&self) -> Status {
        match self {
            VmError::EmptyName { .. }
            | VmError::ArityMismatch { .. }
            | VmError::NotEnoughArguments { .. }
            | VmError::EmptyStack
            | VmError::EmptyChunk
            | VmError::NoChunk => Status::ErrorInvalidArg,
            VmError::GlobalNotFound { .. } | VmError::FunctionNotFound { .. } | VmError::Io { .. } => {
                Status::ErrorNotFound
            }
            VmError::Write { .. } => Status::ErrorRuntime,
            VmError::CallDepthExceeded { .. } => Status::ErrorMemory,
            VmError::Decode(_) | VmError::Verify(_) => Status::ErrorVerify,
            VmError::Runtime(trap) => trap.status(),
            VmError::HostFailed { status, .. } => *status,
        }
    }
}

fn join_errors(errors: &[VerifyError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_error_display() {
        let err = RuntimeError {
            kind: TrapKind::DivisionByZero,
            function: "main".into(),
            at: 5,
        };
        assert_eq!(
            err.to_string(),
            "division by zero in function 'main' at instruction 5"
        );
    }

    #[test]
    fn trap_status_mapping() {
        let trap = |kind| RuntimeError {
            kind,
            function: "f".into(),
            at: 0,
        };
        assert_eq!(
            trap(TrapKind::TypeMismatch {
                op: "ADD",
                found: TypeTag::Str
            })
            .status(),
            Status::ErrorType
        );
        assert_eq!(
            trap(TrapKind::StackOverflow { limit: 4 }).status(),
            Status::ErrorMemory
        );
        assert_eq!(
            trap(TrapKind::HostFailed {
                name: "h".into(),
                status: Status::ErrorNotFound
            })
            .status(),
            Status::ErrorNotFound
        );
        assert_eq!(trap(TrapKind::DivisionByZero).status(), Status::ErrorRuntime);
    }

    #[test]
    fn vm_error_status_mapping() {
        assert_eq!(
            VmError::EmptyName { what: "global" }.status(),
            Status::ErrorInvalidArg
        );
        assert_eq!(
            VmError::FunctionNotFound { name: "x".into() }.status(),
            Status::ErrorNotFound
        );
        assert_eq!(
            VmError::Decode(DecodeError::BadMagic).status(),
            Status::ErrorVerify
        );
        assert_eq!(VmError::Verify(vec![]).status(), Status::ErrorVerify);
        assert_eq!(VmError::NoChunk.status(), Status::ErrorInvalidArg);
        assert_eq!(VmError::EmptyStack.status(), Status::ErrorInvalidArg);
    }

    #[test]
    fn verify_display_lists_every_error() {
        let err = VmError::Verify(vec![
            VerifyError::EmptyFunction { function: 0 },
            VerifyError::MissingReturn { function: 1 },
        ]);
        assert_eq!(
            err.to_string(),
            "chunk failed verification: function 0 has no instructions; \
             function 1 does not end with RET or JUMP"
        );
    }
}
