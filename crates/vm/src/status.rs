//! Result codes shared by the Rust API and the C surface.

use std::fmt;

/// Outcome of a VM operation.
///
/// The discriminants are part of the C ABI and never change.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok = 0,
    ErrorRuntime = 1,
    ErrorType = 2,
    ErrorVerify = 3,
    ErrorMemory = 4,
    ErrorInvalidArg = 5,
    ErrorNotFound = 6,
}

impl Status {
    /// Whether this is [`Status::Ok`].
    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }

    /// Short lowercase name used in messages.
    pub fn name(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::ErrorRuntime => "runtime error",
            Status::ErrorType => "type error",
            Status::ErrorVerify => "verification error",
            Status::ErrorMemory => "memory error",
            Status::ErrorInvalidArg => "invalid argument",
            Status::ErrorNotFound => "not found",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
