//! Runtime limits for a VM instance.

/// Default bound on nested calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Default bound on stack slots the interpreter may grow to.
pub const DEFAULT_MAX_STACK_DEPTH: usize = 1 << 20;

/// Limits applied while running bytecode.
///
/// Values pushed through the embedding API are not limited; these only
/// bound what the interpreter and nested calls may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// Maximum nesting of bytecode frames and host calls.
    pub max_call_depth: usize,
    /// Maximum total stack height while the interpreter pushes.
    pub max_stack_depth: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_stack_depth: DEFAULT_MAX_STACK_DEPTH,
        }
    }
}

impl VmConfig {
    /// Same limits with a different call depth bound.
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Same limits with a different stack bound.
    pub fn with_max_stack_depth(mut self, depth: usize) -> Self {
        self.max_stack_depth = depth;
        self
    }
}
