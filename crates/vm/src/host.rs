//! Registry of host-provided functions.

use crate::machine::Vm;
use crate::status::Status;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Signature of a host callable: it sees the VM with the argument window
/// open and reports a result code.
pub type HostFn = dyn Fn(&mut Vm) -> Status;

/// A registered host function.
#[derive(Clone)]
pub struct HostFunction {
    pub(crate) func: Rc<HostFn>,
    /// Number of arguments callers must pass.
    pub arity: usize,
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunction")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

impl HostFunction {
    pub fn new(arity: usize, func: impl Fn(&mut Vm) -> Status + 'static) -> Self {
        Self {
            func: Rc::new(func),
            arity,
        }
    }

    /// Run the callable. The registry is not borrowed, so it may re-enter.
    pub(crate) fn invoke(&self, vm: &mut Vm) -> Status {
        (self.func)(vm)
    }
}

#[derive(Debug, Default)]
pub struct HostRegistry {
    functions: HashMap<String, HostFunction>,
}

impl HostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under `name`. A later registration replaces an earlier one.
    pub fn register(&mut self, name: &str, function: HostFunction) -> bool {
        self.functions.insert(name.to_owned(), function).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&HostFunction> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_registration_wins() {
        let mut registry = HostRegistry::new();
        assert!(!registry.register("f", HostFunction::new(1, |_| Status::Ok)));
        assert!(registry.register("f", HostFunction::new(2, |_| Status::ErrorRuntime)));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("f").map(|h| h.arity), Some(2));
    }

    #[test]
    fn lookup_is_exact() {
        let mut registry = HostRegistry::new();
        registry.register("print", HostFunction::new(1, |_| Status::Ok));
        assert!(registry.contains("print"));
        assert!(!registry.contains("Print"));
        assert!(registry.get("").is_none());
    }
}
