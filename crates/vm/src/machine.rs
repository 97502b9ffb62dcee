//! The VM instance: stack, globals, host functions, loaded chunk and
//! error state behind one embedding API.

use crate::config::VmConfig;
use crate::error::VmError;
use crate::globals::Globals;
use crate::host::{HostFunction, HostRegistry};
use crate::report::{ErrorCallback, ErrorState};
use crate::stack::Stack;
use crate::status::Status;
use kestrel_common::{Chunk, TypeTag, Value};
use log::debug;
use std::path::Path;
use std::rc::Rc;

/// An embeddable Kestrel virtual machine.
///
/// Every fallible method returns a [`VmError`] and also records it in the
/// instance's error state, notifying the error callback if one is set.
#[derive(Debug, Default)]
pub struct Vm {
    pub(crate) stack: Stack,
    pub(crate) chunk: Option<Rc<Chunk>>,
    pub(crate) globals: Globals,
    pub(crate) hosts: HostRegistry,
    pub(crate) errors: ErrorState,
    pub(crate) config: VmConfig,
    pub(crate) depth: usize,
}

impl Vm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: VmConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: VmConfig) {
        self.config = config;
    }

    /// Record a failed result in the error state and pass it through.
    pub(crate) fn record<T>(&mut self, result: Result<T, VmError>) -> Result<T, VmError> {
        if let Err(err) = &result {
            self.errors.raise(err.status(), err.to_string());
        }
        result
    }

    // ---- Stack ----

    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub fn push_i64(&mut self, value: i64) {
        self.push(Value::I64(value));
    }

    pub fn push_f64(&mut self, value: f64) {
        self.push(Value::F64(value));
    }

    pub fn push_bool(&mut self, value: bool) {
        self.push(Value::Bool(value));
    }

    pub fn push_null(&mut self) {
        self.push(Value::Null);
    }

    /// Push a copy of `bytes` as a string value.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.push(Value::string(bytes));
    }

    /// The value at `index`; `None` if out of range.
    pub fn value(&self, index: i32) -> Option<&Value> {
        self.stack.get(index)
    }

    /// Whether the value at `index` has tag `tag`. False if out of range.
    pub fn is_type(&self, index: i32, tag: TypeTag) -> bool {
        self.value(index).is_some_and(|v| v.type_tag() == tag)
    }

    /// Integer at `index`, or `0` on a missing or non-integer slot.
    pub fn to_i64(&self, index: i32) -> i64 {
        self.value(index).and_then(Value::as_i64).unwrap_or(0)
    }

    /// Float at `index`, or `0.0` on a missing or non-float slot.
    pub fn to_f64(&self, index: i32) -> f64 {
        self.value(index).and_then(Value::as_f64).unwrap_or(0.0)
    }

    /// Boolean at `index`, or `false` on a missing or non-bool slot.
    pub fn to_bool(&self, index: i32) -> bool {
        self.value(index).and_then(Value::as_bool).unwrap_or(false)
    }

    /// String bytes at `index`. Borrowed from the slot, so valid until the
    /// stack next changes.
    pub fn to_bytes(&self, index: i32) -> Option<&[u8]> {
        self.value(index).and_then(Value::as_bytes)
    }

    /// Height of the current window.
    pub fn top(&self) -> usize {
        self.stack.height()
    }

    pub fn set_top(&mut self, height: usize) {
        self.stack.set_top(height);
    }

    pub fn pop(&mut self, count: usize) {
        self.stack.pop(count);
    }

    // ---- Globals ----

    /// Pop the top value and bind it to `name`.
    pub fn set_global(&mut self, name: &str) -> Result<(), VmError> {
        let result = self.set_global_inner(name);
        self.record(result)
    }

    fn set_global_inner(&mut self, name: &str) -> Result<(), VmError> {
        if name.is_empty() {
            return Err(VmError::EmptyName { what: "global" });
        }
        let value = self.stack.take_top().ok_or(VmError::EmptyStack)?;
        self.globals.set(name.as_bytes(), value);
        Ok(())
    }

    /// Push the value bound to `name`. The stack is untouched on failure.
    pub fn get_global(&mut self, name: &str) -> Result<(), VmError> {
        let result = self.get_global_inner(name);
        self.record(result)
    }

    fn get_global_inner(&mut self, name: &str) -> Result<(), VmError> {
        if name.is_empty() {
            return Err(VmError::EmptyName { what: "global" });
        }
        let value = self
            .globals
            .get(name.as_bytes())
            .cloned()
            .ok_or_else(|| VmError::GlobalNotFound {
                name: name.to_owned(),
            })?;
        self.stack.push(value);
        Ok(())
    }

    // ---- Host functions ----

    /// Register a host function taking `arity` arguments. Replaces any
    /// earlier registration of the same name.
    pub fn register_function(
        &mut self,
        name: &str,
        arity: usize,
        func: impl Fn(&mut Vm) -> Status + 'static,
    ) -> Result<(), VmError> {
        if name.is_empty() {
            return self.record(Err(VmError::EmptyName { what: "function" }));
        }
        let replaced = self.hosts.register(name, HostFunction::new(arity, func));
        debug!("registered host function '{name}' (arity {arity}, replaced: {replaced})");
        Ok(())
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.hosts.contains(name)
            || self
                .chunk
                .as_ref()
                .is_some_and(|chunk| chunk.function_index(name).is_some())
    }

    // ---- Calls ----

    /// Call `name` with the top `argc` values as arguments.
    ///
    /// Host functions shadow bytecode functions of the same name. A host
    /// function sees only its arguments; it must remove them and push its
    /// results. A bytecode function replaces its arguments with exactly
    /// one result.
    pub fn call(&mut self, name: &str, argc: usize) -> Result<(), VmError> {
        let result = self.call_inner(name, argc);
        self.record(result)
    }

    /// Same as [`Vm::call`]. Failures are always returned, never unwound.
    pub fn pcall(&mut self, name: &str, argc: usize) -> Result<(), VmError> {
        self.call(name, argc)
    }

    fn call_inner(&mut self, name: &str, argc: usize) -> Result<(), VmError> {
        if name.is_empty() {
            return Err(VmError::EmptyName { what: "function" });
        }
        let available = self.stack.height();
        if argc > available {
            return Err(VmError::NotEnoughArguments {
                requested: argc,
                available,
            });
        }

        if let Some(host) = self.hosts.get(name).cloned() {
            if host.arity != argc {
                return Err(VmError::ArityMismatch {
                    name: name.to_owned(),
                    expected: host.arity,
                    found: argc,
                });
            }
            debug!("call host '{name}' with {argc} arguments");
            return self.call_host(name, &host, argc);
        }

        let chunk = self
            .chunk
            .clone()
            .ok_or_else(|| VmError::FunctionNotFound {
                name: name.to_owned(),
            })?;
        let index = chunk
            .function_index(name)
            .ok_or_else(|| VmError::FunctionNotFound {
                name: name.to_owned(),
            })?;
        let arity = chunk.functions[index].arity as usize;
        if arity != argc {
            return Err(VmError::ArityMismatch {
                name: name.to_owned(),
                expected: arity,
                found: argc,
            });
        }
        debug!("call bytecode '{name}' with {argc} arguments");
        self.run_function(&chunk, index)?;
        Ok(())
    }

    fn call_host(&mut self, name: &str, host: &HostFunction, argc: usize) -> Result<(), VmError> {
        if self.depth >= self.config.max_call_depth {
            return Err(VmError::CallDepthExceeded {
                limit: self.config.max_call_depth,
            });
        }
        let status = self.invoke_host(host, argc);
        if status.is_ok() {
            Ok(())
        } else {
            Err(VmError::HostFailed {
                name: name.to_owned(),
                status,
            })
        }
    }

    /// Run a host callable with the top `argc` values as its window.
    pub(crate) fn invoke_host(&mut self, host: &HostFunction, argc: usize) -> Status {
        let old_base = self.stack.open_window(argc);
        self.depth += 1;
        let status = host.invoke(self);
        self.depth -= 1;
        self.stack.close_window(old_base);
        status
    }

    // ---- Chunks ----

    /// Decode, verify and install a chunk, replacing the current one.
    ///
    /// Nothing changes unless both steps succeed.
    pub fn load_chunk(&mut self, bytes: &[u8]) -> Result<(), VmError> {
        let result = Self::prepare_chunk(bytes).map(|chunk| self.install(chunk));
        self.record(result)
    }

    fn prepare_chunk(bytes: &[u8]) -> Result<Chunk, VmError> {
        if bytes.is_empty() {
            return Err(VmError::EmptyChunk);
        }
        let chunk = Chunk::decode(bytes)?;
        kestrel_verifier::verify(&chunk).map_err(VmError::Verify)?;
        Ok(chunk)
    }

    fn install(&mut self, chunk: Chunk) {
        debug!(
            "loaded chunk: {} constants, {} functions (replacing: {})",
            chunk.constants.len(),
            chunk.functions.len(),
            self.chunk.is_some()
        );
        self.chunk = Some(Rc::new(chunk));
    }

    /// Read a chunk file and load it.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), VmError> {
        let path = path.as_ref();
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(source) => {
                return self.record(Err(VmError::Io {
                    path: path.to_path_buf(),
                    source,
                }))
            }
        };
        self.load_chunk(&bytes)
    }

    /// Write the loaded chunk to `path` in the binary format.
    pub fn save_file(&mut self, path: impl AsRef<Path>) -> Result<(), VmError> {
        let path = path.as_ref();
        let result = match &self.chunk {
            None => Err(VmError::NoChunk),
            Some(chunk) => std::fs::write(path, chunk.encode()).map_err(|source| VmError::Write {
                path: path.to_path_buf(),
                source,
            }),
        };
        self.record(result)
    }

    pub fn has_chunk(&self) -> bool {
        self.chunk.is_some()
    }

    pub fn chunk(&self) -> Option<&Chunk> {
        self.chunk.as_deref()
    }

    // ---- Error state ----

    pub fn has_error(&self) -> bool {
        self.errors.has_error()
    }

    /// Message of the last recorded failure.
    pub fn error(&self) -> Option<&str> {
        self.errors.message()
    }

    /// Status of the last recorded failure.
    pub fn error_status(&self) -> Option<Status> {
        self.errors.status()
    }

    pub fn error_state(&self) -> &ErrorState {
        &self.errors
    }

    pub fn clear_error(&mut self) {
        self.errors.clear();
    }

    pub fn set_error_callback(&mut self, callback: Option<ErrorCallback>) {
        self.errors.set_callback(callback);
    }

    /// Record a failure from host code, e.g. before returning an error
    /// status from a host function.
    pub fn raise_error(&mut self, status: Status, message: impl Into<String>) {
        self.errors.raise(status, message);
    }
}
