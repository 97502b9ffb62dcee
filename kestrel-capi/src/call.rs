//! Calls, host function registration and globals.

use crate::types::{KestrelCFunc, KestrelResult, KestrelVm};
use crate::vm_ffi::{handle, vm_mut};
use kestrel_vm::{Status, Vm, VmError};
use std::ffi::{c_char, CStr};

/// Collapse a VM result into a C result code. The VM has already
/// recorded any failure.
pub(crate) fn result_code(result: Result<(), VmError>) -> KestrelResult {
    match result {
        Ok(()) => Status::Ok,
        Err(err) => err.status(),
    }
}

/// Read a NUL-terminated UTF-8 name, recording a failure if it is null or
/// not UTF-8.
///
/// # Safety
/// `name` must be null or point to a NUL-terminated string.
pub(crate) unsafe fn name_arg<'a>(vm: &mut Vm, name: *const c_char, what: &str) -> Option<&'a str> {
    if name.is_null() {
        vm.raise_error(Status::ErrorInvalidArg, format!("{what} is null"));
        return None;
    }
    match CStr::from_ptr(name).to_str() {
        Ok(name) => Some(name),
        Err(_) => {
            vm.raise_error(Status::ErrorInvalidArg, format!("{what} is not valid UTF-8"));
            None
        }
    }
}

/// Convert a C count, recording a failure if it is negative.
fn count_arg(vm: &mut Vm, count: i32, what: &str) -> Option<usize> {
    match usize::try_from(count) {
        Ok(count) => Some(count),
        Err(_) => {
            vm.raise_error(Status::ErrorInvalidArg, format!("negative {what}: {count}"));
            None
        }
    }
}

/// Call a host or bytecode function with the top `nargs` values as its
/// arguments. Host functions shadow bytecode functions of the same name.
///
/// Returns `ERROR_NOT_FOUND` for an unknown name, `ERROR_INVALID_ARG` for
/// a bad name or argument count, or the callee's failure code.
///
/// # Safety
/// `vm` must be null or a live handle; `name` must be null or a
/// NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn kestrel_call(vm: *mut KestrelVm, name: *const c_char, nargs: i32) -> KestrelResult {
    let Some(vm) = vm_mut(vm) else {
        return Status::ErrorInvalidArg;
    };
    let Some(name) = name_arg(vm, name, "function name") else {
        return Status::ErrorInvalidArg;
    };
    let Some(nargs) = count_arg(vm, nargs, "argument count") else {
        return Status::ErrorInvalidArg;
    };
    result_code(vm.call(name, nargs))
}

/// Same as `kestrel_call`: failures are already returned as result codes.
///
/// # Safety
/// Same as `kestrel_call`.
#[no_mangle]
pub unsafe extern "C" fn kestrel_pcall(vm: *mut KestrelVm, name: *const c_char, nargs: i32) -> KestrelResult {
    kestrel_call(vm, name, nargs)
}

/// Register `func` under `name`, replacing any earlier registration.
///
/// # Safety
/// `vm` must be null or a live handle; `name` must be null or a
/// NUL-terminated string; `func` must stay callable for the VM's lifetime.
#[no_mangle]
pub unsafe extern "C" fn kestrel_register_function(
    vm: *mut KestrelVm,
    name: *const c_char,
    func: Option<KestrelCFunc>,
    arity: i32,
) -> KestrelResult {
    let Some(vm) = vm_mut(vm) else {
        return Status::ErrorInvalidArg;
    };
    let Some(name) = name_arg(vm, name, "function name") else {
        return Status::ErrorInvalidArg;
    };
    let Some(arity) = count_arg(vm, arity, "arity") else {
        return Status::ErrorInvalidArg;
    };
    let Some(func) = func else {
        vm.raise_error(
            Status::ErrorInvalidArg,
            format!("function pointer for '{name}' is null"),
        );
        return Status::ErrorInvalidArg;
    };
    result_code(vm.register_function(name, arity, move |vm| {
        // SAFETY: the host promised `func` is callable; the handle is the
        // VM that is currently running it.
        unsafe { func(handle(vm)) }
    }))
}

/// Pop the top value and bind it to the global `name`.
///
/// # Safety
/// `vm` must be null or a live handle; `name` must be null or a
/// NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn kestrel_set_global(vm: *mut KestrelVm, name: *const c_char) -> KestrelResult {
    let Some(vm) = vm_mut(vm) else {
        return Status::ErrorInvalidArg;
    };
    let Some(name) = name_arg(vm, name, "global name") else {
        return Status::ErrorInvalidArg;
    };
    result_code(vm.set_global(name))
}

/// Push the value of the global `name`. `ERROR_NOT_FOUND` if unbound; the
/// stack is unchanged on failure.
///
/// # Safety
/// `vm` must be null or a live handle; `name` must be null or a
/// NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn kestrel_get_global(vm: *mut KestrelVm, name: *const c_char) -> KestrelResult {
    let Some(vm) = vm_mut(vm) else {
        return Status::ErrorInvalidArg;
    };
    let Some(name) = name_arg(vm, name, "global name") else {
        return Status::ErrorInvalidArg;
    };
    result_code(vm.get_global(name))
}
