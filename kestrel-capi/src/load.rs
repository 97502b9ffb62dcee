//! Loading and saving bytecode chunks.

use crate::call::result_code;
use crate::types::{KestrelResult, KestrelVm};
use crate::vm_ffi::vm_mut;
use kestrel_vm::Status;
use std::ffi::{c_char, CStr, OsStr};
use std::path::Path;

/// Decode, verify and install a chunk from `len` bytes at `data`,
/// replacing the current chunk only on success.
///
/// Returns `ERROR_INVALID_ARG` for NULL or empty input and
/// `ERROR_VERIFY` for bytes that are not a valid chunk.
///
/// # Safety
/// `vm` must be null or a live handle; `data` must be null or point to
/// `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn kestrel_load_chunk(vm: *mut KestrelVm, data: *const u8, len: usize) -> KestrelResult {
    let Some(vm) = vm_mut(vm) else {
        return Status::ErrorInvalidArg;
    };
    if data.is_null() {
        vm.raise_error(Status::ErrorInvalidArg, "chunk buffer is null");
        return Status::ErrorInvalidArg;
    }
    let bytes = if len == 0 {
        &[][..]
    } else {
        std::slice::from_raw_parts(data, len)
    };
    result_code(vm.load_chunk(bytes))
}

/// Read a chunk file and load it. `ERROR_NOT_FOUND` if it cannot be read.
///
/// # Safety
/// `vm` must be null or a live handle; `path` must be null or a
/// NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn kestrel_load_file(vm: *mut KestrelVm, path: *const c_char) -> KestrelResult {
    let Some(vm) = vm_mut(vm) else {
        return Status::ErrorInvalidArg;
    };
    let Some(path) = path_arg(vm, path) else {
        return Status::ErrorInvalidArg;
    };
    result_code(vm.load_file(path))
}

/// Write the loaded chunk to `path`. `ERROR_INVALID_ARG` if nothing is
/// loaded, `ERROR_RUNTIME` if the write fails.
///
/// # Safety
/// `vm` must be null or a live handle; `path` must be null or a
/// NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn kestrel_save_file(vm: *mut KestrelVm, path: *const c_char) -> KestrelResult {
    let Some(vm) = vm_mut(vm) else {
        return Status::ErrorInvalidArg;
    };
    let Some(path) = path_arg(vm, path) else {
        return Status::ErrorInvalidArg;
    };
    result_code(vm.save_file(path))
}

unsafe fn path_arg<'a>(vm: &mut kestrel_vm::Vm, path: *const c_char) -> Option<&'a Path> {
    if path.is_null() {
        vm.raise_error(Status::ErrorInvalidArg, "path is null");
        return None;
    }
    let bytes = CStr::from_ptr(path).to_bytes();
    os_path(vm, bytes)
}

#[cfg(unix)]
fn os_path<'a>(_vm: &mut kestrel_vm::Vm, bytes: &'a [u8]) -> Option<&'a Path> {
    use std::os::unix::ffi::OsStrExt;
    Some(Path::new(OsStr::from_bytes(bytes)))
}

#[cfg(not(unix))]
fn os_path<'a>(vm: &mut kestrel_vm::Vm, bytes: &'a [u8]) -> Option<&'a Path> {
    match std::str::from_utf8(bytes) {
        Ok(path) => Some(Path::new(OsStr::new(path))),
        Err(_) => {
            vm.raise_error(Status::ErrorInvalidArg, "path is not valid UTF-8");
            None
        }
    }
}
