//! Types shared with C.

use std::ffi::{c_char, c_void};

/// Result code of every fallible `kestrel_*` function (`kestrel_result`).
pub type KestrelResult = kestrel_vm::Status;

/// Opaque VM handle (`kestrel_vm`). Created by `kestrel_vm_new`, released
/// by `kestrel_vm_free`.
#[repr(C)]
pub struct KestrelVm {
    _private: [u8; 0],
}

/// Error notification: receives the NUL-terminated message and the user
/// data given at registration. The message is only valid during the call.
pub type KestrelErrorFn = Option<unsafe extern "C" fn(message: *const c_char, userdata: *mut c_void)>;

/// Host function. Arguments are at indices `0..arity` of the stack it
/// sees; it removes them, pushes its results and returns a result code.
pub type KestrelCFunc = unsafe extern "C" fn(vm: *mut KestrelVm) -> KestrelResult;
