//! Error state access from C.

use crate::types::KestrelVm;
use crate::vm_ffi::{vm_mut, vm_ref};
use std::ffi::c_char;
use std::ptr;

/// Whether a failure is recorded.
///
/// # Safety
/// `vm` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn kestrel_has_error(vm: *const KestrelVm) -> bool {
    vm_ref(vm).is_some_and(|vm| vm.has_error())
}

/// Message of the last recorded failure, or NULL if none. Valid until the
/// next failure or `kestrel_clear_error`.
///
/// # Safety
/// `vm` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn kestrel_get_error(vm: *const KestrelVm) -> *const c_char {
    vm_ref(vm)
        .and_then(|vm| vm.error_state().record())
        .map_or(ptr::null(), |record| record.c_message().as_ptr())
}

/// Forget the recorded failure. Clearing twice is fine.
///
/// # Safety
/// `vm` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn kestrel_clear_error(vm: *mut KestrelVm) {
    if let Some(vm) = vm_mut(vm) {
        vm.clear_error();
    }
}
