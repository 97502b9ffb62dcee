//! Stack access from C.
//!
//! Indices follow the usual convention: `0` is the bottom of the current
//! stack, `-1` the top. Out-of-range reads return `false`, `0`, `0.0` or
//! NULL; they never touch memory outside the stack.

use crate::types::KestrelVm;
use crate::vm_ffi::{vm_mut, vm_ref};
use kestrel_common::TypeTag;
use std::ffi::c_char;
use std::ptr;

// ---- Push ----

/// # Safety
/// `vm` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn kestrel_push_null(vm: *mut KestrelVm) {
    if let Some(vm) = vm_mut(vm) {
        vm.push_null();
    }
}

/// # Safety
/// `vm` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn kestrel_push_bool(vm: *mut KestrelVm, value: bool) {
    if let Some(vm) = vm_mut(vm) {
        vm.push_bool(value);
    }
}

/// # Safety
/// `vm` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn kestrel_push_i64(vm: *mut KestrelVm, value: i64) {
    if let Some(vm) = vm_mut(vm) {
        vm.push_i64(value);
    }
}

/// # Safety
/// `vm` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn kestrel_push_f64(vm: *mut KestrelVm, value: f64) {
    if let Some(vm) = vm_mut(vm) {
        vm.push_f64(value);
    }
}

/// Push a copy of `len` bytes at `data`. The bytes need not be UTF-8 or
/// NUL-terminated. NULL `data` with `len == 0` pushes an empty string;
/// NULL with a nonzero `len` pushes null. Either way the height grows by one.
///
/// # Safety
/// `vm` must be null or a live handle; `data` must point to `len`
/// readable bytes unless `len` is zero.
#[no_mangle]
pub unsafe extern "C" fn kestrel_push_string(vm: *mut KestrelVm, data: *const c_char, len: usize) {
    let Some(vm) = vm_mut(vm) else {
        return;
    };
    if len == 0 {
        vm.push_bytes(&[]);
    } else if data.is_null() {
        vm.push_null();
    } else {
        vm.push_bytes(std::slice::from_raw_parts(data as *const u8, len));
    }
}

// ---- Type checks ----

unsafe fn is_tag(vm: *const KestrelVm, index: i32, tag: TypeTag) -> bool {
    vm_ref(vm).is_some_and(|vm| vm.is_type(index, tag))
}

/// # Safety
/// `vm` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn kestrel_is_null(vm: *const KestrelVm, index: i32) -> bool {
    is_tag(vm, index, TypeTag::Null)
}

/// # Safety
/// `vm` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn kestrel_is_bool(vm: *const KestrelVm, index: i32) -> bool {
    is_tag(vm, index, TypeTag::Bool)
}

/// # Safety
/// `vm` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn kestrel_is_i64(vm: *const KestrelVm, index: i32) -> bool {
    is_tag(vm, index, TypeTag::I64)
}

/// # Safety
/// `vm` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn kestrel_is_f64(vm: *const KestrelVm, index: i32) -> bool {
    is_tag(vm, index, TypeTag::F64)
}

/// # Safety
/// `vm` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn kestrel_is_string(vm: *const KestrelVm, index: i32) -> bool {
    is_tag(vm, index, TypeTag::Str)
}

// ---- Typed reads ----

/// # Safety
/// `vm` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn kestrel_to_bool(vm: *const KestrelVm, index: i32) -> bool {
    vm_ref(vm).is_some_and(|vm| vm.to_bool(index))
}

/// # Safety
/// `vm` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn kestrel_to_i64(vm: *const KestrelVm, index: i32) -> i64 {
    vm_ref(vm).map_or(0, |vm| vm.to_i64(index))
}

/// # Safety
/// `vm` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn kestrel_to_f64(vm: *const KestrelVm, index: i32) -> f64 {
    vm_ref(vm).map_or(0.0, |vm| vm.to_f64(index))
}

/// Borrow the bytes of the string at `index` and store their length in
/// `len` (if non-null). The data is not NUL-terminated and stays valid
/// only until the stack next changes. Returns NULL and length 0 when the
/// slot is missing or not a string.
///
/// # Safety
/// `vm` must be null or a live handle; `len` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn kestrel_to_string(
    vm: *const KestrelVm,
    index: i32,
    len: *mut usize,
) -> *const c_char {
    let bytes = vm_ref(vm).and_then(|vm| vm.to_bytes(index));
    if let Some(len) = len.as_mut() {
        *len = bytes.map_or(0, <[u8]>::len);
    }
    bytes.map_or(ptr::null(), |bytes| bytes.as_ptr() as *const c_char)
}

// ---- Height ----

/// Height of the stack visible to the caller.
///
/// # Safety
/// `vm` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn kestrel_get_top(vm: *const KestrelVm) -> i32 {
    vm_ref(vm).map_or(0, |vm| i32::try_from(vm.top()).unwrap_or(i32::MAX))
}

/// Resize the stack to `height`, discarding values or padding with null.
/// Negative heights are treated as zero.
///
/// # Safety
/// `vm` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn kestrel_set_top(vm: *mut KestrelVm, height: i32) {
    if let Some(vm) = vm_mut(vm) {
        vm.set_top(height.max(0) as usize);
    }
}

/// Remove the top `count` values. Negative counts are treated as zero.
///
/// # Safety
/// `vm` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn kestrel_pop(vm: *mut KestrelVm, count: i32) {
    if let Some(vm) = vm_mut(vm) {
        vm.pop(count.max(0) as usize);
    }
}
