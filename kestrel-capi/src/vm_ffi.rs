//! VM lifecycle and configuration.

use crate::types::{KestrelErrorFn, KestrelVm};
use kestrel_vm::{Vm, VmConfig};
use log::debug;
use std::ffi::{c_void, CString};

/// Borrow the VM behind a handle, or `None` for null.
///
/// # Safety
/// `vm` must be null or a live handle from `kestrel_vm_new`, with no other
/// borrow of it active.
pub(crate) unsafe fn vm_mut<'a>(vm: *mut KestrelVm) -> Option<&'a mut Vm> {
    (vm as *mut Vm).as_mut()
}

/// Shared-borrow variant of [`vm_mut`].
///
/// # Safety
/// Same as [`vm_mut`].
pub(crate) unsafe fn vm_ref<'a>(vm: *const KestrelVm) -> Option<&'a Vm> {
    (vm as *const Vm).as_ref()
}

pub(crate) fn handle(vm: &mut Vm) -> *mut KestrelVm {
    vm as *mut Vm as *mut KestrelVm
}

/// Create a VM instance with default limits. Free it with
/// `kestrel_vm_free`.
#[no_mangle]
pub extern "C" fn kestrel_vm_new() -> *mut KestrelVm {
    let vm = Box::into_raw(Box::new(Vm::new())) as *mut KestrelVm;
    debug!("created VM {vm:p}");
    vm
}

/// Destroy a VM instance. Null is a no-op.
///
/// # Safety
/// `vm` must be null or a handle from `kestrel_vm_new` not yet freed.
#[no_mangle]
pub unsafe extern "C" fn kestrel_vm_free(vm: *mut KestrelVm) {
    if vm.is_null() {
        return;
    }
    debug!("freeing VM {vm:p}");
    drop(Box::from_raw(vm as *mut Vm));
}

/// Bound nested calls (bytecode frames plus host re-entry). Zero
/// restores the default.
///
/// # Safety
/// `vm` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn kestrel_set_call_depth_limit(vm: *mut KestrelVm, depth: usize) {
    if let Some(vm) = vm_mut(vm) {
        let depth = if depth == 0 {
            VmConfig::default().max_call_depth
        } else {
            depth
        };
        let config = vm.config().with_max_call_depth(depth);
        vm.set_config(config);
    }
}

/// Install an error callback, or remove it with NULL. `userdata` is passed
/// back on every call.
///
/// # Safety
/// `vm` must be null or a live handle. The callback must not call back
/// into the same VM.
#[no_mangle]
pub unsafe extern "C" fn kestrel_set_error_callback(
    vm: *mut KestrelVm,
    callback: KestrelErrorFn,
    userdata: *mut c_void,
) {
    let Some(vm) = vm_mut(vm) else {
        return;
    };
    match callback {
        None => vm.set_error_callback(None),
        Some(callback) => vm.set_error_callback(Some(Box::new(move |message: &str| {
            let message = CString::new(message.replace('\0', "\u{fffd}")).unwrap_or_default();
            // SAFETY: the host promised a callable function pointer.
            unsafe { callback(message.as_ptr(), userdata) }
        }))),
    }
}

/// Whether a chunk is loaded.
///
/// # Safety
/// `vm` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn kestrel_has_chunk(vm: *const KestrelVm) -> bool {
    vm_ref(vm).is_some_and(Vm::has_chunk)
}
