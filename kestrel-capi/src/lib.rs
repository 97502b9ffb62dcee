//! C ABI for embedding the Kestrel virtual machine.
//!
//! Every function takes the opaque `kestrel_vm *` handle returned by
//! [`kestrel_vm_new`] and tolerates NULL. Fallible functions return a
//! [`KestrelResult`] and record the same failure in the VM's error state,
//! readable through [`kestrel_get_error`]. The matching header is
//! `include/kestrel.h`.
//!
//! # Safety
//!
//! Handles must come from `kestrel_vm_new` and not be used after
//! `kestrel_vm_free`. A VM is single-threaded; host functions may call
//! back into the VM they are given, error callbacks may not.

pub mod call;
pub mod error;
pub mod load;
pub mod stack;
pub mod types;
pub mod vm_ffi;

pub use call::*;
pub use error::*;
pub use load::*;
pub use stack::*;
pub use types::*;
pub use vm_ffi::*;

use std::ffi::{c_char, c_int};

fn version_part(part: &str) -> c_int {
    part.parse().unwrap_or(0)
}

/// Library version as a NUL-terminated string.
#[no_mangle]
pub extern "C" fn kestrel_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn kestrel_version_major() -> c_int {
    version_part(env!("CARGO_PKG_VERSION_MAJOR"))
}

#[no_mangle]
pub extern "C" fn kestrel_version_minor() -> c_int {
    version_part(env!("CARGO_PKG_VERSION_MINOR"))
}

#[no_mangle]
pub extern "C" fn kestrel_version_patch() -> c_int {
    version_part(env!("CARGO_PKG_VERSION_PATCH"))
}
