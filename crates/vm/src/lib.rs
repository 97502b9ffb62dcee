//! Kestrel virtual machine: an embeddable, stack-based runtime.
//!
//! A [`Vm`] owns:
//! - a value stack the host pushes arguments onto and reads results from
//! - a global table keyed by name
//! - host functions registered by the embedder
//! - at most one verified bytecode [`Chunk`](kestrel_common::Chunk)
//! - an error state with an optional notification callback
//!
//! # Usage
//!
//! ```
//! use kestrel_common::{Chunk, Function, Instruction, Opcode, TypeTag, Value};
//! use kestrel_vm::{Status, Vm};
//!
//! let chunk = Chunk::new(
//!     vec![Value::string("twice")],
//!     vec![Function::new(
//!         "quad",
//!         1,
//!         1,
//!         vec![
//!             Instruction::with_arg(Opcode::LoadLocal, 0),
//!             Instruction::new(Opcode::CallHost, TypeTag::None, 0, 1, 0),
//!             Instruction::new(Opcode::CallHost, TypeTag::None, 0, 1, 0),
//!             Instruction::simple(Opcode::Ret),
//!         ],
//!     )],
//! );
//!
//! let mut vm = Vm::new();
//! vm.register_function("twice", 1, |vm| {
//!     let x = vm.to_i64(0);
//!     vm.pop(1);
//!     vm.push_i64(x * 2);
//!     Status::Ok
//! })
//! .unwrap();
//! vm.load_chunk(&chunk.encode()).unwrap();
//!
//! vm.push_i64(5);
//! vm.call("quad", 1).unwrap();
//! assert_eq!(vm.to_i64(-1), 20);
//! ```

pub mod config;
pub mod error;
mod execute;
pub mod globals;
pub mod host;
pub mod machine;
pub mod report;
pub mod stack;
pub mod status;

pub use config::VmConfig;
pub use error::{RuntimeError, TrapKind, VmError};
pub use host::{HostFn, HostFunction};
pub use machine::Vm;
pub use report::{ErrorCallback, ErrorRecord, ErrorState};
pub use status::Status;
