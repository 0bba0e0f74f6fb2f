#![cfg_attr(not(test), no_std)]
//! Program loading for the eBPF runtime.
//!
//! Loading validates the request and copies the instruction stream into a
//! buffer the [`Program`] owns. Instruction contents are not inspected here.

extern crate alloc;

pub mod loader;
pub use loader::{init, Program};

pub use types::{Error, Instruction, ProgAttr, ProgType, Result};
