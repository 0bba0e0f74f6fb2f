#![cfg_attr(not(test), no_std)]
//! ABI records shared by the allocator, map and program crates.
//!
//! Everything that crosses the user/kernel boundary lives here: the error
//! taxonomy and its errno mapping, map and program attribute records, the
//! per-call update flag and the fixed-width instruction record.

pub mod result;
pub use result::{Error, Result};

pub mod map;
pub use map::{MapAttr, MapFlags, MapType, UpdateFlag};

pub mod prog;
pub use prog::{ProgAttr, ProgType};

pub mod instruction;
pub use instruction::Instruction;
