#![cfg_attr(not(test), no_std)]
//! Capacity-bounded key/value maps for the eBPF runtime.
//!
//! [`Map`] validates the creation attributes and dispatches to a
//! [`MapBackend`]. The only backend in this crate is [`HashtableMap`], whose
//! elements live in blocks of a per-map [`allocator::BlockAllocator`].

extern crate alloc;

pub mod config;
pub use config::MapConfig;

pub mod backend;
pub use backend::MapBackend;

mod element;

pub mod hashtable;
pub use hashtable::HashtableMap;

pub mod map;
pub use map::Map;

pub use types::{Error, MapAttr, MapFlags, MapType, Result, UpdateFlag};
