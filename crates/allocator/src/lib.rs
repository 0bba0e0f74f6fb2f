#![cfg_attr(not(test), no_std)]
//! Fixed-size block allocator backing the runtime's maps.
//!
//! Design at a glance:
//! - Memory is requested from a [`SegmentSource`] one segment at a time. A
//!   segment is at least one page and always fits a header plus one block.
//! - A new segment is carved into as many pointer-aligned blocks as fit. One
//!   goes straight to the caller that triggered the growth, the rest land on
//!   the free list.
//! - The free list is intrusive: a free block's first word links to the next
//!   free block, so returning a block never allocates.
//! - Only the free-list pop/push runs under the guard. Growth runs outside it
//!   unless [`GrowthPolicy::Serialized`] is selected, so two callers racing on
//!   an empty list may each add a segment. The extra blocks are simply kept.
//! - Segments are never returned individually; all of them go back to the
//!   source when the allocator is torn down.
//! - The allocator does not count live blocks. Capacity limits belong to the
//!   caller.

extern crate alloc;

pub mod config;
pub use config::{Config, GrowthPolicy, DEFAULT_PAGE_SIZE};

pub mod segment;
pub use segment::{SegmentSource, SystemSource};

mod free_list;

pub mod block;
pub use block::Block;

pub mod allocator;
pub use allocator::BlockAllocator;

pub use types::{Error, Result};

/// Block alignment and the granularity `block_size` must respect.
pub const ALIGN: usize = core::mem::size_of::<*const u8>();

/// Rounds `value` up to the next multiple of `align` (a power of two).
pub(crate) const fn align_up(value: usize, align: usize) -> usize {
    (value + (align - 1)) & !(align - 1)
}
