#![allow(dead_code)]

use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use allocator::{SegmentSource, SystemSource};
use map::{MapAttr, MapFlags, MapType};

pub fn u32_attr(max_entries: u32) -> MapAttr {
    MapAttr::new(MapType::Hashtable, 4, 4, max_entries, MapFlags::empty())
}

pub fn k(v: u32) -> [u8; 4] {
    v.to_ne_bytes()
}

#[derive(Debug, Default)]
pub struct Counters {
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
}

/// Records segment traffic so tests can check teardown.
#[derive(Debug, Clone, Default)]
pub struct CountingSource {
    pub counters: Arc<Counters>,
}

unsafe impl SegmentSource for CountingSource {
    fn acquire(&self, layout: Layout) -> Option<NonNull<u8>> {
        let ptr = SystemSource.acquire(layout)?;
        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        Some(ptr)
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
        unsafe { SystemSource.release(ptr, layout) }
    }
}
