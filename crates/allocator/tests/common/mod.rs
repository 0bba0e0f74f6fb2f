use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use allocator::{SegmentSource, SystemSource};

/// Shared view of what a `CountingSource` did, readable after the
/// allocator that owned the source is gone.
#[derive(Debug, Default)]
pub struct Counters {
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
    /// Remaining successful acquisitions before failing; `usize::MAX` = unlimited.
    pub budget: AtomicUsize,
    pub fail: AtomicBool,
}

impl Counters {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

/// System-backed source that records every segment request.
#[derive(Debug, Clone)]
pub struct CountingSource {
    pub counters: Arc<Counters>,
}

impl CountingSource {
    pub fn new() -> Self {
        Self::with_budget(usize::MAX)
    }

    pub fn with_budget(budget: usize) -> Self {
        let counters = Counters::default();
        counters.budget.store(budget, Ordering::SeqCst);
        Self { counters: Arc::new(counters) }
    }
}

unsafe impl SegmentSource for CountingSource {
    fn acquire(&self, layout: Layout) -> Option<NonNull<u8>> {
        if self.counters.fail.load(Ordering::SeqCst) {
            return None;
        }
        let granted = self
            .counters
            .budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                0 => None,
                usize::MAX => Some(usize::MAX),
                n => Some(n - 1),
            })
            .is_ok();
        if !granted {
            return None;
        }
        let ptr = SystemSource.acquire(layout)?;
        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        Some(ptr)
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
        unsafe { SystemSource.release(ptr, layout) }
    }
}
