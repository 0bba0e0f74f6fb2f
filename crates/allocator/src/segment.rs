//! Raw memory segments and the source they come from.

use core::alloc::Layout;
use core::mem::{align_of, size_of};
use core::ptr::NonNull;

use crate::{align_up, ALIGN};

/// Where segments come from.
///
/// # Safety
///
/// `acquire` must return memory that is valid for reads and writes of
/// `layout.size()` bytes, aligned to `layout.align()`, and not handed to
/// anyone else until it is given back through `release`.
pub unsafe trait SegmentSource: Send + Sync {
    /// Returns `None` when the system is out of memory.
    fn acquire(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// # Safety
    ///
    /// `ptr` must come from `acquire(layout)` on this source and must not be
    /// released twice.
    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout);
}

/// Segments straight from the global allocator.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemSource;

unsafe impl SegmentSource for SystemSource {
    fn acquire(&self, layout: Layout) -> Option<NonNull<u8>> {
        // SAFETY: segment layouts are never zero-sized.
        NonNull::new(unsafe { alloc::alloc::alloc(layout) })
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded from the caller's contract.
        unsafe { alloc::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

/// Bookkeeping written at the head of every segment.
#[repr(C)]
pub(crate) struct SegmentHeader {
    next: Option<NonNull<SegmentHeader>>,
    layout: Layout,
    blocks: usize,
}

pub(crate) const HEADER_SIZE: usize = size_of::<SegmentHeader>();
pub(crate) const SEGMENT_ALIGN: usize = align_of::<SegmentHeader>();

/// Bytes to request for one segment: a page, or more if a single block plus
/// header and alignment slack does not fit in a page. `None` when that size
/// is not representable.
pub(crate) const fn segment_size(page_size: usize, block_size: usize) -> Option<usize> {
    let Some(minimum) = block_size.checked_add(HEADER_SIZE + ALIGN) else {
        return None;
    };
    if page_size < minimum { Some(minimum) } else { Some(page_size) }
}

/// Offset of the first block from the segment base.
pub(crate) fn data_offset(base: NonNull<u8>) -> usize {
    let addr = base.as_ptr() as usize;
    align_up(addr + HEADER_SIZE, ALIGN) - addr
}

/// Number of blocks a segment of `size` bytes at `base` is carved into.
pub(crate) fn blocks_in(base: NonNull<u8>, size: usize, block_size: usize) -> usize {
    size.saturating_sub(data_offset(base)) / block_size
}

/// A freshly acquired segment with its header written.
pub(crate) struct Carved {
    pub header: NonNull<SegmentHeader>,
    pub first: NonNull<u8>,
    pub blocks: usize,
}

/// Writes the header of a new segment and locates its first block. `None`
/// if not even one block fits; the segment is then left untouched.
///
/// # Safety
///
/// `base` must be a live segment of `layout` just returned by a source.
pub(crate) unsafe fn carve(base: NonNull<u8>, layout: Layout, block_size: usize) -> Option<Carved> {
    let blocks = blocks_in(base, layout.size(), block_size);
    if blocks == 0 || layout.size() < HEADER_SIZE {
        return None;
    }
    let header = base.cast::<SegmentHeader>();
    // SAFETY: the segment is at least HEADER_SIZE bytes and SEGMENT_ALIGN aligned.
    unsafe {
        header.as_ptr().write(SegmentHeader {
            next: None,
            layout,
            blocks,
        });
    }
    // SAFETY: at least one block fits past data_offset.
    let first = unsafe { base.add(data_offset(base)) };
    Some(Carved {
        header,
        first,
        blocks,
    })
}

/// Every segment an allocator owns, linked through their headers.
pub(crate) struct SegmentList {
    head: Option<NonNull<SegmentHeader>>,
    len: usize,
}

// SAFETY: the list exclusively owns the segments it links.
unsafe impl Send for SegmentList {}

impl SegmentList {
    pub const fn new() -> Self {
        Self { head: None, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// # Safety
    ///
    /// `header` must head a segment produced by [`carve`] that is not yet in
    /// any list.
    pub unsafe fn push(&mut self, header: NonNull<SegmentHeader>) {
        // SAFETY: header is live and exclusively ours.
        unsafe { (*header.as_ptr()).next = self.head };
        self.head = Some(header);
        self.len += 1;
    }

    /// True if `ptr..ptr+len` lies in the data area of one of the segments.
    pub fn contains(&self, ptr: NonNull<u8>, len: usize) -> bool {
        let addr = ptr.as_ptr() as usize;
        let mut cursor = self.head;
        while let Some(header) = cursor {
            // SAFETY: every linked header is a live segment.
            let seg = unsafe { header.as_ref() };
            let base = header.as_ptr() as usize;
            let start = base + data_offset(header.cast());
            let end = start + seg.blocks * len;
            if addr >= start && addr + len <= end && (addr - start) % len == 0 {
                return true;
            }
            cursor = seg.next;
        }
        false
    }

    /// Unlinks every segment and hands each one back to `source`.
    ///
    /// # Safety
    ///
    /// No block carved from these segments may be used afterwards.
    pub unsafe fn release_all<S: SegmentSource>(&mut self, source: &S) -> usize {
        let mut released = 0;
        while let Some(header) = self.head {
            // SAFETY: the header is live until released below.
            let (next, layout) = unsafe {
                let seg = header.as_ref();
                (seg.next, seg.layout)
            };
            self.head = next;
            // SAFETY: the segment came from `source` with this layout.
            unsafe { source.release(header.cast(), layout) };
            released += 1;
        }
        self.len = 0;
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_blocks_fit_in_one_page() {
        assert_eq!(segment_size(4096, 8), Some(4096));
        assert_eq!(segment_size(4096, 4096), Some(HEADER_SIZE + 4096 + ALIGN));
    }

    #[test]
    fn unrepresentable_segment_size_is_none() {
        assert_eq!(segment_size(4096, usize::MAX & !(ALIGN - 1)), None);
    }

    #[test]
    fn carve_refuses_a_segment_without_room_for_a_block() {
        let layout = Layout::from_size_align(4096, SEGMENT_ALIGN).unwrap();
        let base = SystemSource.acquire(layout).unwrap();
        assert!(unsafe { carve(base, layout, 8192) }.is_none());
        unsafe { SystemSource.release(base, layout) };
    }

    #[test]
    fn oversized_blocks_get_one_per_segment() {
        let block_size = 3 * 4096;
        let size = segment_size(4096, block_size).unwrap();
        let layout = Layout::from_size_align(size, SEGMENT_ALIGN).unwrap();
        let base = SystemSource.acquire(layout).unwrap();
        assert_eq!(blocks_in(base, size, block_size), 1);
        unsafe { SystemSource.release(base, layout) };
    }
}
