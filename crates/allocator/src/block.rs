//! Handle to one allocated block.

use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;

/// A block handed out by [`BlockAllocator::alloc`](crate::BlockAllocator::alloc).
///
/// The handle owns the block's bytes and borrows the allocator, so it cannot
/// outlive teardown. It is not `Clone`: giving it back through `free`
/// consumes it. Dropping it without freeing parks the block until the
/// allocator is torn down.
///
/// The handle remembers which allocator produced it, so `free` on any other
/// allocator is refused.
pub struct Block<'a> {
    ptr: NonNull<u8>,
    len: usize,
    owner: usize,
    _owner: PhantomData<&'a ()>,
}

// SAFETY: a block is exclusively owned memory, like `&mut [u8]`.
unsafe impl Send for Block<'_> {}
unsafe impl Sync for Block<'_> {}

impl<'a> Block<'a> {
    pub(crate) fn new(ptr: NonNull<u8>, len: usize, owner: usize) -> Self {
        Self {
            ptr,
            len,
            owner,
            _owner: PhantomData,
        }
    }

    pub(crate) fn owner(&self) -> usize {
        self.owner
    }

    /// Releases the borrow. The caller becomes responsible for returning the
    /// pointer through `free_raw` (or rebuilding it with
    /// [`BlockAllocator::block_from_raw`](crate::BlockAllocator::block_from_raw))
    /// before the allocator goes away.
    pub fn into_raw(self) -> NonNull<u8> {
        self.ptr
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: the block is `len` initialised bytes owned by this handle.
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: as above, and `&mut self` makes the access unique.
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl fmt::Debug for Block<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}
