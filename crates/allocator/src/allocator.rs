use core::alloc::Layout;
use core::ptr::NonNull;

use spin::Mutex;
use types::{Error, Result};

use crate::block::Block;
use crate::free_list::FreeList;
use crate::segment::{self, SegmentList, SegmentSource, SystemSource, SEGMENT_ALIGN};
use crate::{Config, GrowthPolicy, ALIGN};

/// Pool of `block_size`-byte blocks carved out of page-sized segments.
pub struct BlockAllocator<S: SegmentSource = SystemSource> {
    block_size: usize,
    config: Config,
    source: S,
    /// Free-list guard. The only lock on the alloc/free fast path.
    free: Mutex<FreeList>,
    segments: Mutex<SegmentList>,
    /// Held across growth when `GrowthPolicy::Serialized` is selected.
    grow: Mutex<()>,
}

impl BlockAllocator<SystemSource> {
    /// Allocator over the global heap with the default configuration.
    pub fn new(block_size: usize) -> Result<Self> {
        Self::with_config(block_size, Config::default())
    }

    pub fn with_config(block_size: usize, config: Config) -> Result<Self> {
        Self::with_source(block_size, config, SystemSource)
    }
}

impl<S: SegmentSource> BlockAllocator<S> {
    /// Fails with `InvalidArgument` unless `block_size` is a non-zero
    /// multiple of the pointer width and `config` is valid. The new
    /// allocator owns no segments.
    pub fn with_source(block_size: usize, config: Config, source: S) -> Result<Self> {
        if block_size == 0 || block_size % ALIGN != 0 {
            log::debug!("allocator init rejected: block_size={}", block_size);
            return Err(Error::InvalidArgument);
        }
        config.validate()?;
        Ok(Self {
            block_size,
            config,
            source,
            free: Mutex::new(FreeList::new()),
            segments: Mutex::new(SegmentList::new()),
            grow: Mutex::new(()),
        })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Segments acquired so far.
    pub fn segment_count(&self) -> usize {
        self.segments.lock().len()
    }

    /// Blocks currently on the free list.
    pub fn free_count(&self) -> usize {
        self.free.lock().len()
    }

    /// Runs `nblocks` alloc/free round trips so that the next `nblocks`
    /// allocations are served from the free list. All blocks are taken before
    /// any is given back, otherwise one block would be recycled `nblocks`
    /// times.
    ///
    /// On `OutOfMemory` the blocks obtained so far stay on the free list.
    pub fn prealloc(&self, nblocks: usize) -> Result<()> {
        if nblocks == 0 {
            return Err(Error::InvalidArgument);
        }
        let mut taken = FreeList::new();
        let mut res = Ok(());
        for _ in 0..nblocks {
            match self.take() {
                // SAFETY: a freshly taken block belongs to nobody else.
                Ok(block) => unsafe { taken.push(block) },
                Err(err) => {
                    res = Err(err);
                    break;
                }
            }
        }
        log::trace!(
            "prealloc: {} of {} blocks reserved, {} segments",
            taken.len(),
            nblocks,
            self.segment_count()
        );
        self.free.lock().append(&mut taken);
        res
    }

    /// Hands out one zero-filled block.
    pub fn alloc(&self) -> Result<Block<'_>> {
        self.alloc_raw().map(|ptr| Block::new(ptr, self.block_size, self.id()))
    }

    /// Returns `block` to the free list. Never releases memory to the source.
    ///
    /// A block handed out by another allocator is refused with
    /// `InvalidArgument`; it stays parked with its own allocator until that
    /// one is torn down.
    pub fn free(&self, block: Block<'_>) -> Result<()> {
        if block.owner() != self.id() {
            log::error!("block {:p} freed to an allocator that does not own it", block.as_ptr());
            return Err(Error::InvalidArgument);
        }
        // SAFETY: the handle is live and was handed out by this allocator.
        unsafe { self.free_raw(block.into_raw()) };
        Ok(())
    }

    /// Rebuilds a handle from [`Block::into_raw`].
    ///
    /// # Safety
    ///
    /// `ptr` must come from `into_raw` on a block of this allocator, and no
    /// other handle to it may exist.
    pub unsafe fn block_from_raw(&self, ptr: NonNull<u8>) -> Block<'_> {
        Block::new(ptr, self.block_size, self.id())
    }

    /// Like [`alloc`](Self::alloc) but without the borrow, for owners that
    /// keep blocks next to the allocator.
    pub fn alloc_raw(&self) -> Result<NonNull<u8>> {
        let ptr = self.take()?;
        // SAFETY: the block is `block_size` bytes and exclusively ours.
        unsafe { ptr.as_ptr().write_bytes(0, self.block_size) };
        Ok(ptr)
    }

    /// # Safety
    ///
    /// `ptr` must come from `alloc_raw` (or `Block::into_raw`) on this
    /// allocator, must not already be free, and must not be used afterwards.
    pub unsafe fn free_raw(&self, ptr: NonNull<u8>) {
        debug_assert!(
            self.segments.lock().contains(ptr, self.block_size),
            "block {:p} does not belong to this allocator",
            ptr
        );
        // SAFETY: blocks are pointer aligned and at least a pointer wide.
        unsafe { self.free.lock().push(ptr) };
    }

    /// Tears the allocator down, releasing every segment.
    ///
    /// Every block must have been freed first. Since blocks borrow the
    /// allocator, outstanding `Block` handles make this a compile error;
    /// pointers obtained with `alloc_raw` are the owner's responsibility.
    pub fn deinit(self) {
        drop(self)
    }

    /// Identity stamped into every `Block`. Stable while any block borrows us.
    fn id(&self) -> usize {
        self as *const Self as usize
    }

    fn take(&self) -> Result<NonNull<u8>> {
        if let Some(block) = self.free.lock().pop() {
            return Ok(block);
        }
        match self.config.growth {
            GrowthPolicy::Concurrent => self.grow(),
            GrowthPolicy::Serialized => {
                let _grow = self.grow.lock();
                if let Some(block) = self.free.lock().pop() {
                    return Ok(block);
                }
                self.grow()
            }
        }
    }

    /// Requests one segment, keeps its first block for the caller and pushes
    /// the rest onto the free list.
    fn grow(&self) -> Result<NonNull<u8>> {
        let Some(size) = segment::segment_size(self.config.page_size, self.block_size) else {
            log::debug!("segment for {}-byte blocks overflows usize", self.block_size);
            return Err(Error::OutOfMemory);
        };
        let layout = Layout::from_size_align(size, SEGMENT_ALIGN).map_err(|_| {
            log::debug!("segment of {} bytes exceeds the address space", size);
            Error::OutOfMemory
        })?;
        let Some(base) = self.source.acquire(layout) else {
            log::debug!("segment request of {} bytes failed", size);
            return Err(Error::OutOfMemory);
        };

        // SAFETY: `base` is a fresh segment of `layout`.
        let Some(carved) = (unsafe { segment::carve(base, layout, self.block_size) }) else {
            log::debug!("segment of {} bytes holds no {}-byte block", size, self.block_size);
            // SAFETY: nothing was carved, the segment goes straight back.
            unsafe { self.source.release(base, layout) };
            return Err(Error::OutOfMemory);
        };
        // SAFETY: the header was just written and is in no list yet.
        unsafe { self.segments.lock().push(carved.header) };

        if carved.blocks > 1 {
            let mut free = self.free.lock();
            for i in 1..carved.blocks {
                // SAFETY: block `i` lies inside the segment's data area.
                unsafe { free.push(carved.first.add(i * self.block_size)) };
            }
        }
        log::trace!(
            "segment acquired: {} bytes, {} blocks of {} bytes",
            size,
            carved.blocks,
            self.block_size
        );
        Ok(carved.first)
    }
}

impl<S: SegmentSource> Drop for BlockAllocator<S> {
    fn drop(&mut self) {
        let segments = self.segments.get_mut();
        // SAFETY: `&mut self` means no `Block` borrow is alive; raw owners
        // promised to free their pointers before dropping us.
        let released = unsafe { segments.release_all(&self.source) };
        log::trace!("allocator torn down, {} segments released", released);
    }
}

impl<S: SegmentSource> core::fmt::Debug for BlockAllocator<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BlockAllocator")
            .field("block_size", &self.block_size)
            .field("config", &self.config)
            .field("segments", &self.segment_count())
            .field("free", &self.free_count())
            .finish()
    }
}
