//! Hashtable map backend.
//!
//! A fixed array of `next_power_of_two(max_entries)` buckets, each an
//! intrusive chain of elements. Every element is one block from the map's
//! own allocator. The bucket array and the element count sit behind a single
//! reader/writer lock:
//! - `update` and `delete` hold the write guard across lookup, capacity check
//!   and link/unlink, so two inserts can never both claim the last slot;
//! - `lookup` and `get_next_key` hold the read guard while touching element
//!   memory. A deleted block goes back to the allocator under the write
//!   guard, so it cannot be recycled while any reader still sees it.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::hash::BuildHasher;
use core::ptr::NonNull;

use ahash::RandomState;
use allocator::{BlockAllocator, SegmentSource, SystemSource};
use spin::RwLock;
use types::{Error, MapAttr, MapFlags, MapType, Result, UpdateFlag};

use crate::backend::MapBackend;
use crate::element::{ElemHeader, ElementLayout};
use crate::MapConfig;

type Link = Option<NonNull<ElemHeader>>;

struct Table {
    buckets: Box<[Link]>,
    count: usize,
}

// SAFETY: the table exclusively owns the elements linked from its buckets
// and is only reached through the map's lock.
unsafe impl Send for Table {}
unsafe impl Sync for Table {}

pub struct HashtableMap<S: SegmentSource = SystemSource> {
    layout: ElementLayout,
    max_entries: usize,
    /// `nbuckets - 1`; the bucket count is a power of two.
    mask: usize,
    flags: MapFlags,
    hasher: RandomState,
    table: RwLock<Table>,
    allocator: BlockAllocator<S>,
}

impl HashtableMap<SystemSource> {
    pub fn create(attr: &MapAttr) -> Result<Self> {
        Self::create_with(attr, MapConfig::default())
    }

    pub fn create_with(attr: &MapAttr, config: MapConfig) -> Result<Self> {
        Self::create_with_source(attr, config, SystemSource)
    }
}

impl<S: SegmentSource> HashtableMap<S> {
    /// Validates `attr`, sizes the element blocks and, unless
    /// `MapFlags::NO_PREALLOC` is set, reserves `max_entries` of them.
    pub fn create_with_source(attr: &MapAttr, config: MapConfig, source: S) -> Result<Self> {
        if attr.map_type()? != MapType::Hashtable {
            return Err(Error::InvalidArgument);
        }
        if attr.key_size == 0 || attr.value_size == 0 || attr.max_entries == 0 {
            log::debug!(
                "hashtable rejected: key_size={} value_size={} max_entries={}",
                attr.key_size,
                attr.value_size,
                attr.max_entries
            );
            return Err(Error::InvalidArgument);
        }

        let layout = ElementLayout::new(attr.key_size as usize, attr.value_size as usize)?;
        let max_entries = attr.max_entries as usize;
        let nbuckets = max_entries
            .checked_next_power_of_two()
            .ok_or(Error::InvalidArgument)?;

        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(nbuckets)
            .map_err(|_| Error::OutOfMemory)?;
        buckets.resize(nbuckets, None);

        let allocator = BlockAllocator::with_source(layout.size, config.allocator, source)?;
        let flags = attr.flags();
        if !flags.contains(MapFlags::NO_PREALLOC) {
            allocator.prealloc(max_entries)?;
        }

        let seed = config.hash_seed;
        log::debug!(
            "hashtable created: key_size={} value_size={} max_entries={} buckets={} elem_size={}",
            layout.key_size,
            layout.value_size,
            max_entries,
            nbuckets,
            layout.size
        );
        Ok(Self {
            layout,
            max_entries,
            mask: nbuckets - 1,
            flags,
            hasher: RandomState::with_seeds(seed, seed.rotate_left(17), !seed, seed ^ 0x5bd1_e995),
            table: RwLock::new(Table {
                buckets: buckets.into_boxed_slice(),
                count: 0,
            }),
            allocator,
        })
    }

    pub fn key_size(&self) -> usize {
        self.layout.key_size
    }

    pub fn value_size(&self) -> usize {
        self.layout.value_size
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn flags(&self) -> MapFlags {
        self.flags
    }

    pub fn len(&self) -> usize {
        self.table.read().count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The allocator element blocks come from.
    pub fn allocator(&self) -> &BlockAllocator<S> {
        &self.allocator
    }

    /// Inserts or overwrites according to `flag`. All checks run before the
    /// table is modified, so a failed update changes nothing.
    pub fn update(&self, key: &[u8], value: &[u8], flag: UpdateFlag) -> Result<()> {
        self.check_key(key)?;
        if value.len() != self.layout.value_size {
            return Err(Error::InvalidArgument);
        }
        let hash = self.hasher.hash_one(key);

        let mut table = self.table.write();
        if let Some(elem) = self.find(&table, hash, key) {
            if flag == UpdateFlag::NoExist {
                return Err(Error::AlreadyExists);
            }
            // SAFETY: the write guard excludes every other access to the element.
            unsafe { self.layout.value_mut(elem) }.copy_from_slice(value);
            return Ok(());
        }

        if flag == UpdateFlag::Exist {
            return Err(Error::NotFound);
        }
        if table.count >= self.max_entries {
            return Err(Error::OutOfCapacity);
        }

        let elem = self.allocator.alloc_raw()?.cast::<ElemHeader>();
        let idx = self.bucket(hash);
        // SAFETY: a fresh block of `layout.size` bytes; key/value sizes checked above.
        unsafe {
            self.layout.init(elem, hash, key, value);
            (*elem.as_ptr()).next = table.buckets[idx];
        }
        table.buckets[idx] = Some(elem);
        table.count += 1;
        log::trace!("hashtable insert key={} count={}", hex::encode(key), table.count);
        Ok(())
    }

    /// Copy of the value stored under `key`. A key of the wrong size is
    /// never present.
    pub fn lookup(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.lookup_with(key, |value| value.to_vec())
    }

    /// Runs `f` on the stored value while the element is pinned by the read
    /// guard.
    ///
    /// `f` may read the map again, but must not call `update` or `delete` on
    /// it: the write guard can never be taken while this read guard is held,
    /// so such a call spins forever. Use [`lookup`](Self::lookup) to get an
    /// owned copy when the map has to be modified afterwards.
    pub fn lookup_with<R>(&self, key: &[u8], f: impl FnOnce(&[u8]) -> R) -> Option<R> {
        if key.len() != self.layout.key_size {
            return None;
        }
        let hash = self.hasher.hash_one(key);
        let table = self.table.read();
        let elem = self.find(&table, hash, key)?;
        // SAFETY: the element stays linked while the read guard is held.
        Some(f(unsafe { self.layout.value(elem) }))
    }

    pub fn lookup_into(&self, key: &[u8], value: &mut [u8]) -> Result<()> {
        self.check_key(key)?;
        if value.len() != self.layout.value_size {
            return Err(Error::InvalidArgument);
        }
        self.lookup_with(key, |stored| value.copy_from_slice(stored))
            .ok_or(Error::NotFound)
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.lookup_with(key, |_| ()).is_some()
    }

    /// Unlinks `key` and returns its block to the allocator.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.check_key(key)?;
        let hash = self.hasher.hash_one(key);
        let idx = self.bucket(hash);

        let mut table = self.table.write();
        let mut link: *mut Link = &mut table.buckets[idx];
        // SAFETY: every link reached from a bucket points at a live element and
        // the write guard makes this the only access.
        let removed = unsafe {
            loop {
                let Some(elem) = *link else { break None };
                if elem.as_ref().hash == hash && self.layout.key(elem) == key {
                    *link = elem.as_ref().next;
                    break Some(elem);
                }
                link = &mut (*elem.as_ptr()).next;
            }
        };
        let Some(elem) = removed else {
            return Err(Error::NotFound);
        };
        // SAFETY: the element is unlinked and no reader can hold it.
        unsafe { self.allocator.free_raw(elem.cast()) };
        table.count -= 1;
        log::trace!("hashtable delete key={} count={}", hex::encode(key), table.count);
        Ok(())
    }

    /// Key following `key` in bucket order. `None`, or a key not in the
    /// map, yields the first key. `NotFound` once iteration is exhausted.
    pub fn get_next_key(&self, key: Option<&[u8]>) -> Result<Vec<u8>> {
        let mut next = alloc::vec![0u8; self.layout.key_size];
        self.get_next_key_into(key, &mut next)?;
        Ok(next)
    }

    pub fn get_next_key_into(&self, key: Option<&[u8]>, next_key: &mut [u8]) -> Result<()> {
        if next_key.len() != self.layout.key_size {
            return Err(Error::InvalidArgument);
        }
        if let Some(key) = key {
            self.check_key(key)?;
        }

        let table = self.table.read();
        let mut start = 0;
        if let Some(key) = key {
            let hash = self.hasher.hash_one(key);
            if let Some(elem) = self.find(&table, hash, key) {
                // SAFETY: linked elements stay live under the read guard.
                if let Some(next) = unsafe { elem.as_ref().next } {
                    next_key.copy_from_slice(unsafe { self.layout.key(next) });
                    return Ok(());
                }
                start = self.bucket(hash) + 1;
            }
        }

        for slot in &table.buckets[start..] {
            if let Some(elem) = *slot {
                // SAFETY: as above.
                next_key.copy_from_slice(unsafe { self.layout.key(elem) });
                return Ok(());
            }
        }
        Err(Error::NotFound)
    }

    /// Returns every element to the allocator, then tears the allocator down.
    pub fn deinit(self) {
        drop(self)
    }

    fn check_key(&self, key: &[u8]) -> Result<()> {
        if key.len() != self.layout.key_size {
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }

    fn bucket(&self, hash: u64) -> usize {
        (hash as usize) & self.mask
    }

    fn find(&self, table: &Table, hash: u64, key: &[u8]) -> Option<NonNull<ElemHeader>> {
        let mut cursor = table.buckets[self.bucket(hash)];
        while let Some(elem) = cursor {
            // SAFETY: the caller holds a guard on `table`, keeping the chain live.
            let header = unsafe { elem.as_ref() };
            if header.hash == hash && unsafe { self.layout.key(elem) } == key {
                return Some(elem);
            }
            cursor = header.next;
        }
        None
    }
}

impl<S: SegmentSource> Drop for HashtableMap<S> {
    fn drop(&mut self) {
        let table = self.table.get_mut();
        let mut returned = 0;
        for slot in table.buckets.iter_mut() {
            let mut cursor = slot.take();
            while let Some(elem) = cursor {
                // SAFETY: `&mut self` rules out readers; each element is
                // visited once, read before being freed.
                unsafe {
                    cursor = elem.as_ref().next;
                    self.allocator.free_raw(elem.cast());
                }
                returned += 1;
            }
        }
        table.count = 0;
        log::debug!("hashtable torn down, {} elements returned", returned);
    }
}

impl<S: SegmentSource> MapBackend for HashtableMap<S> {
    fn key_size(&self) -> usize {
        HashtableMap::key_size(self)
    }

    fn value_size(&self) -> usize {
        HashtableMap::value_size(self)
    }

    fn max_entries(&self) -> usize {
        HashtableMap::max_entries(self)
    }

    fn len(&self) -> usize {
        HashtableMap::len(self)
    }

    fn lookup_into(&self, key: &[u8], value: &mut [u8]) -> Result<()> {
        HashtableMap::lookup_into(self, key, value)
    }

    fn update(&self, key: &[u8], value: &[u8], flag: UpdateFlag) -> Result<()> {
        HashtableMap::update(self, key, value, flag)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        HashtableMap::delete(self, key)
    }

    fn get_next_key(&self, key: Option<&[u8]>, next_key: &mut [u8]) -> Result<()> {
        self.get_next_key_into(key, next_key)
    }
}

impl<S: SegmentSource> core::fmt::Debug for HashtableMap<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HashtableMap")
            .field("key_size", &self.layout.key_size)
            .field("value_size", &self.layout.value_size)
            .field("max_entries", &self.max_entries)
            .field("len", &self.len())
            .finish()
    }
}
