//! Layout of one map element inside an allocator block.
//!
//! ```text
//! | ElemHeader | key | pad to 8 | value | pad to pointer width |
//! ```

use core::mem::size_of;
use core::ptr::NonNull;

use types::{Error, Result};

/// Chain link and cached hash at the head of every element.
#[repr(C)]
pub(crate) struct ElemHeader {
    pub next: Option<NonNull<ElemHeader>>,
    pub hash: u64,
}

const VALUE_ALIGN: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ElementLayout {
    pub key_size: usize,
    pub value_size: usize,
    value_offset: usize,
    /// Block size needed for one element.
    pub size: usize,
}

fn align_up(value: usize, align: usize) -> Option<usize> {
    Some(value.checked_add(align - 1)? & !(align - 1))
}

impl ElementLayout {
    pub fn new(key_size: usize, value_size: usize) -> Result<Self> {
        let compute = || {
            let key_end = size_of::<ElemHeader>().checked_add(key_size)?;
            let value_offset = align_up(key_end, VALUE_ALIGN)?;
            let size = align_up(value_offset.checked_add(value_size)?, allocator::ALIGN)?;
            Some((value_offset, size))
        };
        let (value_offset, size) = compute().ok_or(Error::InvalidArgument)?;
        Ok(Self {
            key_size,
            value_size,
            value_offset,
            size,
        })
    }

    const fn key_offset(&self) -> usize {
        size_of::<ElemHeader>()
    }

    /// Fills a fresh block with header, key and value.
    ///
    /// # Safety
    ///
    /// `elem` must be an unshared block of at least `self.size` bytes,
    /// pointer aligned, and `key`/`value` must have the configured sizes.
    pub unsafe fn init(&self, elem: NonNull<ElemHeader>, hash: u64, key: &[u8], value: &[u8]) {
        let base = elem.as_ptr().cast::<u8>();
        // SAFETY: all offsets are within `size` by construction.
        unsafe {
            elem.as_ptr().write(ElemHeader { next: None, hash });
            core::ptr::copy_nonoverlapping(key.as_ptr(), base.add(self.key_offset()), self.key_size);
            core::ptr::copy_nonoverlapping(value.as_ptr(), base.add(self.value_offset), self.value_size);
        }
    }

    /// # Safety
    ///
    /// `elem` must be a live element with this layout and stay live for `'a`.
    pub unsafe fn key<'a>(&self, elem: NonNull<ElemHeader>) -> &'a [u8] {
        // SAFETY: guaranteed by the caller.
        unsafe {
            let ptr = elem.as_ptr().cast::<u8>().add(self.key_offset());
            core::slice::from_raw_parts(ptr, self.key_size)
        }
    }

    /// # Safety
    ///
    /// Same as [`key`](Self::key).
    pub unsafe fn value<'a>(&self, elem: NonNull<ElemHeader>) -> &'a [u8] {
        // SAFETY: guaranteed by the caller.
        unsafe {
            let ptr = elem.as_ptr().cast::<u8>().add(self.value_offset);
            core::slice::from_raw_parts(ptr, self.value_size)
        }
    }

    /// # Safety
    ///
    /// Same as [`key`](Self::key), and no other reference to the value may
    /// exist for `'a`.
    pub unsafe fn value_mut<'a>(&self, elem: NonNull<ElemHeader>) -> &'a mut [u8] {
        // SAFETY: guaranteed by the caller.
        unsafe {
            let ptr = elem.as_ptr().cast::<u8>().add(self.value_offset);
            core::slice::from_raw_parts_mut(ptr, self.value_size)
        }
    }
}
