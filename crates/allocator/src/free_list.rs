use core::ptr::NonNull;

/// Link stored in the first word of every free block.
#[repr(C)]
struct FreeNode {
    next: Option<NonNull<FreeNode>>,
}

/// LIFO list of free blocks threaded through the blocks themselves.
pub(crate) struct FreeList {
    head: Option<NonNull<FreeNode>>,
    len: usize,
}

// SAFETY: the list exclusively owns the free blocks it links.
unsafe impl Send for FreeList {}

impl FreeList {
    pub const fn new() -> Self {
        Self { head: None, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// # Safety
    ///
    /// `block` must be pointer aligned, at least one pointer wide, and not
    /// referenced by anyone else while it sits on the list.
    pub unsafe fn push(&mut self, block: NonNull<u8>) {
        let node = block.cast::<FreeNode>();
        // SAFETY: guaranteed by the caller.
        unsafe { node.as_ptr().write(FreeNode { next: self.head }) };
        self.head = Some(node);
        self.len += 1;
    }

    pub fn pop(&mut self) -> Option<NonNull<u8>> {
        let node = self.head?;
        // SAFETY: nodes on the list are live free blocks written by `push`.
        self.head = unsafe { node.as_ref().next };
        self.len -= 1;
        Some(node.cast())
    }

    /// Moves every block of `other` onto this list.
    pub fn append(&mut self, other: &mut FreeList) {
        while let Some(block) = other.pop() {
            // SAFETY: the block came off another free list.
            unsafe { self.push(block) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_reverse_push_order() {
        let mut slots = [0usize; 3];
        let mut list = FreeList::new();
        let ptrs: Vec<NonNull<u8>> = slots
            .iter_mut()
            .map(|slot| NonNull::from(slot).cast::<u8>())
            .collect();
        for ptr in &ptrs {
            unsafe { list.push(*ptr) };
        }
        assert_eq!(list.len(), 3);
        assert_eq!(list.pop(), Some(ptrs[2]));
        assert_eq!(list.pop(), Some(ptrs[1]));

        let mut other = FreeList::new();
        other.append(&mut list);
        assert_eq!(list.len(), 0);
        assert_eq!(other.pop(), Some(ptrs[0]));
        assert_eq!(other.pop(), None);
    }
}
