//! Allocator tuning knobs.

use types::{Error, Result};

use crate::ALIGN;

/// Page size assumed when the caller does not supply one.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// How an allocator behaves when several callers find the free list empty
/// at the same time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GrowthPolicy {
    /// Every caller that saw an empty list requests its own segment. Short
    /// critical section, may over-allocate under contention.
    #[default]
    Concurrent,
    /// Growth is serialised and the free list is re-checked before asking
    /// for a segment, so one gap produces one segment.
    Serialized,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Minimum segment size requested from the source.
    pub page_size: usize,
    pub growth: GrowthPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub const fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            growth: GrowthPolicy::Concurrent,
        }
    }

    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub const fn with_growth(mut self, growth: GrowthPolicy) -> Self {
        self.growth = growth;
        self
    }

    /// Page size must be a power of two no smaller than a pointer.
    pub fn validate(&self) -> Result<()> {
        if !self.page_size.is_power_of_two() || self.page_size < ALIGN {
            log::debug!("allocator config rejected: page_size={}", self.page_size);
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
        assert_eq!(Config::default().page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn odd_page_sizes_are_rejected() {
        for page_size in [0, 1, 3000, 4097] {
            let config = Config::new().with_page_size(page_size);
            assert_eq!(config.validate(), Err(Error::InvalidArgument), "page_size={page_size}");
        }
    }
}
