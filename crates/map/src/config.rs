use allocator::Config;

/// Seed used when none is configured.
pub const DEFAULT_HASH_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

/// Per-map tuning that is not part of the user-visible attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MapConfig {
    /// Configuration of the map's element allocator.
    pub allocator: Config,
    /// Keys the bucket hash.
    pub hash_seed: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            allocator: Config::default(),
            hash_seed: DEFAULT_HASH_SEED,
        }
    }
}

impl MapConfig {
    pub const fn with_allocator(mut self, allocator: Config) -> Self {
        self.allocator = allocator;
        self
    }

    pub const fn with_hash_seed(mut self, hash_seed: u64) -> Self {
        self.hash_seed = hash_seed;
        self
    }
}
