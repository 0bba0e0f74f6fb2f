use types::{Result, UpdateFlag};

/// Operations every map backend provides.
///
/// Buffers follow the ioctl convention: keys and values are exactly
/// `key_size` / `value_size` bytes, results are copied into caller buffers.
/// Implementations make each call atomic with respect to the others.
pub trait MapBackend: Send + Sync {
    fn key_size(&self) -> usize;

    fn value_size(&self) -> usize;

    fn max_entries(&self) -> usize;

    /// Live elements.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies the value stored under `key` into `value`.
    fn lookup_into(&self, key: &[u8], value: &mut [u8]) -> Result<()>;

    fn update(&self, key: &[u8], value: &[u8], flag: UpdateFlag) -> Result<()>;

    fn delete(&self, key: &[u8]) -> Result<()>;

    /// Writes the key following `key` in iteration order into `next_key`.
    /// `None`, or a key that is not present, restarts from the first key.
    fn get_next_key(&self, key: Option<&[u8]>, next_key: &mut [u8]) -> Result<()>;
}
