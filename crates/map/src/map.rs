//! Type-dispatching map front.

use alloc::boxed::Box;

use types::{Error, MapAttr, MapType, Result, UpdateFlag};

use crate::backend::MapBackend;
use crate::hashtable::HashtableMap;
use crate::MapConfig;

/// A map instance as seen by the runtime: the creation attributes plus the
/// backend that implements them.
pub struct Map {
    attr: MapAttr,
    map_type: MapType,
    backend: Box<dyn MapBackend>,
}

impl Map {
    pub fn init(attr: &MapAttr) -> Result<Self> {
        Self::init_with(attr, MapConfig::default())
    }

    /// Validates the type tag and builds the matching backend. Known tags
    /// whose backend lives outside this crate are rejected.
    pub fn init_with(attr: &MapAttr, config: MapConfig) -> Result<Self> {
        let map_type = attr.map_type()?;
        let backend: Box<dyn MapBackend> = match map_type {
            MapType::Hashtable => Box::new(HashtableMap::create_with(attr, config)?),
            MapType::Array | MapType::PercpuArray | MapType::PercpuHashtable => {
                log::debug!("no backend for map type {:?}", map_type);
                return Err(Error::InvalidArgument);
            }
        };
        Ok(Self {
            attr: *attr,
            map_type,
            backend,
        })
    }

    /// Wraps an externally built backend.
    pub fn from_backend(attr: &MapAttr, backend: Box<dyn MapBackend>) -> Result<Self> {
        let map_type = attr.map_type()?;
        Ok(Self {
            attr: *attr,
            map_type,
            backend,
        })
    }

    pub fn map_type(&self) -> MapType {
        self.map_type
    }

    pub fn attr(&self) -> &MapAttr {
        &self.attr
    }

    pub fn backend(&self) -> &dyn MapBackend {
        self.backend.as_ref()
    }

    pub fn len(&self) -> usize {
        self.backend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backend.is_empty()
    }

    pub fn lookup_elem(&self, key: &[u8], value: &mut [u8]) -> Result<()> {
        self.backend.lookup_into(key, value)
    }

    /// `flags` is the raw per-call policy tag (`ANY`, `NOEXIST`, `EXIST`).
    pub fn update_elem(&self, key: &[u8], value: &[u8], flags: u64) -> Result<()> {
        let flag = UpdateFlag::try_from(flags)?;
        self.backend.update(key, value, flag)
    }

    pub fn delete_elem(&self, key: &[u8]) -> Result<()> {
        self.backend.delete(key)
    }

    pub fn get_next_key(&self, key: Option<&[u8]>, next_key: &mut [u8]) -> Result<()> {
        self.backend.get_next_key(key, next_key)
    }

    /// Drops the backend, which returns every element and releases its memory.
    pub fn deinit(self) {
        log::debug!("map deinit: type={:?} live={}", self.map_type, self.backend.len());
        drop(self)
    }
}

impl core::fmt::Debug for Map {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Map")
            .field("map_type", &self.map_type)
            .field("attr", &self.attr)
            .field("len", &self.backend.len())
            .finish()
    }
}
