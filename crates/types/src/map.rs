//! Map creation attributes and per-call update flags.

use core::mem::size_of;

use bitflags::bitflags;
use static_assertions::const_assert_eq;

use crate::{Error, Result};

/// Map backends known to the runtime. Only `Hashtable` is implemented in
/// this workspace; the other tags are kept so their values stay stable.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MapType {
    Array = 1,
    PercpuArray = 2,
    Hashtable = 3,
    PercpuHashtable = 4,
}

impl MapType {
    /// Reserved tag, never a valid map.
    pub const BAD: u32 = 0;
    /// One past the last valid tag.
    pub const MAX: u32 = 5;
}

impl TryFrom<u32> for MapType {
    type Error = Error;

    fn try_from(raw: u32) -> Result<Self> {
        match raw {
            1 => Ok(MapType::Array),
            2 => Ok(MapType::PercpuArray),
            3 => Ok(MapType::Hashtable),
            4 => Ok(MapType::PercpuHashtable),
            _ => Err(Error::InvalidArgument),
        }
    }
}

bitflags! {
    /// Creation-time options. Bits without a name are carried through
    /// untouched.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MapFlags: u32 {
        /// Do not reserve `max_entries` element blocks at creation.
        const NO_PREALLOC = 1 << 0;
    }
}

/// Map creation request as it arrives from user space.
///
/// `#[repr(C)]` with plain integer fields so the ioctl layer can copy it in
/// verbatim; the `map_type` tag is validated by [`MapAttr::map_type`].
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MapAttr {
    pub map_type: u32,
    pub key_size: u32,
    pub value_size: u32,
    pub max_entries: u32,
    pub flags: u32,
}

const_assert_eq!(size_of::<MapAttr>(), 20);

impl MapAttr {
    pub const fn new(
        map_type: MapType,
        key_size: u32,
        value_size: u32,
        max_entries: u32,
        flags: MapFlags,
    ) -> Self {
        Self {
            map_type: map_type as u32,
            key_size,
            value_size,
            max_entries,
            flags: flags.bits(),
        }
    }

    pub fn map_type(&self) -> Result<MapType> {
        MapType::try_from(self.map_type)
    }

    pub const fn flags(&self) -> MapFlags {
        MapFlags::from_bits_retain(self.flags)
    }
}

/// Insert/overwrite policy passed with every update.
#[repr(u64)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UpdateFlag {
    /// Insert if absent, overwrite if present.
    #[default]
    Any = 0,
    /// Insert only if absent.
    NoExist = 1,
    /// Overwrite only if present.
    Exist = 2,
}

impl TryFrom<u64> for UpdateFlag {
    type Error = Error;

    fn try_from(raw: u64) -> Result<Self> {
        match raw {
            0 => Ok(UpdateFlag::Any),
            1 => Ok(UpdateFlag::NoExist),
            2 => Ok(UpdateFlag::Exist),
            _ => Err(Error::InvalidArgument),
        }
    }
}
