//! Program load attributes.

use crate::{Error, Instruction, Result};

/// Program types the runtime accepts.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProgType {
    Test = 1,
}

impl ProgType {
    /// Reserved tag, never a valid program.
    pub const BAD: u32 = 0;
    /// One past the last valid tag.
    pub const MAX: u32 = 2;
}

impl TryFrom<u32> for ProgType {
    type Error = Error;

    fn try_from(raw: u32) -> Result<Self> {
        match raw {
            1 => Ok(ProgType::Test),
            _ => Err(Error::InvalidArgument),
        }
    }
}

/// Program load request.
///
/// `prog` is `None` where the ioctl caller passed a null instruction
/// pointer. `prog_len` counts instructions, not bytes.
#[derive(Clone, Copy, Debug)]
pub struct ProgAttr<'a> {
    pub prog_type: u32,
    pub prog: Option<&'a [Instruction]>,
    pub prog_len: u32,
}

impl<'a> ProgAttr<'a> {
    /// Attribute for a whole instruction slice.
    pub fn new(prog_type: ProgType, prog: &'a [Instruction]) -> Self {
        Self {
            prog_type: prog_type as u32,
            prog: Some(prog),
            prog_len: u32::try_from(prog.len()).unwrap_or(u32::MAX),
        }
    }
}
