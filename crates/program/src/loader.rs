use alloc::vec::Vec;
use core::any::Any;

use types::{Error, Instruction, ProgAttr, ProgType, Result};

/// A loaded program: its type and an owned copy of its instructions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    prog_type: ProgType,
    insts: Vec<Instruction>,
}

impl Program {
    /// Validates `attr` and copies the first `prog_len` instructions.
    pub fn load(attr: &ProgAttr<'_>) -> Result<Self> {
        let prog_type = ProgType::try_from(attr.prog_type).inspect_err(|_| {
            log::debug!("program rejected: bad type {}", attr.prog_type);
        })?;
        if attr.prog_len == 0 {
            log::debug!("program rejected: empty instruction stream");
            return Err(Error::InvalidArgument);
        }
        let Some(prog) = attr.prog else {
            log::debug!("program rejected: no buffer for {} instructions", attr.prog_len);
            return Err(Error::InvalidArgument);
        };
        let len = attr.prog_len as usize;
        if len > prog.len() {
            log::debug!("program rejected: prog_len {} exceeds buffer of {}", len, prog.len());
            return Err(Error::InvalidArgument);
        }

        let mut insts = Vec::new();
        insts.try_reserve_exact(len).map_err(|_| Error::OutOfMemory)?;
        insts.extend_from_slice(&prog[..len]);

        log::debug!("program loaded: type={:?} insts={}", prog_type, len);
        Ok(Self { prog_type, insts })
    }

    pub fn prog_type(&self) -> ProgType {
        self.prog_type
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.insts
    }

    pub fn len(&self) -> usize {
        self.insts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }

    /// Releases the instruction buffer. `ctx` is reserved for per-type
    /// teardown hooks and currently unused.
    pub fn deinit(self, ctx: Option<&mut dyn Any>) {
        log::debug!(
            "program unloaded: type={:?} insts={} ctx={}",
            self.prog_type,
            self.insts.len(),
            ctx.is_some()
        );
    }
}

/// Loads `attr` into `target`.
///
/// `target` is `None` when the caller supplied no output slot. On error the
/// slot is left as it was.
pub fn init(target: Option<&mut Option<Program>>, attr: &ProgAttr<'_>) -> Result<()> {
    let Some(target) = target else {
        log::debug!("program rejected: no output slot");
        return Err(Error::InvalidArgument);
    };
    *target = Some(Program::load(attr)?);
    Ok(())
}
