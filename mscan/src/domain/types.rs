//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers prevent common bugs like passing a program counter
//! where a guest address is expected, and make function signatures more
//! expressive.

use std::fmt;

use mscan_common::{LABEL_BLOCK, LABEL_END, LABEL_HEAP, LABEL_PERCPU, LABEL_STATIC};
use super::errors::LabelMapError;

/// Object identity
///
/// Assigned by the label map in creation order, starting at 1. Never reused,
/// even after the object is freed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object#{}", self.0)
    }
}

/// Address in the traced guest's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GuestAddr(pub u64);

impl fmt::Display for GuestAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Guest program counter
///
/// `Pc(0)` means the call site is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pc(pub u64);

impl Pc {
    pub const UNKNOWN: Pc = Pc(0);

    /// Returns true if the trace producer supplied a call site
    #[must_use]
    pub fn is_known(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for Pc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PC:0x{:x}", self.0)
    }
}

/// Guest CPU index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CpuId(pub u32);

impl fmt::Display for CpuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CPU:{}", self.0)
    }
}

/// Guest task identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Tid(pub u64);

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TID:{}", self.0)
    }
}

/// Kind of a labelled object
///
/// Mirrors the valid range of the wire-level `LABEL_*` constants. `Block`
/// labels are accepted but never tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    Heap,
    Block,
    Static,
    PerCpu,
}

impl LabelKind {
    /// Number of valid kinds, used to size per-kind tables
    pub const COUNT: usize = (LABEL_END - 1) as usize;

    pub const ALL: [LabelKind; LabelKind::COUNT] =
        [LabelKind::Heap, LabelKind::Block, LabelKind::Static, LabelKind::PerCpu];

    /// Dense index in `0..COUNT`
    #[must_use]
    pub fn index(self) -> usize {
        (self.raw() - 1) as usize
    }

    /// Wire-level label type
    #[must_use]
    pub fn raw(self) -> u32 {
        match self {
            LabelKind::Heap => LABEL_HEAP,
            LabelKind::Block => LABEL_BLOCK,
            LabelKind::Static => LABEL_STATIC,
            LabelKind::PerCpu => LABEL_PERCPU,
        }
    }

    /// Parse a wire-level label type, attributing failures to `addr`
    ///
    /// # Errors
    /// Returns `LabelMapError::InvalidLabelType` for 0 and anything past the last kind
    pub fn from_raw(label_type: u32, addr: GuestAddr) -> Result<Self, LabelMapError> {
        match label_type {
            LABEL_HEAP => Ok(LabelKind::Heap),
            LABEL_BLOCK => Ok(LabelKind::Block),
            LABEL_STATIC => Ok(LabelKind::Static),
            LABEL_PERCPU => Ok(LabelKind::PerCpu),
            _ => Err(LabelMapError::InvalidLabelType { label_type, addr }),
        }
    }
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LabelKind::Heap => "heap",
            LabelKind::Block => "block",
            LabelKind::Static => "static",
            LabelKind::PerCpu => "percpu",
        };
        f.write_str(name)
    }
}
