//! # Allocation-Site Symbolization
//!
//! Every [`ObjectRecord`](crate::label_map::ObjectRecord) carries the guest
//! program counter of its allocation call site. Reports turn that PC into a
//! `function`, `file`, `line` triple through a [`PcResolver`].
//!
//! The label map never consults the resolver; it only stores the PC.
//!
//! ## Unknown PCs
//!
//! Resolution never fails from the caller's point of view. Instead a sentinel
//! triple is returned:
//!
//! ```text
//! pc == 0            → ("(unknown function)", "(unknown file)", 0)
//! lookup failed      → ("<pc in decimal>",    "(unknown file)", 0)
//! ```
//!
//! **Libraries used** (for [`Symbolizer`]):
//! - `gimli`: Low-level DWARF parser
//! - `addr2line`: High-level symbolization library built on gimli
//! - `object`: ELF binary parser
//!
//! Guest kernels are linked at fixed addresses, so PCs from the trace are used
//! as-is without any load-bias adjustment.

pub mod symbolizer;

use crate::domain::Pc;

pub use symbolizer::Symbolizer;

pub const UNKNOWN_FUNCTION: &str = "(unknown function)";
pub const UNKNOWN_FILE: &str = "(unknown file)";

/// Source location of a program counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub function: String,
    pub file: String,
    pub line: u32,
}

impl SourceLine {
    /// Sentinel for a PC the producer did not know
    #[must_use]
    pub fn unknown() -> Self {
        Self { function: UNKNOWN_FUNCTION.to_string(), file: UNKNOWN_FILE.to_string(), line: 0 }
    }

    /// Sentinel for a PC that could not be resolved
    #[must_use]
    pub fn unresolved(pc: Pc) -> Self {
        Self { function: pc.0.to_string(), file: UNKNOWN_FILE.to_string(), line: 0 }
    }

    /// `file:line:function`
    #[must_use]
    pub fn description(&self) -> String {
        format!("{}:{}:{}", self.file, self.line, self.function)
    }
}

/// Maps guest program counters to source locations
pub trait PcResolver {
    /// Resolve a non-zero PC, or `None` if it is not covered by debug info
    fn lookup(&self, pc: Pc) -> Option<SourceLine>;

    /// Resolve a PC, substituting the sentinel triple when needed
    fn source_line(&self, pc: Pc) -> SourceLine {
        if !pc.is_known() {
            return SourceLine::unknown();
        }
        self.lookup(pc).unwrap_or_else(|| SourceLine::unresolved(pc))
    }

    fn function_name(&self, pc: Pc) -> String {
        self.source_line(pc).function
    }

    fn function_description(&self, pc: Pc) -> String {
        self.source_line(pc).description()
    }
}
