use addr2line::Context;
use anyhow::{Context as _, Result};
use gimli::{EndianRcSlice, RunTimeEndian};
use object::{Object, ObjectSection};
use rustc_demangle::demangle;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use super::{PcResolver, SourceLine, UNKNOWN_FILE, UNKNOWN_FUNCTION};
use crate::domain::Pc;

/// DWARF-backed resolver for guest program counters
///
/// Load it from the guest kernel image (an ELF with debug info). Results are
/// cached per PC, since the same allocation sites show up over and over in a
/// trace.
pub struct Symbolizer {
    ctx: Context<EndianRcSlice<RunTimeEndian>>,
    /// Cache of lookups by PC, including failed ones
    cache: RefCell<HashMap<u64, Option<SourceLine>>>,
}

impl Symbolizer {
    /// Create a symbolizer for the given ELF image
    ///
    /// # Errors
    /// Returns an error if the image cannot be read or parsed, or if DWARF debug info is missing
    pub fn new<P: AsRef<Path>>(elf_path: P) -> Result<Self> {
        let elf_path = elf_path.as_ref();
        let elf_data = fs::read(elf_path)
            .with_context(|| format!("Failed to read ELF image {}", elf_path.display()))?;

        let obj_file = object::File::parse(&*elf_data).context("Failed to parse object file")?;

        let endian =
            if obj_file.is_little_endian() { RunTimeEndian::Little } else { RunTimeEndian::Big };

        let load_section =
            |id: gimli::SectionId| -> Result<EndianRcSlice<RunTimeEndian>, gimli::Error> {
                let data = obj_file
                    .section_by_name(id.name())
                    .and_then(|section| section.uncompressed_data().ok())
                    .unwrap_or(std::borrow::Cow::Borrowed(&[][..]));
                Ok(EndianRcSlice::new(Rc::from(&*data), endian))
            };

        let dwarf = gimli::Dwarf::load(&load_section)?;
        let ctx = Context::from_dwarf(dwarf).context("Failed to load DWARF debug information")?;

        Ok(Self { ctx, cache: RefCell::new(HashMap::new()) })
    }

    /// Number of distinct PCs looked up so far
    #[must_use]
    pub fn cached_lookups(&self) -> usize {
        self.cache.borrow().len()
    }

    fn find(&self, pc: u64) -> Option<SourceLine> {
        // Frames come innermost first; report the innermost (possibly inlined) function.
        let frame = self.ctx.find_frames(pc).skip_all_loads().ok()?.next().ok()??;

        let function = frame.function.and_then(|f| f.demangle().ok().map(|s| s.to_string()));
        let (file, line) = frame
            .location
            .map(|loc| (loc.file.map(std::string::ToString::to_string), loc.line.unwrap_or(0)))
            .unwrap_or((None, 0));

        frame_line(function, file, line)
    }

    /// Demangle a symbol name
    #[must_use]
    pub fn demangle_symbol(symbol: &str) -> String {
        format!("{:#}", demangle(symbol))
    }
}

/// A frame with neither a name nor a file tells us nothing about the PC
fn frame_line(function: Option<String>, file: Option<String>, line: u32) -> Option<SourceLine> {
    if function.is_none() && file.is_none() {
        return None;
    }
    Some(SourceLine {
        function: function.unwrap_or_else(|| UNKNOWN_FUNCTION.to_string()),
        file: file.unwrap_or_else(|| UNKNOWN_FILE.to_string()),
        line,
    })
}

impl PcResolver for Symbolizer {
    fn lookup(&self, pc: Pc) -> Option<SourceLine> {
        if let Some(cached) = self.cache.borrow().get(&pc.0) {
            return cached.clone();
        }

        let resolved = self.find(pc.0);
        self.cache.borrow_mut().insert(pc.0, resolved.clone());
        resolved
    }
}
