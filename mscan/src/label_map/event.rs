//! Typed label / unlabel events
//!
//! The label type stays raw here: validating it is the label map's job, so
//! that a bad type is reported with the address it arrived with.

use mscan_common::{LabelEntry, UnlabelEntry};

use crate::domain::{GuestAddr, Pc};

/// An object was allocated at `guest_addr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEvent {
    pub label_type: u32,
    pub guest_addr: GuestAddr,
    pub bytes: u64,
    pub pc: Pc,
    pub name: String,
}

impl LabelEvent {
    #[must_use]
    pub fn new(label_type: u32, guest_addr: u64, bytes: u64, pc: u64) -> Self {
        Self {
            label_type,
            guest_addr: GuestAddr(guest_addr),
            bytes,
            pc: Pc(pc),
            name: String::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl From<&LabelEntry> for LabelEvent {
    fn from(entry: &LabelEntry) -> Self {
        Self {
            label_type: entry.label_type,
            guest_addr: GuestAddr(entry.guest_addr),
            bytes: entry.bytes,
            pc: Pc(entry.pc),
            name: String::from_utf8_lossy(entry.name()).into_owned(),
        }
    }
}

/// A previously labelled object starting at `guest_addr` was freed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlabelEvent {
    pub label_type: u32,
    pub guest_addr: GuestAddr,
}

impl UnlabelEvent {
    #[must_use]
    pub fn new(label_type: u32, guest_addr: u64) -> Self {
        Self { label_type, guest_addr: GuestAddr(guest_addr) }
    }
}

impl From<&UnlabelEntry> for UnlabelEvent {
    fn from(entry: &UnlabelEntry) -> Self {
        Self::new(entry.label_type, entry.guest_addr)
    }
}
