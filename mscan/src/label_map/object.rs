use super::event::LabelEvent;
use crate::domain::{GuestAddr, LabelKind, ObjectId, Pc};

/// One live (or formerly live) labelled object
///
/// Built only by [`LabelMap`](super::LabelMap). Queries hand out clones, so a
/// record held by a caller is a snapshot and never aliases the map's storage.
#[derive(Debug, Clone)]
pub struct ObjectRecord {
    id: ObjectId,
    kind: LabelKind,
    guest_addr: GuestAddr,
    bytes: u64,
    alloc_pc: Pc,
    name: String,
}

impl ObjectRecord {
    /// Caller has already checked `bytes > 0` and that `last()` fits in a u64.
    pub(crate) fn new(id: ObjectId, kind: LabelKind, event: &LabelEvent) -> Self {
        debug_assert!(event.bytes > 0);
        Self {
            id,
            kind,
            guest_addr: event.guest_addr,
            bytes: event.bytes,
            alloc_pc: event.pc,
            name: event.name.clone(),
        }
    }

    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> LabelKind {
        self.kind
    }

    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    #[must_use]
    pub fn alloc_pc(&self) -> Pc {
        self.alloc_pc
    }

    /// Producer-supplied name, possibly empty
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn start(&self) -> GuestAddr {
        self.guest_addr
    }

    /// One past the last byte, or `None` when the object ends at the top of
    /// the address space
    #[must_use]
    pub fn end(&self) -> Option<GuestAddr> {
        self.guest_addr.0.checked_add(self.bytes).map(GuestAddr)
    }

    /// The last byte covered by the object
    #[must_use]
    pub fn last(&self) -> GuestAddr {
        GuestAddr(self.guest_addr.0 + (self.bytes - 1))
    }

    #[must_use]
    pub fn contains(&self, addr: GuestAddr) -> bool {
        self.guest_addr <= addr && addr <= self.last()
    }

    /// Whether the object intersects the inclusive range `[first, last]`
    #[must_use]
    pub fn overlaps(&self, first: GuestAddr, last: GuestAddr) -> bool {
        self.guest_addr <= last && first <= self.last()
    }
}

impl PartialEq for ObjectRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ObjectRecord {}
