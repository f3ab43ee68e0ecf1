//! # Guest Address → Object Index
//!
//! The label map answers "which object lives at guest address A right now"
//! during a trace replay. It is fed by label (allocate) and unlabel (free)
//! events and queried by every analysis that needs to attribute a memory
//! access to an object.
//!
//! ## Layout
//!
//! Live objects are kept in two ordered maps:
//!
//! ```text
//! by_start: start address      → ObjectRecord   (owns the records)
//! by_last:  last covered byte  → start address
//! ```
//!
//! Because live ranges never overlap, ordering by start and ordering by last
//! byte agree. `by_last` lets a single `range(addr..)` lookup skip every
//! object that ended before `addr`:
//!
//! ```text
//!            A            B        C
//!        [0x1000,0x1010) [0x1040,0x1048) [0x1048,0x1050)
//! point 0x1044  → first last-byte >= 0x1044 is B (0x1047), B contains it
//! line  0x1040  → walk from B while start <= 0x107f: [B, C]
//! ```
//!
//! Keying the second map by the inclusive last byte (rather than the exclusive
//! end) keeps adjacent objects apart: an object ending exactly at `addr` is
//! never picked as the candidate for `addr`.
//!
//! ## Unlabel misses
//!
//! Tracing is switched on after the guest has already allocated objects, so
//! some frees refer to objects that were never labelled. Up to
//! `miss_tolerance` such misses per label kind are absorbed; one more is
//! treated as corruption. Once full tracing is enabled any miss is fatal.
//!
//! ## Ownership
//!
//! The map owns every live [`ObjectRecord`]; queries return clones. The map
//! does no locking: it expects one writer applying events in global trace
//! order (see [`crate::replay`]).

mod event;
mod object;

use std::collections::BTreeMap;

use log::debug;
use mscan_common::CACHE_LINE_SIZE;
use serde::Serialize;

pub use event::{LabelEvent, UnlabelEvent};
pub use object::ObjectRecord;

use crate::config::ScanConfig;
use crate::domain::{GuestAddr, LabelKind, LabelMapError, ObjectId};

/// Index of live labelled objects keyed by guest address range
#[derive(Debug)]
pub struct LabelMap {
    by_start: BTreeMap<u64, ObjectRecord>,
    by_last: BTreeMap<u64, u64>,
    /// Last identity handed out; identities start at 1
    last_id: u64,
    misses: [u64; LabelKind::COUNT],
    miss_tolerance: u64,
}

/// Point-in-time counters, emitted in handler summaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelMapStats {
    pub live_objects: usize,
    pub objects_created: u64,
    pub misses: BTreeMap<String, u64>,
}

impl Default for LabelMap {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelMap {
    /// Create an empty map with the default miss tolerance
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&ScanConfig::default())
    }

    #[must_use]
    pub fn with_config(config: &ScanConfig) -> Self {
        Self {
            by_start: BTreeMap::new(),
            by_last: BTreeMap::new(),
            last_id: 0,
            misses: [0; LabelKind::COUNT],
            miss_tolerance: config.miss_tolerance,
        }
    }

    /// Start tracking the object described by a label event
    ///
    /// Block labels are accepted and ignored. A failed registration consumes
    /// no identity.
    ///
    /// # Errors
    /// Fails on an invalid label type, a zero-byte object, a range whose last
    /// byte would lie past `u64::MAX`, or a range overlapping any live object.
    pub fn register(&mut self, event: &LabelEvent) -> Result<(), LabelMapError> {
        let addr = event.guest_addr;
        let kind = LabelKind::from_raw(event.label_type, addr)?;

        if kind == LabelKind::Block {
            return Ok(());
        }

        if event.bytes == 0 {
            return Err(LabelMapError::ZeroSize { kind, addr });
        }

        let last = addr
            .0
            .checked_add(event.bytes - 1)
            .ok_or(LabelMapError::AddressOverflow { addr, bytes: event.bytes })?;

        if let Some(existing) = self.lower_bound_by_last(addr.0) {
            if existing.overlaps(addr, GuestAddr(last)) {
                return Err(LabelMapError::Overlap {
                    addr,
                    bytes: event.bytes,
                    existing: existing.id(),
                    existing_addr: existing.start(),
                });
            }
        }

        self.last_id += 1;
        let record = ObjectRecord::new(ObjectId(self.last_id), kind, event);
        debug!("label {} {} at {} ({} bytes)", record.id(), kind, addr, event.bytes);

        self.by_last.insert(last, addr.0);
        self.by_start.insert(addr.0, record);
        Ok(())
    }

    /// Stop tracking the object starting at the unlabel event's address
    ///
    /// `tracing_enabled` is the replay's "full tracing confirmed on" flag; a
    /// miss under full tracing means the index itself is out of sync.
    ///
    /// # Errors
    /// Fails on an invalid label type, on any miss while `tracing_enabled`,
    /// and on the miss that pushes a kind's count past the tolerance.
    pub fn unregister(
        &mut self,
        event: &UnlabelEvent,
        tracing_enabled: bool,
    ) -> Result<(), LabelMapError> {
        let addr = event.guest_addr;
        let kind = LabelKind::from_raw(event.label_type, addr)?;

        if kind == LabelKind::Block {
            return Ok(());
        }

        if let Some(record) = self.by_start.remove(&addr.0) {
            self.by_last.remove(&record.last().0);
            debug!("unlabel {} {} at {}", record.id(), kind, addr);
            return Ok(());
        }

        let misses = &mut self.misses[kind.index()];
        *misses += 1;

        if tracing_enabled {
            return Err(LabelMapError::MissWhileEnabled { kind, addr });
        }
        if *misses > self.miss_tolerance {
            return Err(LabelMapError::TooManyMisses { kind, addr, misses: *misses });
        }

        debug!("tolerated {kind} unlabel miss at {addr} ({misses} so far)");
        Ok(())
    }

    /// The live object covering `addr`, if any
    #[must_use]
    pub fn lookup_point(&self, addr: GuestAddr) -> Option<ObjectRecord> {
        self.lower_bound_by_last(addr.0).filter(|o| o.contains(addr)).cloned()
    }

    /// Every live object intersecting the cache line that holds `addr`
    ///
    /// Results are ordered by ascending end address.
    #[must_use]
    pub fn lookup_cacheline(&self, addr: GuestAddr) -> Vec<ObjectRecord> {
        let line_first = addr.0 & !(CACHE_LINE_SIZE - 1);
        let line_last = line_first + (CACHE_LINE_SIZE - 1);

        self.by_last
            .range(line_first..)
            .filter_map(|(_, start)| self.by_start.get(start))
            .take_while(|o| o.start().0 <= line_last)
            .cloned()
            .collect()
    }

    /// The live object with the lowest last byte at or after `addr`
    ///
    /// This is the nearest object that has not ended before `addr`; it may
    /// start after `addr`.
    #[must_use]
    pub fn first_ending_at_or_after(&self, addr: GuestAddr) -> Option<ObjectRecord> {
        self.lower_bound_by_last(addr.0).cloned()
    }

    fn lower_bound_by_last(&self, addr: u64) -> Option<&ObjectRecord> {
        let (_, start) = self.by_last.range(addr..).next()?;
        self.by_start.get(start)
    }

    /// Number of live objects
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_start.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_start.is_empty()
    }

    /// Unlabel misses absorbed so far for `kind`
    #[must_use]
    pub fn misses(&self, kind: LabelKind) -> u64 {
        self.misses[kind.index()]
    }

    /// Identities handed out since construction
    #[must_use]
    pub fn objects_created(&self) -> u64 {
        self.last_id
    }

    /// Copies of all live objects, ascending by start address
    #[must_use]
    pub fn snapshot(&self) -> Vec<ObjectRecord> {
        self.by_start.values().cloned().collect()
    }

    #[must_use]
    pub fn stats(&self) -> LabelMapStats {
        LabelMapStats {
            live_objects: self.len(),
            objects_created: self.objects_created(),
            misses: LabelKind::ALL
                .iter()
                .filter(|&&kind| kind != LabelKind::Block)
                .map(|&kind| (kind.to_string(), self.misses(kind)))
                .collect(),
        }
    }
}
