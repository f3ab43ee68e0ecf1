//! Typed trace entries handed to [`EntryHandler`](super::EntryHandler)s

use mscan_common::{
    FcallEntry, HostEntry, LabelEntry, MachineEntry, UnlabelEntry, HOST_ACCESS, HOST_APP_OPS,
};

use crate::domain::{CpuId, Pc, ReplayError, Tid};
use crate::label_map::{LabelEvent, UnlabelEvent};

/// Host-side control record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// Full access tracing switched on or off
    Access { enabled: bool },
    /// Workload progress report
    AppOps(u64),
}

impl TryFrom<&HostEntry> for HostEvent {
    type Error = ReplayError;

    fn try_from(entry: &HostEntry) -> Result<Self, Self::Error> {
        match entry.host_type {
            HOST_ACCESS => Ok(HostEvent::Access { enabled: entry.value != 0 }),
            HOST_APP_OPS => Ok(HostEvent::AppOps(entry.value)),
            other => Err(ReplayError::UnknownHostType(other)),
        }
    }
}

/// Call / kernel entry on one CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FcallEvent {
    pub cpu: CpuId,
    pub tid: Tid,
    pub pc: Pc,
}

impl From<&FcallEntry> for FcallEvent {
    fn from(entry: &FcallEntry) -> Self {
        Self { cpu: CpuId(entry.cpu), tid: Tid(entry.tid), pc: Pc(entry.pc) }
    }
}

/// Guest machine description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineEvent {
    pub num_cpus: u32,
    pub num_ram: u64,
}

impl From<&MachineEntry> for MachineEvent {
    fn from(entry: &MachineEntry) -> Self {
        Self { num_cpus: entry.num_cpus, num_ram: entry.num_ram }
    }
}

/// One decoded trace record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEntry {
    Host(HostEvent),
    Machine(MachineEvent),
    Label(LabelEvent),
    Unlabel(UnlabelEvent),
    Fcall(FcallEvent),
}

impl TraceEntry {
    /// Short name for logs and per-type counters
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            TraceEntry::Host(_) => "host",
            TraceEntry::Machine(_) => "machine",
            TraceEntry::Label(_) => "label",
            TraceEntry::Unlabel(_) => "unlabel",
            TraceEntry::Fcall(_) => "fcall",
        }
    }
}

impl TryFrom<&HostEntry> for TraceEntry {
    type Error = ReplayError;

    fn try_from(entry: &HostEntry) -> Result<Self, Self::Error> {
        HostEvent::try_from(entry).map(TraceEntry::Host)
    }
}

impl From<&MachineEntry> for TraceEntry {
    fn from(entry: &MachineEntry) -> Self {
        TraceEntry::Machine(entry.into())
    }
}

impl From<&LabelEntry> for TraceEntry {
    fn from(entry: &LabelEntry) -> Self {
        TraceEntry::Label(entry.into())
    }
}

impl From<&UnlabelEntry> for TraceEntry {
    fn from(entry: &UnlabelEntry) -> Self {
        TraceEntry::Unlabel(entry.into())
    }
}

impl From<&FcallEntry> for TraceEntry {
    fn from(entry: &FcallEntry) -> Self {
        TraceEntry::Fcall(entry.into())
    }
}
