//! Shared replay state read and updated by handlers

use serde::Serialize;

use crate::config::ScanConfig;
use crate::domain::{CpuId, Pc, ReplayError, Tid};
use crate::label_map::LabelMap;

/// Description of the traced workload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraceSummary {
    pub app_ops: u64,
    pub num_cpus: u32,
    pub num_ram: u64,
}

/// State every handler may consult
///
/// One instance per replay; handlers receive it explicitly instead of
/// reaching for process-wide globals.
#[derive(Debug)]
pub struct TraceContext {
    /// Full access tracing has been confirmed on
    pub tracing_enabled: bool,
    pub summary: TraceSummary,
    call_pc: Vec<Pc>,
    tid: Vec<Tid>,
    label_map: LabelMap,
}

impl TraceContext {
    #[must_use]
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            tracing_enabled: false,
            summary: TraceSummary::default(),
            call_pc: vec![Pc::UNKNOWN; config.max_cpus],
            tid: vec![Tid::default(); config.max_cpus],
            label_map: LabelMap::with_config(config),
        }
    }

    #[must_use]
    pub fn label_map(&self) -> &LabelMap {
        &self.label_map
    }

    pub fn label_map_mut(&mut self) -> &mut LabelMap {
        &mut self.label_map
    }

    /// Current call/kernel entry point on `cpu`
    #[must_use]
    pub fn call_pc(&self, cpu: CpuId) -> Option<Pc> {
        self.call_pc.get(cpu.0 as usize).copied()
    }

    /// Task currently running on `cpu`
    #[must_use]
    pub fn tid(&self, cpu: CpuId) -> Option<Tid> {
        self.tid.get(cpu.0 as usize).copied()
    }

    /// Record a new call/kernel entry on `cpu`
    ///
    /// # Errors
    /// Returns `ReplayError::CpuOutOfRange` if `cpu` exceeds the configured CPU count
    pub fn set_call(&mut self, cpu: CpuId, tid: Tid, pc: Pc) -> Result<(), ReplayError> {
        let max = self.call_pc.len();
        let idx = cpu.0 as usize;
        if idx >= max {
            return Err(ReplayError::CpuOutOfRange { cpu: cpu.0, max });
        }
        self.call_pc[idx] = pc;
        self.tid[idx] = tid;
        Ok(())
    }
}
