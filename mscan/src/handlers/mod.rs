//! # Entry Handlers
//!
//! Analyses plug into the replay as [`EntryHandler`]s. Each handler sees every
//! decoded entry, in global trace order, together with the shared
//! [`TraceContext`]:
//!
//! - `tracing_enabled`: whether full access tracing is confirmed on
//! - `summary`: machine and workload description
//! - per-CPU current call PC and task ID
//! - the [`LabelMap`](crate::label_map::LabelMap) of live objects
//!
//! The [`DefaultHandler`] owns all updates to that context. Other handlers
//! read it, typically calling `lookup_point` / `lookup_cacheline` on the label
//! map and resolving the returned allocation PCs through a
//! [`PcResolver`](crate::symbolization::PcResolver).
//!
//! At the end of the replay each handler's `exit` may add its results to a
//! shared JSON dictionary.

pub mod context;
pub mod default_handler;
pub mod entry;

pub use context::{TraceContext, TraceSummary};
pub use default_handler::DefaultHandler;
pub use entry::{FcallEvent, HostEvent, MachineEvent, TraceEntry};

use crate::domain::ReplayError;

/// Output dictionary handlers write their summaries into
pub type JsonDict = serde_json::Map<String, serde_json::Value>;

/// A stage of trace processing
pub trait EntryHandler {
    /// Process one entry
    ///
    /// # Errors
    /// Any error is fatal for the whole replay.
    fn handle(&mut self, ctx: &mut TraceContext, entry: &TraceEntry) -> Result<(), ReplayError>;

    /// Called once after the last entry
    fn exit(&mut self, _ctx: &TraceContext, _out: &mut JsonDict) {}
}
