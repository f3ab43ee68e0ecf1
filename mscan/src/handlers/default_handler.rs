use log::info;
use serde_json::{json, Value};

use super::{EntryHandler, FcallEvent, HostEvent, JsonDict, TraceContext, TraceEntry};
use crate::domain::ReplayError;

/// Keeps the shared [`TraceContext`] in step with the trace
///
/// Installed first by the [`Replayer`](crate::replay::Replayer) so that
/// handlers later in the chain see the label map and per-CPU state already
/// updated for the entry they are looking at.
#[derive(Debug, Default)]
pub struct DefaultHandler {
    pub host_count: u64,
    pub machine_count: u64,
    pub label_count: u64,
    pub unlabel_count: u64,
    pub fcall_count: u64,
}

impl DefaultHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn handle_host(ctx: &mut TraceContext, event: HostEvent) {
        match event {
            HostEvent::Access { enabled } => {
                if enabled != ctx.tracing_enabled {
                    info!("Full tracing {}", if enabled { "enabled" } else { "disabled" });
                }
                ctx.tracing_enabled = enabled;
            }
            HostEvent::AppOps(ops) => ctx.summary.app_ops = ops,
        }
    }

    fn handle_fcall(ctx: &mut TraceContext, event: &FcallEvent) -> Result<(), ReplayError> {
        ctx.set_call(event.cpu, event.tid, event.pc)
    }
}

impl EntryHandler for DefaultHandler {
    fn handle(&mut self, ctx: &mut TraceContext, entry: &TraceEntry) -> Result<(), ReplayError> {
        match entry {
            TraceEntry::Host(event) => {
                self.host_count += 1;
                Self::handle_host(ctx, *event);
            }
            TraceEntry::Machine(event) => {
                self.machine_count += 1;
                ctx.summary.num_cpus = event.num_cpus;
                ctx.summary.num_ram = event.num_ram;
            }
            TraceEntry::Label(event) => {
                self.label_count += 1;
                ctx.label_map_mut().register(event)?;
            }
            TraceEntry::Unlabel(event) => {
                self.unlabel_count += 1;
                let tracing_enabled = ctx.tracing_enabled;
                ctx.label_map_mut().unregister(event, tracing_enabled)?;
            }
            TraceEntry::Fcall(event) => {
                self.fcall_count += 1;
                Self::handle_fcall(ctx, event)?;
            }
        }
        Ok(())
    }

    fn exit(&mut self, ctx: &TraceContext, out: &mut JsonDict) {
        out.insert("summary".to_string(), json!(ctx.summary));
        out.insert("label_map".to_string(), json!(ctx.label_map().stats()));
        out.insert(
            "entries".to_string(),
            json!({
                "host": self.host_count,
                "machine": self.machine_count,
                "label": self.label_count,
                "unlabel": self.unlabel_count,
                "fcall": self.fcall_count,
            }),
        );
        out.insert("tracing_enabled".to_string(), Value::Bool(ctx.tracing_enabled));
    }
}
