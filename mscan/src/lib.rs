//! # mscan - Guest Memory Object Attribution for mtrace Replays
//!
//! mscan replays the memory-trace records produced by an instrumented guest
//! (an mtrace-enabled VM running an instrumented kernel) and keeps track of
//! which dynamically allocated object owns each guest address at every point
//! of the replay. Downstream analyses such as cache-line contention or false
//! sharing detection build on that "what object lives here" primitive.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              Instrumented Guest (VM / kernel)                   │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ per-CPU trace streams
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │         Trace Reader (external, produces mscan-common records)  │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ TraceEntry
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      mscan (This Crate)                         │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │   Replay     │──▶│   Default    │──▶│   Analysis   │         │
//! │  │ (interleave) │   │   Handler    │   │   Handlers   │         │
//! │  └──────────────┘   └──────┬───────┘   └──────┬───────┘         │
//! │                            │ label/unlabel    │ lookups         │
//! │                            ▼                  ▼                 │
//! │                     ┌──────────────────────────────┐            │
//! │                     │     Label Map (live objects) │            │
//! │                     └──────────────────────────────┘            │
//! │                                               │ alloc PC        │
//! │                                               ▼                 │
//! │                                        ┌──────────────┐         │
//! │                                        │  Symbolizer  │         │
//! │                                        │   (DWARF)    │         │
//! │                                        └──────────────┘         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`label_map`]: The address-range index of live objects
//!   - Point lookup: the object covering an address
//!   - Cache-line lookup: every object sharing a 64-byte line
//!   - Bounded tolerance for frees of objects allocated before tracing began
//!
//! - [`handlers`]: The [`EntryHandler`](handlers::EntryHandler) interface and
//!   the explicit [`TraceContext`](handlers::TraceContext) shared by handlers
//!
//! - [`replay`]: Merges per-CPU streams by timestamp and drives the handlers,
//!   halting on the first fatal error
//!
//! - [`symbolization`]: Allocation-site PC → function/file/line
//!
//! - [`config`]: Replay configuration
//!
//! - [`domain`]: Core domain types (`GuestAddr`, `ObjectId`, `Pc`, `LabelKind`)
//!   and errors
//!
//! ## Typical Usage
//!
//! ```rust
//! use mscan::config::ScanConfig;
//! use mscan::domain::GuestAddr;
//! use mscan::handlers::TraceEntry;
//! use mscan::label_map::LabelEvent;
//! use mscan::replay::Replayer;
//! use mscan_common::LABEL_HEAP;
//!
//! let mut replayer = Replayer::new(&ScanConfig::default());
//! let label = LabelEvent::new(LABEL_HEAP, 0x1000, 16, 0x4000).with_name("kmalloc-16");
//! replayer.apply(&TraceEntry::Label(label)).unwrap();
//!
//! let object = replayer.context().label_map().lookup_point(GuestAddr(0x1008)).unwrap();
//! assert_eq!(object.name(), "kmalloc-16");
//! ```
//!
//! ## Key Concepts
//!
//! - **Label / unlabel**: trace records marking an object's allocation / free
//! - **Guest address**: an address in the traced machine, not in this process
//! - **Cache line**: 64-byte aligned interval, the unit of sharing analysis
//! - **Block label**: page-allocator label kind, accepted but never tracked

pub mod config;
pub mod domain;
pub mod handlers;
pub mod label_map;
pub mod replay;
pub mod symbolization;
