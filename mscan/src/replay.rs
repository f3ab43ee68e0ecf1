//! # Trace Replay
//!
//! Applies decoded entries to the handler chain in one global order.
//!
//! ## Ordering
//!
//! The label map only makes sense under a total order of label/unlabel
//! events. Traces captured per CPU are therefore merged by timestamp with
//! [`interleave`] before being replayed:
//!
//! ```text
//! cpu0: t=1 label A      t=4 unlabel A
//! cpu1:      t=2 label B         t=5 label C
//!                 ↓
//! t=1 label A, t=2 label B, t=4 unlabel A, t=5 label C
//! ```
//!
//! Equal timestamps keep the lower stream first; each stream's own order is
//! always preserved.
//!
//! ## Failure
//!
//! The first handler error halts the replay for good. The offending entry is
//! not passed to later handlers, and every later `apply` returns
//! [`ReplayError::Halted`].

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use log::{info, warn};

use crate::config::ScanConfig;
use crate::domain::ReplayError;
use crate::handlers::{DefaultHandler, EntryHandler, JsonDict, TraceContext, TraceEntry};

/// An entry stamped with its capture time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedEntry {
    pub timestamp: u64,
    pub entry: TraceEntry,
}

impl TimedEntry {
    #[must_use]
    pub fn new(timestamp: u64, entry: TraceEntry) -> Self {
        Self { timestamp, entry }
    }
}

/// Lazily merged view of several timestamp-ordered streams
pub struct Interleave<I> {
    streams: Vec<I>,
    heads: Vec<Option<TimedEntry>>,
    order: BinaryHeap<Reverse<(u64, usize)>>,
}

/// Merge per-CPU streams into one stream ordered by timestamp
///
/// Each input stream must already be sorted by non-decreasing timestamp; the
/// merge only compares stream heads. Debug builds panic on a stream that goes
/// backwards.
pub fn interleave<I>(streams: impl IntoIterator<Item = I>) -> Interleave<I::IntoIter>
where
    I: IntoIterator<Item = TimedEntry>,
{
    let mut streams: Vec<I::IntoIter> = streams.into_iter().map(IntoIterator::into_iter).collect();
    let mut heads = Vec::with_capacity(streams.len());
    let mut order = BinaryHeap::with_capacity(streams.len());

    for (idx, stream) in streams.iter_mut().enumerate() {
        let head = stream.next();
        if let Some(ref entry) = head {
            order.push(Reverse((entry.timestamp, idx)));
        }
        heads.push(head);
    }

    Interleave { streams, heads, order }
}

impl<I: Iterator<Item = TimedEntry>> Iterator for Interleave<I> {
    type Item = TimedEntry;

    fn next(&mut self) -> Option<TimedEntry> {
        let Reverse((_, idx)) = self.order.pop()?;
        let entry = self.heads[idx].take()?;

        let next = self.streams[idx].next();
        if let Some(ref following) = next {
            debug_assert!(
                following.timestamp >= entry.timestamp,
                "stream {idx} goes back in time: {} after {}",
                following.timestamp,
                entry.timestamp
            );
            self.order.push(Reverse((following.timestamp, idx)));
        }
        self.heads[idx] = next;

        Some(entry)
    }
}

/// Drives a [`TraceContext`] and a chain of handlers through a trace
pub struct Replayer {
    ctx: TraceContext,
    handlers: Vec<Box<dyn EntryHandler>>,
    halted: bool,
    /// Entries successfully applied
    pub entry_count: u64,
}

impl Replayer {
    /// Create a replayer with only the [`DefaultHandler`] installed
    #[must_use]
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            ctx: TraceContext::new(config),
            handlers: vec![Box::new(DefaultHandler::new())],
            halted: false,
            entry_count: 0,
        }
    }

    /// Append a handler; it runs after every handler already installed
    pub fn add_handler(&mut self, handler: Box<dyn EntryHandler>) {
        self.handlers.push(handler);
    }

    #[must_use]
    pub fn context(&self) -> &TraceContext {
        &self.ctx
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Run one entry through every handler
    ///
    /// # Errors
    /// Returns the first handler error, after which the replay is halted
    pub fn apply(&mut self, entry: &TraceEntry) -> Result<(), ReplayError> {
        if self.halted {
            return Err(ReplayError::Halted);
        }

        for handler in &mut self.handlers {
            if let Err(err) = handler.handle(&mut self.ctx, entry) {
                warn!(
                    "Replay halted at entry {} ({}): {err}",
                    self.entry_count,
                    entry.type_name()
                );
                self.halted = true;
                return Err(err);
            }
        }

        self.entry_count += 1;
        Ok(())
    }

    /// Apply a whole stream, stopping at the first error
    ///
    /// # Errors
    /// Returns the first handler error
    pub fn apply_all<'a>(
        &mut self,
        entries: impl IntoIterator<Item = &'a TraceEntry>,
    ) -> Result<(), ReplayError> {
        entries.into_iter().try_for_each(|entry| self.apply(entry))
    }

    /// Merge timestamped per-CPU streams and apply them in global order
    ///
    /// # Errors
    /// Returns the first handler error
    pub fn apply_streams<I>(&mut self, streams: impl IntoIterator<Item = I>) -> Result<(), ReplayError>
    where
        I: IntoIterator<Item = TimedEntry>,
    {
        interleave(streams).try_for_each(|timed| self.apply(&timed.entry))
    }

    /// Collect every handler's summary
    pub fn finish(&mut self) -> JsonDict {
        let mut out = JsonDict::new();
        for handler in &mut self.handlers {
            handler.exit(&self.ctx, &mut out);
        }
        info!(
            "Replay finished: {} entries, {} live objects",
            self.entry_count,
            self.ctx.label_map().len()
        );
        out
    }
}
