/// Optional per-action tracing of timeline snapshots.
///
/// The tracer buffers a header, the timeline before the action, the action
/// itself, the timeline after it and any log lines written in between, then
/// hands the whole group to a [`TraceSink`] in one call. How the group is
/// displayed is entirely up to the sink.
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::action::ActionDescriptor;

/// One buffered action, ready to be emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceGroup {
    pub header: String,
    pub before: String,
    pub action: String,
    pub after: String,
    pub messages: Vec<String>,
}

/// Receives completed trace groups.
pub trait TraceSink: Send + Sync {
    fn emit(&self, group: &TraceGroup);
}

/// Emits each group as a `tracing` span with one debug event per section.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn emit(&self, group: &TraceGroup) {
        let span = tracing::debug_span!("history", header = %group.header);
        let _guard = span.enter();
        tracing::debug!(snapshot = %group.before, "prev history");
        tracing::debug!(action = %group.action, "action");
        tracing::debug!(snapshot = %group.after, "next history");
        for message in &group.messages {
            tracing::debug!("{message}");
        }
    }
}

/// Keeps every emitted group in memory.
///
/// Clones share the same buffer, so a host can hand one clone to an engine
/// and read the groups back through another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    groups: Arc<Mutex<Vec<TraceGroup>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every group emitted so far.
    pub fn groups(&self) -> Vec<TraceGroup> {
        match self.groups.lock() {
            Ok(groups) => groups.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl TraceSink for MemorySink {
    fn emit(&self, group: &TraceGroup) {
        match self.groups.lock() {
            Ok(mut groups) => groups.push(group.clone()),
            Err(poisoned) => poisoned.into_inner().push(group.clone()),
        }
    }
}

/// Buffers one action at a time and flushes it to a sink.
///
/// When disabled, every method returns immediately without formatting
/// anything.
#[derive(Clone)]
pub struct DebugTracer {
    enabled: bool,
    sink: Arc<dyn TraceSink>,
    buffer: TraceGroup,
}

impl fmt::Debug for DebugTracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugTracer")
            .field("enabled", &self.enabled)
            .field("buffered_messages", &self.buffer.messages.len())
            .finish()
    }
}

impl Default for DebugTracer {
    fn default() -> Self {
        Self::disabled()
    }
}

impl DebugTracer {
    /// A tracer that does nothing.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            sink: Arc::new(TracingSink),
            buffer: TraceGroup::default(),
        }
    }

    /// A tracer writing to the `tracing` facade when `enabled`.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::disabled()
        }
    }

    /// A tracer writing to `sink` when `enabled`.
    pub fn with_sink(enabled: bool, sink: Arc<dyn TraceSink>) -> Self {
        Self {
            enabled,
            sink,
            buffer: TraceGroup::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Starts a new group for `action`, discarding anything left buffered.
    pub fn start(&mut self, action: &ActionDescriptor, before: &impl fmt::Debug) {
        if !self.enabled {
            return;
        }
        self.buffer = TraceGroup {
            header: format!("undo action {}", action.kind),
            before: format!("{before:?}"),
            action: action.to_string(),
            ..TraceGroup::default()
        };
    }

    /// Appends a free-form line to the current group.
    pub fn log(&mut self, message: impl fmt::Display) {
        if !self.enabled {
            return;
        }
        self.buffer.messages.push(message.to_string());
    }

    /// Records the resulting snapshot, emits the group and resets the buffer.
    pub fn end(&mut self, after: &impl fmt::Debug) {
        if !self.enabled {
            return;
        }
        self.buffer.after = format!("{after:?}");
        let group = std::mem::take(&mut self.buffer);
        self.sink.emit(&group);
    }
}
