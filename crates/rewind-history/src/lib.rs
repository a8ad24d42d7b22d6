/// Host-agnostic undo/redo history.
///
/// A [`HistoryEngine`] owns one past / present / future timeline of opaque
/// snapshots and guards every change with a retention limit and an
/// [`ActionFilter`]. A [`HistoryRegistry`] keeps one engine per named field
/// (or a single shared one) and fans operations out across them, returning
/// patches for the host to merge into its own state.
pub mod action;
pub mod config;
pub mod engine;
pub mod filter;
pub mod registry;
pub mod timeline;
pub mod tracer;

pub use action::{ActionDescriptor, ActionKind, ActionResult};
pub use config::HistoryConfig;
pub use engine::HistoryEngine;
pub use filter::{exclude_filter, include_filter, ActionFilter};
pub use registry::{Dispatch, HistoryRegistry, Observer, Operation, Patch, Snapshot};
pub use timeline::Timeline;
pub use tracer::{DebugTracer, MemorySink, TraceGroup, TraceSink, TracingSink};
