/// Configuration for a single history timeline.
use crate::action::ActionKind;
use crate::filter::{exclude_filter, include_filter, ActionFilter};

/// Configuration for a `HistoryEngine`.
///
/// Every field is type-checked, so a constructed config is always usable.
/// User-supplied values (negative limits, conflicting filter lists) are
/// rejected by the settings layer before they reach this type.
#[derive(Debug, Clone)]
pub struct HistoryConfig<S> {
    /// Bound on `len(past) + len(future)`. `None` keeps everything.
    pub limit: Option<usize>,
    /// Admission filter consulted before every commit.
    pub filter: ActionFilter<S>,
    /// Whether each action is traced through the debug tracer.
    pub debug: bool,
}

impl<S> Default for HistoryConfig<S> {
    fn default() -> Self {
        Self {
            limit: None,
            filter: ActionFilter::AllowAll,
            debug: false,
        }
    }
}

impl<S> HistoryConfig<S> {
    /// Sets the retention limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Replaces the admission filter.
    pub fn with_filter(mut self, filter: ActionFilter<S>) -> Self {
        self.filter = filter;
        self
    }

    /// Admits only `kinds`.
    pub fn including(self, kinds: impl IntoIterator<Item = ActionKind>) -> Self {
        self.with_filter(include_filter(kinds))
    }

    /// Admits everything except `kinds`.
    pub fn excluding(self, kinds: impl IntoIterator<Item = ActionKind>) -> Self {
        self.with_filter(exclude_filter(kinds))
    }

    /// Enables or disables action tracing.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
