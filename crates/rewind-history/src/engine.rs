/// Undo/redo engine for a single timeline.
///
/// Every navigation goes through the same admission protocol: the
/// structural precondition is checked while computing the prospective
/// timeline, then the filter is asked about it, and only when both pass
/// does the prospective timeline replace the live one. A declined action
/// leaves the timeline exactly as it was and reports
/// [`ActionResult::NotApplicable`].
///
/// `enqueue` does not discard the future. After undoing and enqueuing a new
/// value, the undone entries are still reachable with `redo`; only `clear`
/// empties the future.
use std::fmt::Debug;
use std::sync::Arc;

use crate::action::{ActionDescriptor, ActionKind, ActionResult};
use crate::config::HistoryConfig;
use crate::timeline::Timeline;
use crate::tracer::{DebugTracer, TraceSink};

/// Owns one timeline and the policy that guards it.
#[derive(Debug, Clone)]
pub struct HistoryEngine<S> {
    timeline: Timeline<S>,
    /// Present value restored by `clear`.
    baseline: Option<S>,
    config: HistoryConfig<S>,
    tracer: DebugTracer,
}

impl<S: Clone + Debug> HistoryEngine<S> {
    /// Creates an engine with an empty timeline.
    ///
    /// Tracing goes through the `tracing` facade when `config.debug` is set.
    pub fn new(config: HistoryConfig<S>) -> Self {
        let tracer = DebugTracer::new(config.debug);
        Self::with_tracer(config, tracer)
    }

    /// Creates an engine whose present and clear baseline are `value`.
    pub fn with_initial(config: HistoryConfig<S>, value: S) -> Self {
        let mut engine = Self::new(config);
        engine.init_state(value, false);
        engine
    }

    /// Creates an engine reporting to an explicit tracer.
    pub fn with_tracer(config: HistoryConfig<S>, tracer: DebugTracer) -> Self {
        Self {
            timeline: Timeline::new(),
            baseline: None,
            config,
            tracer,
        }
    }

    /// Creates an engine that traces into `sink` when `config.debug` is set.
    pub fn with_sink(config: HistoryConfig<S>, sink: Arc<dyn TraceSink>) -> Self {
        let tracer = DebugTracer::with_sink(config.debug, sink);
        Self::with_tracer(config, tracer)
    }

    /// The current present value, or `None` if nothing was ever set.
    pub fn state(&self) -> Option<&S> {
        self.timeline.present.as_ref()
    }

    /// The whole timeline.
    pub fn history(&self) -> &Timeline<S> {
        &self.timeline
    }

    pub fn config(&self) -> &HistoryConfig<S> {
        &self.config
    }

    /// Whether `undo` would pass its structural precondition.
    pub fn can_undo(&self) -> bool {
        !self.timeline.past.is_empty()
    }

    /// Whether `redo` would pass its structural precondition.
    pub fn can_redo(&self) -> bool {
        !self.timeline.future.is_empty()
    }

    /// Returns `true` unless `result` is the decline sentinel.
    pub fn is_action_data_valid<T>(result: &ActionResult<T>) -> bool {
        result.is_valid()
    }

    /// Records `value` as the clear baseline, and as the present unless
    /// `default_only` is set. Past and future are untouched.
    pub fn init_state(&mut self, value: S, default_only: bool) {
        if !default_only {
            self.timeline.present = Some(value.clone());
        }
        self.baseline = Some(value);
    }

    /// Commits `next` as the present, recording `previous` (or the current
    /// present when `None`) into the past.
    ///
    /// The future is kept. Oldest past entries are evicted to respect the
    /// limit.
    pub fn enqueue(&mut self, next: S, previous: Option<S>) -> ActionResult<S> {
        let action = ActionDescriptor::new(ActionKind::Enqueue);
        self.tracer.start(&action, &self.timeline);

        let (prospective, evicted) = self.timeline.enqueued(next.clone(), previous, self.config.limit);
        let admitted = self.admit(action.kind, prospective);
        if admitted && evicted > 0 {
            self.tracer.log(format_args!("evicted {evicted} oldest entries"));
        }

        self.tracer.end(&self.timeline);
        if admitted {
            ActionResult::Committed(next)
        } else {
            ActionResult::NotApplicable
        }
    }

    /// Makes the last past entry the present.
    pub fn undo(&mut self) -> ActionResult<S> {
        self.navigate(ActionDescriptor::new(ActionKind::Undo), |t| t.rewound(1))
    }

    /// Makes the nearest future entry the present.
    pub fn redo(&mut self) -> ActionResult<S> {
        self.navigate(ActionDescriptor::new(ActionKind::Redo), |t| t.advanced(1))
    }

    /// Moves `n` steps forward (positive) or backward (negative) as one
    /// action. `jump(0)` is always declined.
    pub fn jump(&mut self, n: isize) -> ActionResult<S> {
        let action = ActionDescriptor::with_param(ActionKind::Jump, n as i64);
        self.navigate(action, |t| t.jumped(n))
    }

    /// Makes `past[index]` the present; 0 is the oldest retained entry.
    pub fn jump_to_past(&mut self, index: usize) -> ActionResult<S> {
        let action = ActionDescriptor::with_param(ActionKind::JumpToPast, index as i64);
        self.navigate(action, |t| t.jumped_to_past(index))
    }

    /// Makes `future[index]` the present; 0 is the nearest entry.
    pub fn jump_to_future(&mut self, index: usize) -> ActionResult<S> {
        let action = ActionDescriptor::with_param(ActionKind::JumpToFuture, index as i64);
        self.navigate(action, |t| t.jumped_to_future(index))
    }

    /// Empties past and future and restores the baseline recorded by the
    /// most recent `init_state` (or no present at all).
    ///
    /// Only the filter can decline a clear.
    pub fn clear(&mut self) -> ActionResult<()> {
        let action = ActionDescriptor::new(ActionKind::ClearHistory);
        self.tracer.start(&action, &self.timeline);

        let prospective = Timeline::cleared(self.baseline.clone());
        let admitted = self.admit(action.kind, prospective);

        self.tracer.end(&self.timeline);
        if admitted {
            ActionResult::Committed(())
        } else {
            ActionResult::NotApplicable
        }
    }

    fn navigate<F>(&mut self, action: ActionDescriptor, plan: F) -> ActionResult<S>
    where
        F: FnOnce(&Timeline<S>) -> Option<(Timeline<S>, S)>,
    {
        self.tracer.start(&action, &self.timeline);

        let result = match plan(&self.timeline) {
            Some((prospective, present)) => {
                if self.admit(action.kind, prospective) {
                    ActionResult::Committed(present)
                } else {
                    ActionResult::NotApplicable
                }
            }
            None => {
                self.tracer.log(format_args!(
                    "{action} declined: past={} future={}",
                    self.timeline.past.len(),
                    self.timeline.future.len()
                ));
                tracing::trace!(%action, "action declined by structural precondition");
                ActionResult::NotApplicable
            }
        };

        self.tracer.end(&self.timeline);
        result
    }

    /// Runs the filter on a fully computed prospective timeline and commits
    /// it when admitted.
    fn admit(&mut self, kind: ActionKind, prospective: Timeline<S>) -> bool {
        if !self.config.filter.admits(kind, &prospective, &self.timeline) {
            self.tracer.log(format_args!("{kind} rejected by filter"));
            tracing::trace!(%kind, "action declined by filter");
            return false;
        }
        self.timeline = prospective;
        true
    }
}
