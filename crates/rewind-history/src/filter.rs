/// Admission filters: one yes/no gate per attempted action.
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::action::ActionKind;
use crate::timeline::Timeline;

/// Custom admission predicate.
///
/// Called as `(kind, prospective, current)` once the prospective timeline
/// has been fully computed.
pub type FilterFn<S> = dyn Fn(ActionKind, &Timeline<S>, &Timeline<S>) -> bool + Send + Sync;

/// Decides whether an attempted action may mutate a timeline.
///
/// The filter only observes; a declined prospective timeline is discarded
/// by the engine.
pub enum ActionFilter<S> {
    /// Admits every action.
    AllowAll,
    /// Admits only the listed kinds.
    Include(BTreeSet<ActionKind>),
    /// Admits every kind except the listed ones.
    Exclude(BTreeSet<ActionKind>),
    Custom(Arc<FilterFn<S>>),
}

impl<S> ActionFilter<S> {
    /// Wraps a closure as a custom filter.
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(ActionKind, &Timeline<S>, &Timeline<S>) -> bool + Send + Sync + 'static,
    {
        ActionFilter::Custom(Arc::new(predicate))
    }

    /// Whether `kind` may move `current` to `prospective`.
    pub fn admits(&self, kind: ActionKind, prospective: &Timeline<S>, current: &Timeline<S>) -> bool {
        match self {
            ActionFilter::AllowAll => true,
            ActionFilter::Include(kinds) => kinds.contains(&kind),
            ActionFilter::Exclude(kinds) => !kinds.contains(&kind),
            ActionFilter::Custom(predicate) => predicate(kind, prospective, current),
        }
    }

    /// Whether this filter admits every action without looking at it.
    pub fn is_allow_all(&self) -> bool {
        matches!(self, ActionFilter::AllowAll)
    }
}

/// Builds a filter admitting only `kinds`.
pub fn include_filter<S>(kinds: impl IntoIterator<Item = ActionKind>) -> ActionFilter<S> {
    ActionFilter::Include(kinds.into_iter().collect())
}

/// Builds a filter admitting everything except `kinds`.
pub fn exclude_filter<S>(kinds: impl IntoIterator<Item = ActionKind>) -> ActionFilter<S> {
    ActionFilter::Exclude(kinds.into_iter().collect())
}

impl<S> Default for ActionFilter<S> {
    fn default() -> Self {
        ActionFilter::AllowAll
    }
}

impl<S> Clone for ActionFilter<S> {
    fn clone(&self) -> Self {
        match self {
            ActionFilter::AllowAll => ActionFilter::AllowAll,
            ActionFilter::Include(kinds) => ActionFilter::Include(kinds.clone()),
            ActionFilter::Exclude(kinds) => ActionFilter::Exclude(kinds.clone()),
            ActionFilter::Custom(predicate) => ActionFilter::Custom(Arc::clone(predicate)),
        }
    }
}

impl<S> fmt::Debug for ActionFilter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionFilter::AllowAll => f.write_str("AllowAll"),
            ActionFilter::Include(kinds) => f.debug_tuple("Include").field(kinds).finish(),
            ActionFilter::Exclude(kinds) => f.debug_tuple("Exclude").field(kinds).finish(),
            ActionFilter::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
