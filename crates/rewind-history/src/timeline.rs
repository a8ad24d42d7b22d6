/// The past / present / future triple and its pure transitions.
///
/// Transitions never touch `self`: each returns the prospective timeline
/// alongside the value that becomes the new present, or `None` when the
/// structural precondition does not hold. The engine decides whether the
/// prospective timeline is committed.
use std::collections::VecDeque;

/// A navigable history of snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline<S> {
    /// Previously active snapshots, oldest first.
    pub past: VecDeque<S>,
    /// The active snapshot. `None` until a value has ever been set.
    pub present: Option<S>,
    /// Undone snapshots, nearest first.
    pub future: VecDeque<S>,
}

impl<S> Default for Timeline<S> {
    fn default() -> Self {
        Self {
            past: VecDeque::new(),
            present: None,
            future: VecDeque::new(),
        }
    }
}

impl<S: Clone> Timeline<S> {
    /// Creates an empty timeline with no present value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a timeline whose present is `value` and whose history is empty.
    pub fn seeded(value: S) -> Self {
        Self {
            present: Some(value),
            ..Self::default()
        }
    }

    /// Combined number of entries in `past` and `future`.
    pub fn len(&self) -> usize {
        self.past.len() + self.future.len()
    }

    /// Whether both `past` and `future` are empty.
    pub fn is_empty(&self) -> bool {
        self.past.is_empty() && self.future.is_empty()
    }

    /// Records `previous` and makes `next` the present.
    ///
    /// The future is left in place. With a `limit`, the oldest past entries
    /// are evicted until `len(past) + len(future) <= limit` or past is
    /// empty. Returns the prospective timeline and the number of evictions.
    pub(crate) fn enqueued(&self, next: S, previous: Option<S>, limit: Option<usize>) -> (Self, usize) {
        let mut prospective = self.clone();
        if let Some(previous) = previous.or_else(|| self.present.clone()) {
            prospective.past.push_back(previous);
        }
        prospective.present = Some(next);

        let mut evicted = 0;
        if let Some(limit) = limit {
            while prospective.len() > limit && prospective.past.pop_front().is_some() {
                evicted += 1;
            }
        }
        (prospective, evicted)
    }

    /// Moves `steps` entries back: `past[len - steps]` becomes the present,
    /// and everything after it, followed by the old present, is prepended to
    /// `future` in chronological order.
    pub(crate) fn rewound(&self, steps: usize) -> Option<(Self, S)> {
        if steps == 0 || self.past.len() < steps {
            return None;
        }
        let mut prospective = self.clone();
        let split = prospective.past.len() - steps;
        let mut moved = prospective.past.split_off(split);
        let present = moved.pop_front()?;

        if let Some(old) = prospective.present.replace(present.clone()) {
            moved.push_back(old);
        }
        moved.append(&mut prospective.future);
        prospective.future = moved;
        Some((prospective, present))
    }

    /// Moves `steps` entries forward: `future[steps - 1]` becomes the
    /// present, and the old present followed by `future[..steps - 1]` is
    /// appended to `past` in chronological order.
    pub(crate) fn advanced(&self, steps: usize) -> Option<(Self, S)> {
        if steps == 0 || self.future.len() < steps {
            return None;
        }
        let mut prospective = self.clone();
        let rest = prospective.future.split_off(steps);
        let mut moved = std::mem::replace(&mut prospective.future, rest);
        let present = moved.pop_back()?;

        if let Some(old) = prospective.present.replace(present.clone()) {
            prospective.past.push_back(old);
        }
        prospective.past.append(&mut moved);
        Some((prospective, present))
    }

    /// Relative jump: positive `n` advances, negative `n` rewinds, zero is
    /// never valid.
    pub(crate) fn jumped(&self, n: isize) -> Option<(Self, S)> {
        match n {
            0 => None,
            n if n > 0 => self.advanced(n.unsigned_abs()),
            n => self.rewound(n.unsigned_abs()),
        }
    }

    /// Absolute jump to `past[index]` (0 is the oldest retained entry).
    pub(crate) fn jumped_to_past(&self, index: usize) -> Option<(Self, S)> {
        if index >= self.past.len() {
            return None;
        }
        self.rewound(self.past.len() - index)
    }

    /// Absolute jump to `future[index]` (0 is the nearest entry).
    pub(crate) fn jumped_to_future(&self, index: usize) -> Option<(Self, S)> {
        if index >= self.future.len() {
            return None;
        }
        self.advanced(index + 1)
    }

    /// Empty history with `baseline` as the present.
    pub(crate) fn cleared(baseline: Option<S>) -> Self {
        Self {
            present: baseline,
            ..Self::default()
        }
    }
}
