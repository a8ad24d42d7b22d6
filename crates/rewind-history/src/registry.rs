/// Many independent timelines keyed by field name.
///
/// A registry either observes the whole composite state through one shared
/// engine, or keeps one engine per named field. The choice is made once at
/// construction. Operations can target a single field or fan out over every
/// engine; either way the caller gets back a patch holding only the values
/// that were actually committed, ready to merge into its own state.
use std::fmt::Debug;
use std::hash::Hash;

use anyhow::{bail, Result};
use indexmap::IndexMap;

use crate::action::ActionResult;
use crate::config::HistoryConfig;
use crate::engine::HistoryEngine;
use crate::timeline::Timeline;

/// Composite host state, in field insertion order.
pub type Snapshot<K, V> = IndexMap<K, V>;

/// Partial state to merge into the host's composite state.
pub type Patch<K, V> = IndexMap<K, V>;

/// What a registry observes. Fixed for the registry's lifetime.
#[derive(Debug, Clone)]
pub enum Observer<K, V> {
    /// One shared timeline whose snapshots are the whole composite state.
    All(HistoryConfig<Snapshot<K, V>>),
    /// One independent timeline per listed field.
    Fields(Vec<K>, HistoryConfig<V>),
}

/// A navigation that can be fanned out over engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Undo,
    Redo,
    Jump(isize),
    JumpToPast(usize),
    JumpToFuture(usize),
    Clear,
}

/// Outcome of one registry call.
#[derive(Debug, Clone)]
pub struct Dispatch<K, V> {
    /// One result per attempted engine, in key order.
    pub results: Vec<ActionResult<Patch<K, V>>>,
    /// Union of the committed results.
    pub patch: Patch<K, V>,
    /// Fields left with no value by a committed clear. The host should
    /// drop them from its state.
    pub cleared: Vec<K>,
}

impl<K: Eq + Hash, V> Dispatch<K, V> {
    fn empty() -> Self {
        Self {
            results: Vec::new(),
            patch: Patch::new(),
            cleared: Vec::new(),
        }
    }

    fn from_results(results: Vec<ActionResult<Patch<K, V>>>) -> Self
    where
        K: Clone,
        V: Clone,
    {
        let mut patch = Patch::new();
        for result in &results {
            if let Some(committed) = result.value() {
                patch.extend(committed.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        Self {
            results,
            patch,
            cleared: Vec::new(),
        }
    }

    fn with_cleared(mut self, cleared: Vec<K>) -> Self {
        self.cleared = cleared;
        self
    }

    /// Whether at least one engine committed.
    pub fn any_committed(&self) -> bool {
        self.results.iter().any(ActionResult::is_valid)
    }
}

#[derive(Debug, Clone)]
enum Engines<K, V> {
    Shared(HistoryEngine<Snapshot<K, V>>),
    Keyed(IndexMap<K, HistoryEngine<V>>),
}

/// Owns a set of timelines and fans operations out across them.
#[derive(Debug, Clone)]
pub struct HistoryRegistry<K, V> {
    engines: Engines<K, V>,
}

impl<K, V> HistoryRegistry<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone + Debug,
{
    /// Builds the engines for `observer`.
    ///
    /// # Errors
    ///
    /// Returns an error if a field is listed twice.
    pub fn new(observer: Observer<K, V>) -> Result<Self> {
        let engines = match observer {
            Observer::All(config) => Engines::Shared(HistoryEngine::new(config)),
            Observer::Fields(keys, config) => {
                let mut engines = IndexMap::with_capacity(keys.len());
                for key in keys {
                    if engines.contains_key(&key) {
                        bail!("field {key:?} is observed more than once");
                    }
                    engines.insert(key, HistoryEngine::new(config.clone()));
                }
                Engines::Keyed(engines)
            }
        };
        Ok(Self { engines })
    }

    /// A registry with one shared timeline.
    pub fn all(config: HistoryConfig<Snapshot<K, V>>) -> Self {
        Self {
            engines: Engines::Shared(HistoryEngine::new(config)),
        }
    }

    /// A registry with one timeline per field in `keys`.
    ///
    /// # Errors
    ///
    /// Returns an error if a field is listed twice.
    pub fn fields(keys: impl IntoIterator<Item = K>, config: HistoryConfig<V>) -> Result<Self> {
        Self::new(Observer::Fields(keys.into_iter().collect(), config))
    }

    /// Whether a single shared timeline observes the whole state.
    pub fn observes_all(&self) -> bool {
        matches!(self.engines, Engines::Shared(_))
    }

    /// Observed fields, in registration order. Empty for a shared registry.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        let keyed = match &self.engines {
            Engines::Keyed(engines) => Some(engines.keys()),
            Engines::Shared(_) => None,
        };
        keyed.into_iter().flatten()
    }

    /// The engine for `key`, if that field is observed on its own timeline.
    pub fn engine(&self, key: &K) -> Option<&HistoryEngine<V>> {
        match &self.engines {
            Engines::Keyed(engines) => engines.get(key),
            Engines::Shared(_) => None,
        }
    }

    /// The shared engine, if this registry observes everything.
    pub fn shared(&self) -> Option<&HistoryEngine<Snapshot<K, V>>> {
        match &self.engines {
            Engines::Shared(engine) => Some(engine),
            Engines::Keyed(_) => None,
        }
    }

    /// Present value of `key`, from its own timeline or the shared one.
    pub fn state(&self, key: &K) -> Option<&V> {
        match &self.engines {
            Engines::Keyed(engines) => engines.get(key)?.state(),
            Engines::Shared(engine) => engine.state()?.get(key),
        }
    }

    /// Timeline of `key` when fields are observed independently.
    pub fn history(&self, key: &K) -> Option<&Timeline<V>> {
        self.engine(key).map(HistoryEngine::history)
    }

    /// Composite of every present value.
    pub fn snapshot(&self) -> Snapshot<K, V> {
        match &self.engines {
            Engines::Shared(engine) => engine.state().cloned().unwrap_or_default(),
            Engines::Keyed(engines) => engines
                .iter()
                .filter_map(|(k, engine)| Some((k.clone(), engine.state()?.clone())))
                .collect(),
        }
    }

    /// Seeds timelines from `snapshot`.
    ///
    /// Per-field registries seed each observed field present in `snapshot`;
    /// a shared registry seeds its timeline with the whole snapshot.
    pub fn init_state(&mut self, snapshot: &Snapshot<K, V>, default_only: bool) {
        match &mut self.engines {
            Engines::Shared(engine) => engine.init_state(snapshot.clone(), default_only),
            Engines::Keyed(engines) => {
                for (key, engine) in engines.iter_mut() {
                    if let Some(value) = snapshot.get(key) {
                        engine.init_state(value.clone(), default_only);
                    }
                }
            }
        }
    }

    /// Records `changes` made on top of `previous`.
    ///
    /// Per-field registries enqueue each changed, observed field with its
    /// value from `previous`; unobserved fields are ignored. A shared
    /// registry enqueues `previous` overlaid with `changes`.
    pub fn enqueue(&mut self, changes: Patch<K, V>, previous: &Snapshot<K, V>) -> Dispatch<K, V> {
        match &mut self.engines {
            Engines::Shared(engine) => {
                let mut next = previous.clone();
                next.extend(changes);
                let result = engine.enqueue(next, Some(previous.clone()));
                Dispatch::from_results(vec![result])
            }
            Engines::Keyed(engines) => {
                let mut results = Vec::with_capacity(changes.len());
                for (key, value) in changes {
                    let Some(engine) = engines.get_mut(&key) else {
                        tracing::trace!(?key, "ignoring change to unobserved field");
                        continue;
                    };
                    let result = engine.enqueue(value, previous.get(&key).cloned());
                    results.push(result.map(|v| Patch::from([(key, v)])));
                }
                Dispatch::from_results(results)
            }
        }
    }

    /// Applies `op` to `target`, or to every engine when `target` is `None`.
    ///
    /// Each engine is attempted exactly once, in key order. A target that is
    /// not observed attempts nothing. A shared registry ignores the target
    /// and operates on the whole composite state.
    pub fn dispatch(&mut self, op: Operation, target: Option<&K>) -> Dispatch<K, V> {
        match &mut self.engines {
            Engines::Shared(engine) => {
                let fields: Vec<K> = match (op, engine.state()) {
                    (Operation::Clear, Some(present)) => present.keys().cloned().collect(),
                    _ => Vec::new(),
                };
                let result = apply(engine, op);
                let cleared = if matches!(result, ActionResult::Committed(None)) {
                    fields
                } else {
                    Vec::new()
                };
                let result = result.map(Option::unwrap_or_default);
                Dispatch::from_results(vec![result]).with_cleared(cleared)
            }
            Engines::Keyed(engines) => {
                let mut cleared = Vec::new();
                let results = match target {
                    Some(key) => {
                        let Some(engine) = engines.get_mut(key) else {
                            tracing::warn!(?key, ?op, "operation targets an unobserved field");
                            return Dispatch::empty();
                        };
                        vec![keyed_result(key, apply(engine, op), &mut cleared)]
                    }
                    None => engines
                        .iter_mut()
                        .map(|(key, engine)| keyed_result(key, apply(engine, op), &mut cleared))
                        .collect(),
                };
                Dispatch::from_results(results).with_cleared(cleared)
            }
        }
    }

    /// Like [`dispatch`](Self::dispatch), then calls `on_complete` once with
    /// the outcome, whether or not anything was committed.
    pub fn dispatch_then<F>(&mut self, op: Operation, target: Option<&K>, on_complete: F) -> Dispatch<K, V>
    where
        F: FnOnce(&Dispatch<K, V>),
    {
        let dispatch = self.dispatch(op, target);
        on_complete(&dispatch);
        dispatch
    }

    pub fn undo(&mut self, target: Option<&K>) -> Dispatch<K, V> {
        self.dispatch(Operation::Undo, target)
    }

    pub fn redo(&mut self, target: Option<&K>) -> Dispatch<K, V> {
        self.dispatch(Operation::Redo, target)
    }

    pub fn jump(&mut self, n: isize, target: Option<&K>) -> Dispatch<K, V> {
        self.dispatch(Operation::Jump(n), target)
    }

    pub fn jump_to_past(&mut self, index: usize, target: Option<&K>) -> Dispatch<K, V> {
        self.dispatch(Operation::JumpToPast(index), target)
    }

    pub fn jump_to_future(&mut self, index: usize, target: Option<&K>) -> Dispatch<K, V> {
        self.dispatch(Operation::JumpToFuture(index), target)
    }

    pub fn clear(&mut self, target: Option<&K>) -> Dispatch<K, V> {
        self.dispatch(Operation::Clear, target)
    }
}

/// Runs `op` on one engine. The committed value is the new present, which
/// after a clear may be absent.
fn apply<S: Clone + Debug>(engine: &mut HistoryEngine<S>, op: Operation) -> ActionResult<Option<S>> {
    match op {
        Operation::Undo => engine.undo().map(Some),
        Operation::Redo => engine.redo().map(Some),
        Operation::Jump(n) => engine.jump(n).map(Some),
        Operation::JumpToPast(index) => engine.jump_to_past(index).map(Some),
        Operation::JumpToFuture(index) => engine.jump_to_future(index).map(Some),
        Operation::Clear => engine.clear().map(|()| engine.state().cloned()),
    }
}

/// Wraps one engine's outcome as a single-field patch. A committed outcome
/// with no value marks `key` as cleared.
fn keyed_result<K: Eq + Hash + Clone, V>(
    key: &K,
    result: ActionResult<Option<V>>,
    cleared: &mut Vec<K>,
) -> ActionResult<Patch<K, V>> {
    if matches!(result, ActionResult::Committed(None)) {
        cleared.push(key.clone());
    }
    result.map(|value| value.map(|v| (key.clone(), v)).into_iter().collect())
}
