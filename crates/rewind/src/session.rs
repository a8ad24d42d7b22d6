//! The host side of the history registry.
//!
//! A session owns the composite state (field name to JSON value) and a
//! registry observing it. Changes go into the state and are recorded in the
//! registry; navigation returns patches that are merged back into the state.
use anyhow::{Context, Result};
use rewind_config::HistorySettings;
use rewind_history::{HistoryRegistry, Observer, Operation, Patch, Snapshot, Timeline};
use serde::Serialize;
use serde_json::{json, Value};

use crate::script::Command;

/// What one command did, printed as a JSON line.
#[derive(Debug, Serialize)]
pub struct Report {
    pub command: &'static str,
    /// Whether any timeline changed.
    pub committed: bool,
    /// Values merged into the state by this command.
    pub patch: Patch<String, Value>,
    pub state: Snapshot<String, Value>,
    /// Timelines, only for `show`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Value>,
}

/// Composite state plus the registry recording it.
#[derive(Debug)]
pub struct Session {
    registry: HistoryRegistry<String, Value>,
    state: Snapshot<String, Value>,
}

impl Session {
    /// Builds the registry described by `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid.
    pub fn new(settings: &HistorySettings) -> Result<Self> {
        settings.validate()?;
        let observer = match &settings.fields {
            Some(fields) => Observer::Fields(fields.clone(), settings.history_config()),
            None => Observer::All(settings.history_config()),
        };
        let registry = HistoryRegistry::new(observer).context("Failed to build history registry")?;
        tracing::debug!(
            observes_all = registry.observes_all(),
            limit = ?settings.limit(),
            "session ready"
        );
        Ok(Self {
            registry,
            state: Snapshot::new(),
        })
    }

    pub fn state(&self) -> &Snapshot<String, Value> {
        &self.state
    }

    /// Runs one command against the registry and folds the outcome into
    /// the state.
    pub fn execute(&mut self, command: Command) -> Report {
        let name = command.name();
        match command {
            Command::Set { field, value } => self.set(name, field, value),
            Command::Init {
                field,
                value,
                default_only,
            } => self.init(name, field, value, default_only),
            Command::Undo { field } => self.navigate(name, Operation::Undo, field),
            Command::Redo { field } => self.navigate(name, Operation::Redo, field),
            Command::Jump { steps, field } => self.navigate(name, Operation::Jump(steps), field),
            Command::Past { index, field } => self.navigate(name, Operation::JumpToPast(index), field),
            Command::Future { index, field } => {
                self.navigate(name, Operation::JumpToFuture(index), field)
            }
            Command::Clear { field } => self.navigate(name, Operation::Clear, field),
            Command::Show => Report {
                command: name,
                committed: false,
                patch: Patch::new(),
                state: self.state.clone(),
                history: Some(self.history_json()),
            },
        }
    }

    /// The state always takes the new value; the registry decides whether
    /// the change is recorded.
    fn set(&mut self, name: &'static str, field: String, value: Value) -> Report {
        let previous = self.state.clone();
        self.state.insert(field.clone(), value.clone());

        let dispatch = self.registry.enqueue(Patch::from([(field, value)]), &previous);
        self.report(name, dispatch.any_committed(), dispatch.patch)
    }

    fn init(&mut self, name: &'static str, field: String, value: Value, default_only: bool) -> Report {
        let mut seed = if self.registry.observes_all() {
            self.state.clone()
        } else {
            Snapshot::new()
        };
        seed.insert(field.clone(), value.clone());

        self.registry.init_state(&seed, default_only);
        let mut patch = Patch::new();
        if !default_only {
            self.state.insert(field.clone(), value.clone());
            patch.insert(field, value);
        }
        self.report(name, false, patch)
    }

    fn navigate(&mut self, name: &'static str, op: Operation, field: Option<String>) -> Report {
        let dispatch = self.registry.dispatch_then(op, field.as_ref(), |dispatch| {
            tracing::debug!(?op, attempted = dispatch.results.len(), "dispatched");
        });
        self.state
            .extend(dispatch.patch.iter().map(|(k, v)| (k.clone(), v.clone())));
        for field in &dispatch.cleared {
            self.state.shift_remove(field);
        }
        self.report(name, dispatch.any_committed(), dispatch.patch)
    }

    fn report(&self, command: &'static str, committed: bool, patch: Patch<String, Value>) -> Report {
        Report {
            command,
            committed,
            patch,
            state: self.state.clone(),
            history: None,
        }
    }

    fn history_json(&self) -> Value {
        if let Some(shared) = self.registry.shared() {
            return json!({ "*": timeline_json(shared.history()) });
        }
        let timelines: serde_json::Map<String, Value> = self
            .registry
            .keys()
            .filter_map(|key| Some((key.clone(), timeline_json(self.registry.history(key)?))))
            .collect();
        Value::Object(timelines)
    }
}

fn timeline_json<S: Serialize>(timeline: &Timeline<S>) -> Value {
    json!({
        "past": timeline.past,
        "present": timeline.present,
        "future": timeline.future,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parse_line;

    fn run(session: &mut Session, lines: &[&str]) -> Vec<Report> {
        lines
            .iter()
            .filter_map(|line| parse_line(line).unwrap())
            .map(|command| session.execute(command))
            .collect()
    }

    fn fields_session(fields: &[&str]) -> Session {
        let settings = HistorySettings {
            fields: Some(fields.iter().map(|f| f.to_string()).collect()),
            ..HistorySettings::default()
        };
        Session::new(&settings).unwrap()
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = HistorySettings {
            limit: Some(-1),
            ..HistorySettings::default()
        };
        assert!(Session::new(&settings).is_err());
    }

    #[test]
    fn test_shared_session_undo_merges_snapshot() {
        let mut session = Session::new(&HistorySettings::default()).unwrap();
        let reports = run(
            &mut session,
            &["init counter 0", "set counter 1", "set total 5", "undo", "undo"],
        );

        assert!(reports[1].committed);
        // patches merge into the state, so fields absent from the restored
        // snapshot keep their value
        assert_eq!(reports[3].patch, Patch::from([("counter".to_string(), json!(1))]));
        assert_eq!(reports[3].state.get("total"), Some(&json!(5)));
        assert_eq!(session.state().get("counter"), Some(&json!(0)));
    }

    #[test]
    fn test_fields_session_targeted_undo() {
        let mut session = fields_session(&["counter", "total"]);
        let reports = run(
            &mut session,
            &[
                "init counter 0",
                "init total 10",
                "set counter 1",
                "set total 11",
                "undo counter",
            ],
        );

        let undo = reports.last().unwrap();
        assert!(undo.committed);
        assert_eq!(undo.patch, Patch::from([("counter".to_string(), json!(0))]));
        assert_eq!(session.state().get("total"), Some(&json!(11)));
    }

    #[test]
    fn test_unobserved_field_changes_state_only() {
        let mut session = fields_session(&["counter"]);
        let reports = run(&mut session, &["set label 'draft'", "undo"]);

        assert!(!reports[0].committed);
        assert_eq!(session.state().get("label"), Some(&json!("draft")));
        assert!(!reports[1].committed);
    }

    #[test]
    fn test_clear_resets_to_baselines() {
        let mut session = fields_session(&["counter", "total"]);
        run(
            &mut session,
            &["init counter 0", "init total 10", "set counter 4", "set total 40", "clear"],
        );
        assert_eq!(session.state().get("counter"), Some(&json!(0)));
        assert_eq!(session.state().get("total"), Some(&json!(10)));

        let reports = run(&mut session, &["redo"]);
        assert!(!reports[0].committed);
    }

    #[test]
    fn test_clear_without_init_drops_field() {
        let mut session = fields_session(&["counter", "total"]);
        let reports = run(
            &mut session,
            &["init total 10", "set counter 5", "set counter 6", "clear"],
        );

        let clear = reports.last().unwrap();
        assert!(clear.committed);
        assert_eq!(clear.state.get("counter"), None);
        assert_eq!(clear.state.get("total"), Some(&json!(10)));
        assert_eq!(session.state(), &session.registry.snapshot());
    }

    #[test]
    fn test_show_lists_timelines() {
        let mut session = fields_session(&["counter"]);
        let reports = run(&mut session, &["init counter 0", "set counter 1", "undo", "show"]);

        let history = reports[3].history.as_ref().unwrap();
        assert_eq!(history["counter"]["present"], json!(0));
        assert_eq!(history["counter"]["future"], json!([1]));
        assert_eq!(history["counter"]["past"], json!([]));
    }

    #[test]
    fn test_limit_from_settings() {
        let settings = HistorySettings {
            limit: Some(2),
            ..HistorySettings::default()
        };
        let mut session = Session::new(&settings).unwrap();
        let reports = run(
            &mut session,
            &["set n 1", "set n 2", "set n 3", "set n 4", "show"],
        );
        let history = reports[4].history.as_ref().unwrap();
        assert_eq!(history["*"]["past"].as_array().map(Vec::len), Some(2));
    }
}
