/// Action kinds and the outcome of an attempted action.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Every kind of action a timeline can be asked to perform.
///
/// Filters are keyed on these, and the debug tracer labels each attempt
/// with one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Enqueue,
    Undo,
    Redo,
    Jump,
    JumpToPast,
    JumpToFuture,
    ClearHistory,
}

impl ActionKind {
    /// All kinds, in declaration order.
    pub const ALL: [ActionKind; 7] = [
        ActionKind::Enqueue,
        ActionKind::Undo,
        ActionKind::Redo,
        ActionKind::Jump,
        ActionKind::JumpToPast,
        ActionKind::JumpToFuture,
        ActionKind::ClearHistory,
    ];

    /// The upper-case name used in settings files and trace headers.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Enqueue => "ENQUEUE",
            ActionKind::Undo => "UNDO",
            ActionKind::Redo => "REDO",
            ActionKind::Jump => "JUMP",
            ActionKind::JumpToPast => "JUMP_TO_PAST",
            ActionKind::JumpToFuture => "JUMP_TO_FUTURE",
            ActionKind::ClearHistory => "CLEAR_HISTORY",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An attempted action together with its numeric parameter, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionDescriptor {
    pub kind: ActionKind,
    /// Step count for `Jump`, index for `JumpToPast`/`JumpToFuture`.
    pub param: Option<i64>,
}

impl ActionDescriptor {
    pub fn new(kind: ActionKind) -> Self {
        Self { kind, param: None }
    }

    pub fn with_param(kind: ActionKind, param: i64) -> Self {
        Self {
            kind,
            param: Some(param),
        }
    }
}

impl fmt::Display for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.param {
            Some(param) => write!(f, "{}({param})", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Outcome of an attempted action.
///
/// `NotApplicable` means the action was declined and the timeline is
/// exactly as it was. A committed value may itself be "empty" (`None`,
/// `0`, `false`) when the snapshot type allows it, so callers must check
/// the variant rather than the value.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult<T> {
    Committed(T),
    NotApplicable,
}

impl<T> ActionResult<T> {
    /// Returns `true` unless the action was declined.
    pub fn is_valid(&self) -> bool {
        matches!(self, ActionResult::Committed(_))
    }

    /// Returns the committed value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            ActionResult::Committed(value) => Some(value),
            ActionResult::NotApplicable => None,
        }
    }

    /// Converts into an `Option`, dropping the distinction between the
    /// sentinel and nothing at all.
    pub fn into_option(self) -> Option<T> {
        match self {
            ActionResult::Committed(value) => Some(value),
            ActionResult::NotApplicable => None,
        }
    }

    /// Maps the committed value, leaving a decline untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ActionResult<U> {
        match self {
            ActionResult::Committed(value) => ActionResult::Committed(f(value)),
            ActionResult::NotApplicable => ActionResult::NotApplicable,
        }
    }
}

impl<T> From<ActionResult<T>> for Option<T> {
    fn from(result: ActionResult<T>) -> Self {
        result.into_option()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&ActionKind::JumpToPast).unwrap();
        assert_eq!(json, "\"JUMP_TO_PAST\"");
        let parsed: ActionKind = serde_json::from_str("\"CLEAR_HISTORY\"").unwrap();
        assert_eq!(parsed, ActionKind::ClearHistory);
    }

    #[test]
    fn test_kind_display_matches_serde() {
        for kind in ActionKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn test_descriptor_display() {
        assert_eq!(ActionDescriptor::new(ActionKind::Undo).to_string(), "UNDO");
        assert_eq!(
            ActionDescriptor::with_param(ActionKind::Jump, -2).to_string(),
            "JUMP(-2)"
        );
    }

    #[test]
    fn test_falsy_committed_value_is_valid() {
        let committed: ActionResult<Option<i32>> = ActionResult::Committed(None);
        assert!(committed.is_valid());
        assert_eq!(committed.value(), Some(&None));

        let zero = ActionResult::Committed(0);
        assert!(zero.is_valid());
    }

    #[test]
    fn test_not_applicable_is_invalid() {
        let declined: ActionResult<i32> = ActionResult::NotApplicable;
        assert!(!declined.is_valid());
        assert_eq!(declined.value(), None);
        assert_eq!(Option::<i32>::from(declined), None);
    }

    #[test]
    fn test_map_preserves_decline() {
        let declined: ActionResult<i32> = ActionResult::NotApplicable;
        assert_eq!(declined.map(|v| v * 2), ActionResult::NotApplicable);
        assert_eq!(ActionResult::Committed(3).map(|v| v * 2), ActionResult::Committed(6));
    }
}
