//! Durable per-conversation session records
//!
//! A [`Session`] carries the prompt counter and an open mapping of
//! layer-scoped state. The [`SessionStore`] owns the on-disk representation:
//! one JSON file per session id inside the sessions directory.

mod store;

pub use store::SessionStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-conversation record persisted across process invocations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Number of prompts processed so far; never decreases
    #[serde(default)]
    pub prompt_count: u64,

    /// Layer-scoped state keyed by layer name, opaque to the engine
    #[serde(default)]
    pub state: Map<String, Value>,

    /// When the engine last completed a run for this session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Fields written by other tooling, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the state slot owned by `layer`, if any.
    pub fn layer_state(&self, layer: &str) -> Option<&Value> {
        self.state.get(layer)
    }
}

/// Outcome of resolving a session id
///
/// Loading never fails: unreadable records degrade to a fresh session, but
/// the degradation is reported so callers and tests can observe it.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionLoad {
    /// No session id was given; nothing is read or written
    Transient(Session),
    /// No record exists yet for this id
    Fresh(Session),
    /// The record was read from disk
    Loaded(Session),
    /// The record exists but could not be used; a fresh session stands in
    Degraded { session: Session, reason: String },
}

impl SessionLoad {
    pub fn session(&self) -> &Session {
        match self {
            Self::Transient(session) | Self::Fresh(session) | Self::Loaded(session) => session,
            Self::Degraded { session, .. } => session,
        }
    }

    pub fn into_session(self) -> Session {
        match self {
            Self::Transient(session) | Self::Fresh(session) | Self::Loaded(session) => session,
            Self::Degraded { session, .. } => session,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Reason for degradation, if the load degraded.
    pub fn degraded_reason(&self) -> Option<&str> {
        match self {
            Self::Degraded { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_defaults_from_empty_record() {
        let session: Session = serde_json::from_str("{}").unwrap();
        assert_eq!(session, Session::default());
        assert_eq!(session.prompt_count, 0);
        assert!(session.state.is_empty());
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let raw = json!({
            "prompt_count": 4,
            "state": { "history": { "recent": ["a"] } },
            "active_agent": "dev"
        });
        let session: Session = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(session.extra["active_agent"], "dev");
        assert_eq!(serde_json::to_value(&session).unwrap(), raw);
    }

    #[test]
    fn degraded_load_still_yields_session() {
        let load = SessionLoad::Degraded {
            session: Session::default(),
            reason: "bad json".into(),
        };
        assert!(load.is_degraded());
        assert_eq!(load.degraded_reason(), Some("bad json"));
        assert_eq!(load.into_session().prompt_count, 0);
    }
}
