//! Identifiers for calls and the countdown sessions within them

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for one countdown session (one connect/disconnect cycle)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the call a countdown belongs to, as assigned by the
/// signaling layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(String);

impl CallId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CallId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CallId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_id_equality() {
        let id1 = CallId::new("call-1");
        let id2 = CallId::from("call-1");
        let id3 = CallId::new("call-2");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn session_id_uniqueness() {
        let s1 = SessionId::new();
        let s2 = SessionId::new();
        assert_ne!(s1, s2);
    }

    #[test]
    fn session_id_is_bare_uuid_in_events() {
        let uuid = Uuid::new_v4();
        let session_id = SessionId::from_uuid(uuid);

        assert_eq!(session_id.as_uuid(), &uuid);
        assert_eq!(session_id.to_string(), uuid.to_string());
        assert_eq!(
            serde_json::to_string(&session_id).unwrap(),
            format!("\"{}\"", uuid)
        );
    }

    #[test]
    fn call_id_displays_signaling_value() {
        let call_id: CallId = String::from("room-7f3a").into();
        assert_eq!(call_id.as_str(), "room-7f3a");
        assert_eq!(format!("call {}", call_id), "call room-7f3a");
    }

    #[test]
    fn ids_serialize_deserialize() {
        let call_id = CallId::new("match-42");
        let json = serde_json::to_string(&call_id).unwrap();
        assert_eq!(json, "\"match-42\"");
        let parsed: CallId = serde_json::from_str(&json).unwrap();
        assert_eq!(call_id, parsed);

        let session_id = SessionId::new();
        let json = serde_json::to_string(&session_id).unwrap();
        let parsed: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(session_id, parsed);
    }
}
