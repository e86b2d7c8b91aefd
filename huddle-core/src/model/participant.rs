use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque per-session participant identifier, unique within a room.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
