use serde::{Deserialize, Serialize};
use std::fmt;

/// A user identifier.
///
/// Wraps i32 to match the backend's numeric user ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i32);

impl UserId {
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    pub fn as_i32(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for UserId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl From<UserId> for i32 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

/// A daily session identifier assigned by the backend.
///
/// Wraps String as the backend uses opaque ids like "s-20240502-7".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Task identity. A task is born with a client-assigned `Local` id and
/// swaps to the backend's opaque `Remote` id once its first create has
/// round-tripped. Serialized untagged, so snapshots hold a plain number
/// or string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    Local(u64),
    Remote(String),
}

impl TaskId {
    pub fn remote(id: impl Into<String>) -> Self {
        Self::Remote(id.into())
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    /// The backend-side id, if this task has one yet.
    pub fn as_remote(&self) -> Option<&str> {
        match self {
            Self::Local(_) => None,
            Self::Remote(id) => Some(id.as_str()),
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(n) => write!(f, "local-{}", n),
            Self::Remote(id) => write!(f, "{}", id),
        }
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::Remote(id.to_string())
    }
}
