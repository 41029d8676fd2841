use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Opaque per-session token sent with every backend request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// `session-<unix ms>-<9 random chars>`, unique for the lifetime of the process.
    pub fn generate() -> Self {
        let suffix: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
        Self(format!("session-{}-{}", now_unix_ms(), suffix))
    }

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Created once per client run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    id: SessionId,
    created_at_unix_ms: i64,
}

impl ChatSession {
    pub fn start() -> Self {
        Self {
            id: SessionId::generate(),
            created_at_unix_ms: now_unix_ms(),
        }
    }

    pub fn with_id(id: SessionId) -> Self {
        Self {
            id,
            created_at_unix_ms: now_unix_ms(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn created_at_unix_ms(&self) -> i64 {
        self.created_at_unix_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Bot,
}

pub fn now_unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_session_ids_have_prefix_and_differ() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert!(a.as_str().starts_with("session-"));
        assert_eq!(a.as_str().rsplit('-').next().map(str::len), Some(9));
        assert_ne!(a, b);
    }

    #[test]
    fn chat_session_keeps_given_id() {
        let s = ChatSession::with_id(SessionId::new("session-fixed"));
        assert_eq!(s.id().as_str(), "session-fixed");
        assert!(s.created_at_unix_ms() > 0);
    }
}
