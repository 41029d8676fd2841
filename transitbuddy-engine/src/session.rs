use serde::{Deserialize, Serialize};
use transitbuddy_core::render::View;
use transitbuddy_core::types::{Sender, now_unix_ms};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversationState {
    Idle,
    Sending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Position in the transcript, starting at zero.
    pub seq: u64,
    pub sender: Sender,
    pub view: View,
    pub ts_unix_ms: i64,
}

impl Message {
    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// Append-only message log. Insertion order is display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sender: Sender, view: View) -> u64 {
        let seq = self.messages.len() as u64;
        self.messages.push(Message {
            seq,
            sender,
            view,
            ts_unix_ms: now_unix_ms(),
        });
        seq
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Messages appended at or after `seq`.
    pub fn since(&self, seq: u64) -> &[Message] {
        let start = usize::try_from(seq)
            .unwrap_or(usize::MAX)
            .min(self.messages.len());
        &self.messages[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_assigns_increasing_sequence_numbers() {
        let mut t = Transcript::new();
        assert_eq!(t.push(Sender::User, View::text("hi")), 0);
        assert_eq!(t.push(Sender::Bot, View::text("hello")), 1);
        assert_eq!(t.len(), 2);
        assert!(t.messages()[0].is_user());
        assert!(!t.last().unwrap().is_user());
    }

    #[test]
    fn since_clamps_to_end() {
        let mut t = Transcript::new();
        t.push(Sender::User, View::text("a"));
        t.push(Sender::Bot, View::text("b"));
        assert_eq!(t.since(1).len(), 1);
        assert!(t.since(2).is_empty());
        assert!(t.since(99).is_empty());
    }
}
