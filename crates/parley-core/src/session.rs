//! Append-only conversation session.
//!
//! The session is the ordered dialogue history for one user: the sequence of
//! role-tagged messages IS the context sent to the model on every completion
//! request. Messages are immutable once appended; the only wholesale mutation
//! is full replacement when a session is (re)started. The session is an
//! explicit handle passed by reference into every orchestrator call, so there
//! is no ambient per-user state and no locking: a session is only ever
//! touched by its single active generation.

use crate::core_types::Message;

#[derive(Debug, Default)]
pub struct ConversationSession {
    messages: Vec<Message>,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole history, e.g. when resuming a stored session.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{ContentItem, Role};
    use serde_json::json;

    #[test]
    fn test_session_starts_empty() {
        let session = ConversationSession::new();
        assert!(session.is_empty());
        assert_eq!(session.len(), 0);
        assert!(session.last().is_none());
    }

    #[test]
    fn test_session_round_trip() {
        // user, assistant-with-tool-call, tool-result, assistant-final:
        // exactly four appended messages, ending on an assistant turn.
        let mut session = ConversationSession::new();
        let before = session.len();

        session.push_user("What's the weather in Paris?");
        session.push(Message::assistant_tool_call(
            "call_1".to_string(),
            "get_weather".to_string(),
            json!({"city": "Paris"}),
        ));
        session.push(Message::tool_result(
            "call_1".to_string(),
            "get_weather".to_string(),
            vec![ContentItem::text("Paris: sunny +20°C")],
        ));
        session.push_assistant("It's sunny and 20°C in Paris.");

        assert_eq!(session.len(), before + 4);
        assert_eq!(session.last().unwrap().role, Role::Assistant);
    }

    #[test]
    fn test_session_replacement_and_clear() {
        let mut session = ConversationSession::from_messages(vec![
            Message::user("hi"),
            Message::assistant("hello"),
        ]);
        assert_eq!(session.len(), 2);

        session.clear();
        assert!(session.is_empty());
    }

    #[test]
    fn test_session_preserves_order() {
        let mut session = ConversationSession::new();
        session.push_user("one");
        session.push_assistant("two");
        session.push_user("three");

        let roles: Vec<&Role> = session.messages().iter().map(|m| &m.role).collect();
        assert_eq!(roles, vec![&Role::User, &Role::Assistant, &Role::User]);
    }
}
