//! Message types for LLM communication.
//!
//! Defines the chat message and the append-only conversation log that is
//! rendered into every prompt.

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message (human input).
    User,
    /// Assistant message (model reply).
    Assistant,
}

impl Role {
    /// Returns the role as a string for API requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Label used in the chat log and in prompt history.
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "Human",
            Self::Assistant => "AI",
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender.
    pub role: Role,
    /// The content of the message.
    pub content: String,
}

impl Message {
    /// Creates a new message with the given role and content.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// The ordered message log of a session.
///
/// Append-only and unbounded: messages are never edited, removed or
/// windowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Creates a new empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Appends a user message.
    pub fn add_user(&mut self, content: impl Into<String>) {
        self.push(Message::user(content));
    }

    /// Appends an assistant message.
    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.push(Message::assistant(content));
    }

    /// Returns all messages in chronological order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the most recent message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Renders the full history as `AI: ...` / `Human: ...` lines.
    pub fn render_for_prompt(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role.label(), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_message_constructors() {
        let user = Message::user("How many albums?");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.content, "How many albums?");

        let ai = Message::assistant("347");
        assert_eq!(ai.role, Role::Assistant);
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn test_conversation_preserves_order() {
        let mut conv = Conversation::new();
        conv.add_assistant("Hello!");
        conv.add_user("first");
        conv.add_assistant("one");
        conv.add_user("second");

        let contents: Vec<&str> = conv.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["Hello!", "first", "one", "second"]);
        assert_eq!(conv.last().map(|m| m.role), Some(Role::User));
    }

    #[test]
    fn test_conversation_is_unbounded() {
        let mut conv = Conversation::new();
        for i in 0..500 {
            conv.add_user(format!("q{i}"));
            conv.add_assistant(format!("a{i}"));
        }
        assert_eq!(conv.len(), 1000);
        assert_eq!(conv.messages()[0].content, "q0");
    }

    #[test]
    fn test_render_for_prompt() {
        let mut conv = Conversation::new();
        conv.add_assistant("Hello!");
        conv.add_user("How many artists?");

        assert_eq!(conv.render_for_prompt(), "AI: Hello!\nHuman: How many artists?");
    }

    #[test]
    fn test_empty_conversation_renders_empty() {
        let conv = Conversation::new();
        assert!(conv.is_empty());
        assert_eq!(conv.render_for_prompt(), "");
    }
}
