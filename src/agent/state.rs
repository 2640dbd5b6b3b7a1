//! Conversation state owned by one turn executor.

use crate::types::{Message, Role};

/// Ordered message history plus per-task counters for one agent.
///
/// The first message is always the system prompt, for the lifetime of the
/// conversation. History is append-only; only session compaction rewrites it.
#[derive(Debug, Clone)]
pub struct ConversationState {
    messages: Vec<Message>,
    /// Provider round-trips in the current task.
    pub iteration: usize,
    /// Tool invocations attempted since the current task began. Reset only at
    /// the start of a new task.
    pub tool_calls_this_turn: usize,
    /// Whether the model finished the current task without requesting tools.
    pub is_complete: bool,
    /// Final assistant text of the last completed task.
    pub last_response: Option<String>,
}

impl ConversationState {
    /// Create a conversation seeded with the system prompt.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
            iteration: 0,
            tool_calls_this_turn: 0,
            is_complete: false,
            last_response: None,
        }
    }

    /// All messages, starting with the system prompt.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Append a message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Add an out-of-band context message (defaults to the system role).
    pub fn add_context(&mut self, content: impl Into<String>, role: Role) {
        let content = content.into();
        let message = match role {
            Role::System => Message::system(content),
            Role::User => Message::user(content),
            Role::Assistant => Message::assistant(content, None),
            Role::Tool => Message {
                role: Role::Tool,
                content,
                name: None,
                tool_calls: None,
                tool_call_id: None,
            },
        };
        self.messages.push(message);
    }

    /// Mark the start of a new task: append the user message and zero the
    /// per-task counters.
    pub fn begin_task(&mut self, user_text: impl Into<String>) {
        self.messages.push(Message::user(user_text));
        self.iteration = 0;
        self.tool_calls_this_turn = 0;
        self.is_complete = false;
    }

    /// Drop all history and counters, reseeding the system prompt.
    pub fn reset(&mut self, system_prompt: impl Into<String>) {
        *self = Self::new(system_prompt);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
