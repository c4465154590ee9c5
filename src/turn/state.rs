//! Conversation state carried through one turn

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tag strings the routing function treats as "go to the tool"
pub const TOOL_ALIASES: &[&str] = &["tool", "tools", "tool_node"];

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One conversation entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Routing decision written by the planner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextNode {
    Tool,
    Responder,
}

impl NextNode {
    pub fn as_str(self) -> &'static str {
        match self {
            NextNode::Tool => "tool",
            NextNode::Responder => "responder",
        }
    }

    /// Parse a raw routing tag. Case-insensitive; any tool alias maps to `Tool`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_lowercase();
        if TOOL_ALIASES.contains(&tag.as_str()) {
            Some(NextNode::Tool)
        } else if tag == "responder" {
            Some(NextNode::Responder)
        } else {
            None
        }
    }
}

/// Token accounting for every LLM call made during a turn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TurnUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub llm_calls: u32,
}

impl TurnUsage {
    pub fn record(&mut self, usage: crate::llm::Usage) {
        self.prompt_tokens += usage.input_tokens;
        self.completion_tokens += usage.output_tokens;
        self.llm_calls += 1;
    }

    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// A tool invocation made during the turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallRecord {
    pub name: String,
    pub arguments: Value,
}

/// The unit of work for one turn
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub session_id: String,
    /// Chronological, append-only within a turn
    pub messages: Vec<Message>,
    /// Cached raw text of the current user turn
    pub user_input: Option<String>,
    /// Final reply; empty until the tool or responder stage runs
    pub response: String,
    /// Written by the planner, read only by the routing function
    pub next_node: Option<NextNode>,
    pub usage: TurnUsage,
    pub tool_calls: Vec<ToolCallRecord>,
}

impl ConversationState {
    /// Seed a turn from prior history plus the new user text
    pub fn for_turn(session_id: impl Into<String>, history: Vec<Message>, user_text: &str) -> Self {
        let mut state = Self {
            session_id: session_id.into(),
            messages: history,
            user_input: Some(user_text.to_string()),
            ..Self::default()
        };
        state.push_message(Message::user(user_text));
        state
    }

    /// Seed the routing decision from a raw tag, skipping the planner.
    /// Unrecognized tags leave the decision unset.
    #[must_use]
    pub fn with_routing_tag(mut self, tag: &str) -> Self {
        self.next_node = NextNode::from_tag(tag);
        self
    }

    /// Append a message, dropping it if its content is blank
    pub fn push_message(&mut self, message: Message) -> bool {
        if message.content.trim().is_empty() {
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Append the assistant reply and record it as the turn's response
    pub fn reply(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.push_message(Message::assistant(text.clone()));
        self.response = text;
    }

    /// Latest non-empty user message content, if any
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User && !m.content.is_empty())
            .map(|m| m.content.as_str())
    }

    /// The utterance the planner, tool, and responder act on.
    ///
    /// Falls back to the last message of any role when no user message exists.
    pub fn utterance(&self) -> &str {
        self.last_user_text()
            .or_else(|| self.messages.last().map(|m| m.content.as_str()))
            .unwrap_or("")
    }

    /// The text the routing function inspects: cached input first, then the last user message
    pub fn routing_text(&self) -> &str {
        self.user_input
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.last_user_text())
            .unwrap_or("")
    }

    /// Latest non-empty assistant content, trimmed
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .filter(|m| m.role == Role::Assistant)
            .map(|m| m.content.trim())
            .find(|c| !c.is_empty())
    }
}
