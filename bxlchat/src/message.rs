//! Chat history message types.
//!
//! Roles: System (first in the history), User, Assistant, plus the two entries written while
//! the model is calling tools: the assistant turn that requested them and one result per call.

use serde::{Deserialize, Serialize};

/// A single tool invocation requested by the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool name as registered in the [`ToolRegistry`](crate::tools::ToolRegistry).
    pub name: String,
    /// Arguments as a raw JSON string, parsed when the tool is called.
    pub arguments: String,
    /// Call id used to pair the result message with this call.
    pub id: Option<String>,
}

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// System prompt; placed first in the history.
    System(String),
    /// User input.
    User(String),
    /// Final assistant reply for a turn.
    Assistant(String),
    /// Assistant turn that requested tool calls (content may be empty).
    AssistantToolCalls {
        content: String,
        tool_calls: Vec<ToolCall>,
    },
    /// Result of one tool call.
    Tool { call_id: String, content: String },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant(content.into())
    }

    pub fn tool(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Tool {
            call_id: call_id.into(),
            content: content.into(),
        }
    }

    /// Short role name, used in logs.
    pub fn role(&self) -> &'static str {
        match self {
            Self::System(_) => "system",
            Self::User(_) => "user",
            Self::Assistant(_) | Self::AssistantToolCalls { .. } => "assistant",
            Self::Tool { .. } => "tool",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_produce_expected_variants() {
        assert!(matches!(Message::system("s"), Message::System(c) if c == "s"));
        assert!(matches!(Message::user("u"), Message::User(c) if c == "u"));
        assert!(matches!(Message::assistant("a"), Message::Assistant(c) if c == "a"));
        assert_eq!(
            Message::tool("call-1", "done"),
            Message::Tool {
                call_id: "call-1".into(),
                content: "done".into()
            }
        );
    }

    #[test]
    fn role_names() {
        assert_eq!(Message::system("").role(), "system");
        assert_eq!(Message::user("").role(), "user");
        assert_eq!(
            Message::AssistantToolCalls {
                content: String::new(),
                tool_calls: vec![]
            }
            .role(),
            "assistant"
        );
        assert_eq!(Message::tool("id", "").role(), "tool");
    }
}
