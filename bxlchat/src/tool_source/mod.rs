//! Tool-facing value types shared by the registry, the tools and the LLM client.

use serde_json::Value;
use thiserror::Error;

/// Tool specification sent to the model: name, description and JSON Schema for arguments.
///
/// **Interaction**: Returned by `Tool::spec()` / `ToolRegistry::list()`; passed to
/// `ChatOpenAI::with_tools`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolSpec {
    pub name: String,
    /// Human-readable description for the model.
    pub description: Option<String>,
    /// JSON Schema for arguments.
    pub input_schema: Value,
}

/// Result of a single tool call; the text is folded back into the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallContent {
    pub text: String,
}

impl ToolCallContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Errors from calling a tool.
///
/// **Interaction**: Returned by `Tool::call()` and `ToolRegistry::call()`; the chat session
/// reports them to the model as the tool result instead of ending the turn.
#[derive(Debug, Error)]
pub enum ToolSourceError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("invalid arguments: {0}")]
    InvalidInput(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("tool failed: {0}")]
    Execution(String),
}
