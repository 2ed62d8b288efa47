use async_trait::async_trait;

use crate::tool_source::{ToolCallContent, ToolSourceError, ToolSpec};

/// A single tool the model can call.
///
/// Each tool has a unique name, a specification (description and JSON schema) and the call
/// logic. Tools are registered with [`ToolRegistry`](crate::tools::ToolRegistry), whose specs
/// go to the LLM client and whose `call` the chat session uses for each requested tool call.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use serde_json::Value;
/// use bxlchat::tools::Tool;
/// use bxlchat::tool_source::{ToolCallContent, ToolSourceError, ToolSpec};
///
/// struct Echo;
///
/// #[async_trait]
/// impl Tool for Echo {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     fn spec(&self) -> ToolSpec {
///         ToolSpec {
///             name: "echo".to_string(),
///             description: Some("Echo the arguments".to_string()),
///             input_schema: serde_json::json!({"type": "object"}),
///         }
///     }
///
///     async fn call(&self, args: Value) -> Result<ToolCallContent, ToolSourceError> {
///         Ok(ToolCallContent::text(args.to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name within a registry.
    fn name(&self) -> &str;

    /// Name, description for the model, and JSON schema for arguments.
    fn spec(&self) -> ToolSpec;

    /// Executes the tool with JSON arguments (already parsed from the model's tool call).
    async fn call(&self, args: serde_json::Value) -> Result<ToolCallContent, ToolSourceError>;
}
