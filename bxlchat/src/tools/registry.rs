use std::collections::BTreeMap;

use crate::tool_source::{ToolCallContent, ToolSourceError, ToolSpec};
use crate::tools::r#trait::Tool;

/// Explicit registry of the tools offered to the model: name → tool (spec + handler).
///
/// The registry is built once at startup and passed to both the LLM client (as the list of
/// specs) and the chat session (to execute calls). Listing is ordered by name.
///
/// # Examples
///
/// ```
/// use bxlchat::tools::ToolRegistry;
///
/// let registry = ToolRegistry::new();
/// assert!(registry.list().is_empty());
/// ```
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool. A tool with the same name is replaced.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, tool: Box<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    /// Specs of all registered tools, ordered by name.
    pub fn list(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|tool| tool.spec()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Calls a tool by name.
    ///
    /// Returns `ToolSourceError::NotFound` if the name is not registered.
    pub async fn call(
        &self,
        name: &str,
        args: serde_json::Value,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolSourceError::NotFound(name.to_string()))?;
        tool.call(args).await
    }

    /// Calls a tool with arguments as the raw JSON string the model produced.
    ///
    /// Empty arguments are treated as `{}`.
    pub async fn call_raw(
        &self,
        name: &str,
        arguments: &str,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let args = if arguments.trim().is_empty() {
            serde_json::Value::Object(Default::default())
        } else {
            serde_json::from_str(arguments).map_err(|e| {
                ToolSourceError::InvalidInput(format!("arguments are not valid JSON: {}", e))
            })?
        };
        self.call(name, args).await
    }
}
