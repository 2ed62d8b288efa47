//! Chat session: conversation history plus the automatic tool-call loop.
//!
//! Each [`ChatSession::send`] appends the user message, asks the model for a completion and,
//! while the model answers with tool calls, runs them through the [`ToolRegistry`] and asks
//! again. The final text is appended as the assistant reply.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::llm::{LlmClient, MessageChunk};
use crate::message::{Message, ToolCall};
use crate::prompts::system_prompt;
use crate::tools::ToolRegistry;

/// Completion rounds allowed per user turn before giving up.
pub const MAX_TOOL_ROUNDS: usize = 128;

pub struct ChatSession {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    history: Vec<Message>,
    max_tool_rounds: usize,
}

impl ChatSession {
    /// Session whose history starts with the BuildXL system prompt.
    pub fn new(llm: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>) -> Self {
        Self::with_system_prompt(llm, tools, system_prompt())
    }

    pub fn with_system_prompt(
        llm: Arc<dyn LlmClient>,
        tools: Arc<ToolRegistry>,
        system: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            tools,
            history: vec![Message::system(system)],
            max_tool_rounds: MAX_TOOL_ROUNDS,
        }
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Runs one user turn and returns the final assistant text.
    ///
    /// Text fragments go to `chunk_tx` as they arrive. On error the user message stays in the
    /// history without a reply.
    pub async fn send(
        &mut self,
        user_text: &str,
        chunk_tx: Option<mpsc::Sender<MessageChunk>>,
    ) -> Result<String, AgentError> {
        self.history.push(Message::user(user_text));

        for round in 0..self.max_tool_rounds {
            debug!(
                round,
                message_count = self.history.len(),
                "requesting completion"
            );
            let response = self
                .llm
                .invoke_stream(&self.history, chunk_tx.clone())
                .await?;

            if response.tool_calls.is_empty() {
                self.history.push(Message::assistant(response.content.clone()));
                return Ok(response.content);
            }

            let tool_calls: Vec<ToolCall> = response
                .tool_calls
                .into_iter()
                .map(|mut tc| {
                    if tc.id.as_deref().map_or(true, str::is_empty) {
                        tc.id = Some(format!("call_{}", uuid::Uuid::new_v4().simple()));
                    }
                    tc
                })
                .collect();
            self.history.push(Message::AssistantToolCalls {
                content: response.content,
                tool_calls: tool_calls.clone(),
            });

            for tc in &tool_calls {
                let result = self.run_tool(tc).await;
                let call_id = tc.id.clone().unwrap_or_default();
                self.history.push(Message::tool(call_id, result));
            }
        }

        Err(AgentError::ToolRoundsExceeded(self.max_tool_rounds))
    }

    async fn run_tool(&self, tc: &ToolCall) -> String {
        debug!(tool = %tc.name, arguments = %tc.arguments, "calling tool");
        match self.tools.call_raw(&tc.name, &tc.arguments).await {
            Ok(content) => content.text,
            Err(e) => {
                warn!(tool = %tc.name, error = %e, "tool call failed");
                format!("Error: {}", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmResponse, MockLlm};

    fn call(name: &str, arguments: &str, id: Option<&str>) -> ToolCall {
        ToolCall {
            name: name.into(),
            arguments: arguments.into(),
            id: id.map(String::from),
        }
    }

    #[tokio::test]
    async fn plain_reply_is_appended_to_history() {
        let llm = Arc::new(MockLlm::with_no_tool_calls("hello"));
        let mut session = ChatSession::new(llm, Arc::new(ToolRegistry::new()));
        let reply = session.send("hi", None).await.unwrap();
        assert_eq!(reply, "hello");
        let history = session.history();
        assert_eq!(history.len(), 3);
        assert!(matches!(&history[0], Message::System(s) if s.contains("BuildXL")));
        assert_eq!(history[1], Message::user("hi"));
        assert_eq!(history[2], Message::assistant("hello"));
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_to_model() {
        let llm = Arc::new(MockLlm::tools_then_reply(
            vec![call("nope", "{}", Some("c1"))],
            "sorry",
        ));
        let mut session =
            ChatSession::with_system_prompt(llm.clone(), Arc::new(ToolRegistry::new()), "sys");
        let reply = session.send("do it", None).await.unwrap();
        assert_eq!(reply, "sorry");
        assert_eq!(
            session.history()[3],
            Message::tool("c1", "Error: tool not found: nope")
        );
        assert_eq!(llm.call_count(), 2);
        assert_eq!(llm.seen_messages()[1].len(), 4);
    }

    #[tokio::test]
    async fn missing_call_ids_are_generated() {
        let llm = Arc::new(MockLlm::tools_then_reply(vec![call("nope", "", None)], "ok"));
        let mut session =
            ChatSession::with_system_prompt(llm, Arc::new(ToolRegistry::new()), "sys");
        session.send("x", None).await.unwrap();
        let Message::AssistantToolCalls { tool_calls, .. } = &session.history()[2] else {
            panic!("expected tool-call message");
        };
        let id = tool_calls[0].id.clone().unwrap();
        assert!(id.starts_with("call_"));
        assert!(matches!(&session.history()[3], Message::Tool { call_id, .. } if *call_id == id));
    }

    #[tokio::test]
    async fn endless_tool_calls_stop_at_limit() {
        let llm = Arc::new(MockLlm::scripted(vec![LlmResponse {
            tool_calls: vec![call("nope", "{}", Some("c"))],
            ..Default::default()
        }]));
        let mut session =
            ChatSession::with_system_prompt(llm.clone(), Arc::new(ToolRegistry::new()), "sys")
                .with_max_tool_rounds(3);
        let err = session.send("loop", None).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolRoundsExceeded(3)));
        assert_eq!(llm.call_count(), 3);
    }

    #[tokio::test]
    async fn reply_is_streamed_to_channel() {
        let llm = Arc::new(MockLlm::with_no_tool_calls("abc").with_stream_by_char());
        let mut session =
            ChatSession::with_system_prompt(llm, Arc::new(ToolRegistry::new()), "sys");
        let (tx, mut rx) = mpsc::channel(16);
        session.send("hi", Some(tx)).await.unwrap();
        let mut streamed = String::new();
        while let Ok(chunk) = rx.try_recv() {
            streamed.push_str(&chunk.content);
        }
        assert_eq!(streamed, "abc");
    }
}
