//! LLM client abstraction for the chat session.
//!
//! [`ChatSession`](crate::chat::ChatSession) depends on a client that returns assistant text
//! and optional tool calls; this module defines the trait, the OpenAI / Azure OpenAI client and
//! a scripted mock.
//!
//! # Streaming
//!
//! `invoke_stream()` accepts an optional `Sender<MessageChunk>` for emitting text fragments as
//! they arrive. The complete `LlmResponse` is still returned at the end.

mod mock;
mod openai;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::AgentError;
use crate::message::{Message, ToolCall};

pub use mock::MockLlm;
pub use openai::ChatOpenAI;

/// One streamed text fragment of an assistant reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageChunk {
    pub content: String,
}

/// Response from one completion: assistant text and the tool calls it requested.
#[derive(Clone, Debug, Default)]
pub struct LlmResponse {
    pub content: String,
    /// Empty means the turn is finished.
    pub tool_calls: Vec<ToolCall>,
}

/// LLM client: given the history, returns assistant text and optional tool calls.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Invoke one completion without streaming.
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError>;

    /// Streaming variant. When `chunk_tx` is `Some`, text fragments are sent as they arrive.
    ///
    /// Default implementation calls `invoke()` and sends the full content as one chunk.
    async fn invoke_stream(
        &self,
        messages: &[Message],
        chunk_tx: Option<mpsc::Sender<MessageChunk>>,
    ) -> Result<LlmResponse, AgentError> {
        let response = self.invoke(messages).await?;

        if let Some(tx) = chunk_tx {
            if !response.content.is_empty() {
                let _ = tx
                    .send(MessageChunk {
                        content: response.content.clone(),
                    })
                    .await;
            }
        }

        Ok(response)
    }
}
