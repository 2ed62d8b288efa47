//! Mock LLM for tests.
//!
//! Plays back a script of responses, one per `invoke()`, and records the history it was given
//! so tests can check what the session sent. When the script runs out, the last response is
//! repeated.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse, MessageChunk};
use crate::message::{Message, ToolCall};

pub struct MockLlm {
    script: Mutex<VecDeque<LlmResponse>>,
    last: Mutex<LlmResponse>,
    seen: Mutex<Vec<Vec<Message>>>,
    stream_by_char: AtomicBool,
}

impl MockLlm {
    /// Mock that always answers with `content` and no tool calls.
    pub fn with_no_tool_calls(content: impl Into<String>) -> Self {
        Self::scripted(vec![LlmResponse {
            content: content.into(),
            ..Default::default()
        }])
    }

    /// Mock whose first reply requests `tool_calls` and whose second reply is `final_content`.
    pub fn tools_then_reply(tool_calls: Vec<ToolCall>, final_content: impl Into<String>) -> Self {
        Self::scripted(vec![
            LlmResponse {
                tool_calls,
                ..Default::default()
            },
            LlmResponse {
                content: final_content.into(),
                ..Default::default()
            },
        ])
    }

    /// Mock that plays `responses` in order.
    pub fn scripted(responses: Vec<LlmResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            last: Mutex::new(LlmResponse::default()),
            seen: Mutex::new(Vec::new()),
            stream_by_char: AtomicBool::new(false),
        }
    }

    /// Send each character as its own chunk from `invoke_stream()`.
    pub fn with_stream_by_char(self) -> Self {
        self.stream_by_char.store(true, Ordering::SeqCst);
        self
    }

    /// Histories passed to each call, oldest first.
    pub fn seen_messages(&self) -> Vec<Vec<Message>> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.seen.lock().map(|s| s.len()).unwrap_or(0)
    }

    fn next_response(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        self.seen.lock().map_err(poisoned)?.push(messages.to_vec());

        let next = self.script.lock().map_err(poisoned)?.pop_front();
        let mut last = self.last.lock().map_err(poisoned)?;
        if let Some(resp) = next {
            *last = resp;
        }
        Ok(last.clone())
    }
}

fn poisoned<T>(_: T) -> AgentError {
    AgentError::ExecutionFailed("mock llm lock poisoned".to_string())
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        self.next_response(messages)
    }

    async fn invoke_stream(
        &self,
        messages: &[Message],
        chunk_tx: Option<mpsc::Sender<MessageChunk>>,
    ) -> Result<LlmResponse, AgentError> {
        let response = self.next_response(messages)?;
        let Some(tx) = chunk_tx else {
            return Ok(response);
        };

        if self.stream_by_char.load(Ordering::SeqCst) {
            for c in response.content.chars() {
                let _ = tx
                    .send(MessageChunk {
                        content: c.to_string(),
                    })
                    .await;
            }
        } else if !response.content.is_empty() {
            let _ = tx
                .send(MessageChunk {
                    content: response.content.clone(),
                })
                .await;
        }
        Ok(response)
    }
}
