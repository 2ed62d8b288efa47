//! OpenAI / Azure OpenAI Chat Completions client implementing `LlmClient` (ChatOpenAI).
//!
//! The provider is picked from [`Settings`]: `use_openai` selects api.openai.com with the API
//! key and optional organization; otherwise Azure OpenAI is used with `endpoint` as the resource
//! base and `model` as the deployment id. Tools set via `with_tools` are sent with every request
//! and the model may answer with `tool_calls`.
//!
//! # Streaming
//!
//! `invoke_stream()` uses `create_stream`, reads `choices[0].delta.content` for incremental text
//! and accumulates `choices[0].delta.tool_calls` by index into complete calls.

use std::collections::BTreeMap;

use async_trait::async_trait;
use env_config::Settings;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{debug, trace};

use async_openai::{
    config::{AzureConfig, Config, OpenAIConfig},
    types::chat::{
        ChatCompletionMessageToolCall, ChatCompletionMessageToolCalls,
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestToolMessage,
        ChatCompletionRequestUserMessage, ChatCompletionTool, ChatCompletionTools,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, FunctionCall, FunctionObject,
    },
    Client,
};

use super::{LlmClient, LlmResponse, MessageChunk};
use crate::error::AgentError;
use crate::message::{Message, ToolCall};
use crate::tool_source::ToolSpec;

/// Azure OpenAI REST API version used for chat completions.
pub const AZURE_API_VERSION: &str = "2024-06-01";

/// Configured client for one of the two providers.
enum Provider {
    OpenAI(Client<OpenAIConfig>),
    Azure(Client<AzureConfig>),
}

pub struct ChatOpenAI {
    client: Provider,
    model: String,
    /// Chat completions URL, for logs only.
    url: String,
    tools: Option<Vec<ToolSpec>>,
}

impl ChatOpenAI {
    /// Build a client for the provider described by `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        if settings.use_openai {
            let mut config = OpenAIConfig::new().with_api_key(settings.api_key.clone());
            if !settings.org_id.is_empty() {
                config = config.with_org_id(settings.org_id.clone());
            }
            Self::with_config(config, settings.model.clone())
        } else {
            let base = settings.endpoint.trim_end_matches('/');
            let config = AzureConfig::new()
                .with_api_base(base)
                .with_api_key(settings.api_key.clone())
                .with_deployment_id(settings.model.clone())
                .with_api_version(AZURE_API_VERSION);
            let url = format!(
                "{}/openai/deployments/{}/chat/completions",
                base, settings.model
            );
            Self::new(
                Provider::Azure(Client::with_config(config)),
                settings.model.clone(),
                url,
            )
        }
    }

    /// Build an OpenAI(-compatible) client from an explicit config (custom base or key).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        let url = format!("{}/chat/completions", config.api_base().trim_end_matches('/'));
        Self::new(Provider::OpenAI(Client::with_config(config)), model.into(), url)
    }

    fn new(client: Provider, model: String, url: String) -> Self {
        Self {
            client,
            model,
            url,
            tools: None,
        }
    }

    /// Set tools for every completion (enables tool_calls in the response).
    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn tool_calls_to_request(tool_calls: &[ToolCall]) -> Vec<ChatCompletionMessageToolCalls> {
        tool_calls
            .iter()
            .map(|tc| {
                ChatCompletionMessageToolCalls::Function(ChatCompletionMessageToolCall {
                    id: tc.id.clone().unwrap_or_default(),
                    function: FunctionCall {
                        name: tc.name.clone(),
                        arguments: tc.arguments.clone(),
                    },
                })
            })
            .collect()
    }

    /// Convert the history to OpenAI request messages.
    fn messages_to_request(
        messages: &[Message],
    ) -> Result<Vec<ChatCompletionRequestMessage>, AgentError> {
        messages
            .iter()
            .map(|m| {
                Ok(match m {
                    Message::System(s) => ChatCompletionRequestMessage::System(
                        ChatCompletionRequestSystemMessage::from(s.as_str()),
                    ),
                    Message::User(s) => ChatCompletionRequestMessage::User(
                        ChatCompletionRequestUserMessage::from(s.as_str()),
                    ),
                    Message::Assistant(s) => {
                        ChatCompletionRequestMessage::Assistant(s.as_str().into())
                    }
                    Message::AssistantToolCalls {
                        content,
                        tool_calls,
                    } => {
                        let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                        args.tool_calls(Self::tool_calls_to_request(tool_calls));
                        if !content.is_empty() {
                            args.content(content.as_str());
                        }
                        let msg = args.build().map_err(|e| {
                            AgentError::ExecutionFailed(format!(
                                "OpenAI assistant message build failed: {}",
                                e
                            ))
                        })?;
                        ChatCompletionRequestMessage::Assistant(msg)
                    }
                    Message::Tool { call_id, content } => {
                        ChatCompletionRequestMessage::Tool(ChatCompletionRequestToolMessage {
                            content: content.as_str().into(),
                            tool_call_id: call_id.clone(),
                        })
                    }
                })
            })
            .collect()
    }

    fn build_request(
        &self,
        messages: &[Message],
        stream: bool,
    ) -> Result<CreateChatCompletionRequest, AgentError> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(Self::messages_to_request(messages)?);
        if stream {
            args.stream(true);
        }

        if let Some(ref tools) = self.tools {
            let chat_tools: Vec<ChatCompletionTools> = tools
                .iter()
                .map(|t| {
                    ChatCompletionTools::Function(ChatCompletionTool {
                        function: FunctionObject {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: Some(t.input_schema.clone()),
                            ..Default::default()
                        },
                    })
                })
                .collect();
            if !chat_tools.is_empty() {
                args.tools(chat_tools);
            }
        }

        args.build().map_err(|e| {
            AgentError::ExecutionFailed(format!("OpenAI request build failed: {}", e))
        })
    }

    fn log_request(&self, trace_id: &str, request: &CreateChatCompletionRequest, stream: bool) {
        debug!(
            trace_id = %trace_id,
            url = %self.url,
            model = %self.model,
            message_count = request.messages.len(),
            stream = stream,
            tools_count = self.tools.as_ref().map(|t| t.len()).unwrap_or(0),
            "OpenAI chat create"
        );
        if let Ok(js) = serde_json::to_string_pretty(request) {
            trace!(trace_id = %trace_id, url = %self.url, request = %js, "OpenAI request body");
        }
    }
}

#[async_trait]
impl LlmClient for ChatOpenAI {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        let trace_id = uuid::Uuid::new_v4().to_string();
        let request = self.build_request(messages, false)?;
        self.log_request(&trace_id, &request, false);

        let response = match &self.client {
            Provider::OpenAI(c) => c.chat().create(request).await,
            Provider::Azure(c) => c.chat().create(request).await,
        }
        .map_err(|e| AgentError::ExecutionFailed(format!("OpenAI API error: {}", e)))?;

        if let Ok(js) = serde_json::to_string_pretty(&response) {
            trace!(trace_id = %trace_id, url = %self.url, response = %js, "OpenAI response body");
        }

        let choice =
            response.choices.into_iter().next().ok_or_else(|| {
                AgentError::ExecutionFailed("OpenAI returned no choices".to_string())
            })?;

        let msg = choice.message;
        let tool_calls = msg
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .filter_map(|tc| match tc {
                ChatCompletionMessageToolCalls::Function(f) => Some(ToolCall {
                    name: f.function.name,
                    arguments: f.function.arguments,
                    id: Some(f.id),
                }),
                _ => None,
            })
            .collect();

        Ok(LlmResponse {
            content: msg.content.unwrap_or_default(),
            tool_calls,
        })
    }

    /// Sends text fragments through `chunk_tx` as they arrive; tool calls are accumulated from
    /// the stream and returned in the final response.
    async fn invoke_stream(
        &self,
        messages: &[Message],
        chunk_tx: Option<mpsc::Sender<MessageChunk>>,
    ) -> Result<LlmResponse, AgentError> {
        let Some(chunk_tx) = chunk_tx else {
            return self.invoke(messages).await;
        };

        let trace_id = uuid::Uuid::new_v4().to_string();
        let request = self.build_request(messages, true)?;
        self.log_request(&trace_id, &request, true);

        let mut stream = match &self.client {
            Provider::OpenAI(c) => c.chat().create_stream(request).await,
            Provider::Azure(c) => c.chat().create_stream(request).await,
        }
        .map_err(|e| AgentError::ExecutionFailed(format!("OpenAI stream error: {}", e)))?;

        let mut full_content = String::new();
        // index -> (id, name, arguments)
        let mut tool_call_map: BTreeMap<u32, (String, String, String)> = BTreeMap::new();

        while let Some(result) = stream.next().await {
            let response = result
                .map_err(|e| AgentError::ExecutionFailed(format!("OpenAI stream error: {}", e)))?;

            for choice in response.choices {
                let delta = choice.delta;

                if let Some(content) = delta.content {
                    if !content.is_empty() {
                        full_content.push_str(&content);
                        // Receiver may be gone (e.g. console closed); keep collecting.
                        let _ = chunk_tx.send(MessageChunk { content }).await;
                    }
                }

                for tc in delta.tool_calls.unwrap_or_default() {
                    let entry = tool_call_map
                        .entry(tc.index)
                        .or_insert_with(|| (String::new(), String::new(), String::new()));
                    if let Some(id) = tc.id.filter(|id| !id.is_empty()) {
                        entry.0 = id;
                    }
                    if let Some(func) = tc.function {
                        if let Some(name) = func.name {
                            entry.1.push_str(&name);
                        }
                        if let Some(args) = func.arguments {
                            entry.2.push_str(&args);
                        }
                    }
                }
            }
        }

        let tool_calls: Vec<ToolCall> = tool_call_map
            .into_values()
            .map(|(id, name, arguments)| ToolCall {
                name,
                arguments,
                id: (!id.is_empty()).then_some(id),
            })
            .collect();

        trace!(
            trace_id = %trace_id,
            url = %self.url,
            content = %full_content,
            tool_calls = ?tool_calls,
            "OpenAI stream response"
        );

        Ok(LlmResponse {
            content: full_content,
            tool_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

    fn unreachable_client() -> ChatOpenAI {
        let config = OpenAIConfig::new()
            .with_api_key("test-key")
            .with_api_base("https://127.0.0.1:1");
        ChatOpenAI::with_config(config, "gpt-4o-mini")
    }

    #[test]
    fn from_settings_selects_provider() {
        let openai = ChatOpenAI::from_settings(&Settings::parse("true;gpt-4;;sk-1;org1").unwrap());
        assert_eq!(openai.model(), "gpt-4");
        assert_eq!(openai.url(), OPENAI_CHAT_URL);

        let azure = ChatOpenAI::from_settings(
            &Settings::parse("false;gpt-35-turbo-a;https://1es.openai.azure.com/;k;").unwrap(),
        );
        assert_eq!(azure.model(), "gpt-35-turbo-a");
        assert_eq!(
            azure.url(),
            "https://1es.openai.azure.com/openai/deployments/gpt-35-turbo-a/chat/completions"
        );
    }

    #[test]
    fn request_carries_tools_and_tool_history() {
        let client = unreachable_client().with_tools(vec![ToolSpec {
            name: "create_build_request".into(),
            description: Some("d".into()),
            input_schema: serde_json::json!({"type": "object"}),
        }]);
        let history = vec![
            Message::system("sys"),
            Message::user("build it"),
            Message::AssistantToolCalls {
                content: String::new(),
                tool_calls: vec![ToolCall {
                    name: "create_build_request".into(),
                    arguments: r#"{"build_queue":"q"}"#.into(),
                    id: Some("call-1".into()),
                }],
            },
            Message::tool("call-1", "{}"),
        ];

        let request = client.build_request(&history, true).unwrap();
        assert_eq!(request.messages.len(), 4);
        assert_eq!(request.tools.as_ref().map(|t| t.len()), Some(1));
        assert!(request.tool_choice.is_none());
        assert!(request.temperature.is_none());

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["messages"][2]["tool_calls"][0]["id"], "call-1");
        assert_eq!(body["messages"][3]["role"], "tool");
        assert_eq!(body["messages"][3]["tool_call_id"], "call-1");
    }

    #[tokio::test]
    async fn invoke_with_unreachable_base_returns_error() {
        let result = unreachable_client().invoke(&[Message::user("Hello")]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn invoke_stream_with_unreachable_base_returns_error() {
        let (tx, _rx) = mpsc::channel(16);
        let result = unreachable_client()
            .invoke_stream(&[Message::user("Hello")], Some(tx))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    #[ignore = "Requires OPENAI_SETTINGS; run with: cargo test -p bxlchat invoke_stream_with_real_api -- --ignored"]
    async fn invoke_stream_with_real_api_returns_ok() {
        let settings = Settings::from_env().expect("OPENAI_SETTINGS must be set for this test");
        let client = ChatOpenAI::from_settings(&settings);
        let (tx, mut rx) = mpsc::channel(64);

        let response = client
            .invoke_stream(&[Message::user("Say exactly: ok")], Some(tx))
            .await
            .expect("invoke_stream with real API should succeed");

        assert!(!response.content.is_empty());
        assert!(rx.try_recv().is_ok(), "should receive at least one chunk");
    }
}
