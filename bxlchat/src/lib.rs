//! # bxlchat
//!
//! A console assistant for BuildXL: a streaming chat with an OpenAI or Azure OpenAI model that
//! can draft and submit CloudBuild build requests through two tools.
//!
//! ## Main modules
//!
//! - [`chat`]: [`ChatSession`]: history seeded with the BuildXL system prompt and the
//!   automatic tool-call loop.
//! - [`llm`]: [`LlmClient`] trait, [`ChatOpenAI`] (async-openai), [`MockLlm`].
//! - [`tools`]: [`Tool`] trait, [`ToolRegistry`], [`CreateBuildRequestTool`],
//!   [`SubmitBuildRequestTool`].
//! - [`cloudbuild`]: build-request builder, [`BuildSubmitter`], [`TokenProvider`] and its
//!   interactive and static implementations.
//! - [`message`]: [`Message`], [`ToolCall`].
//!
//! ## Wiring
//!
//! ```no_run
//! use std::sync::Arc;
//! use bxlchat::{
//!     BuildSubmitter, ChatOpenAI, ChatSession, CreateBuildRequestTool, StaticTokenProvider,
//!     SubmitBuildRequestTool, ToolRegistry,
//! };
//! use env_config::{CloudBuildSettings, Settings};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::from_env()?;
//! let cloudbuild = CloudBuildSettings::from_env();
//! let submitter = BuildSubmitter::new(&cloudbuild, Arc::new(StaticTokenProvider::new("token")))?;
//! let registry = Arc::new(
//!     ToolRegistry::new()
//!         .with(Box::new(CreateBuildRequestTool::new(cloudbuild.requester.clone())))
//!         .with(Box::new(SubmitBuildRequestTool::new(Arc::new(submitter)))),
//! );
//! let llm = ChatOpenAI::from_settings(&settings).with_tools(registry.list());
//! let mut session = ChatSession::new(Arc::new(llm), registry);
//! let reply = session.send("Create a build request for queue BuildXL_PR", None).await?;
//! println!("{}", reply);
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod cloudbuild;
pub mod error;
pub mod llm;
pub mod message;
pub mod prompts;
pub mod tool_source;
pub mod tools;

pub use chat::{ChatSession, MAX_TOOL_ROUNDS};
pub use cloudbuild::{
    create_build_request, AccessToken, AuthError, BuildRequest, BuildRequestArgs,
    BuildRequestError, BuildSubmitter, InteractiveBrowserTokenProvider, StaticTokenProvider,
    SubmitError, SubmitOutcome, TokenProvider,
};
pub use error::AgentError;
pub use llm::{ChatOpenAI, LlmClient, LlmResponse, MessageChunk, MockLlm};
pub use message::{Message, ToolCall};
pub use tool_source::{ToolCallContent, ToolSourceError, ToolSpec};
pub use tools::{
    CreateBuildRequestTool, SubmitBuildRequestTool, Tool, ToolRegistry,
    TOOL_CREATE_BUILD_REQUEST, TOOL_SUBMIT_BUILD_REQUEST,
};
