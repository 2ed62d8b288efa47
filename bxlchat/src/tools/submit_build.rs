//! `submit_build_request` tool: posts a build-request document to CloudBuild.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use crate::cloudbuild::{BuildSubmitter, SubmitError};
use crate::tool_source::{ToolCallContent, ToolSourceError, ToolSpec};
use crate::tools::Tool;

pub const TOOL_SUBMIT_BUILD_REQUEST: &str = "submit_build_request";

pub struct SubmitBuildRequestTool {
    submitter: Arc<BuildSubmitter>,
}

impl SubmitBuildRequestTool {
    pub fn new(submitter: Arc<BuildSubmitter>) -> Self {
        Self { submitter }
    }
}

impl From<SubmitError> for ToolSourceError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::MissingBuildRequest | SubmitError::InvalidBaseUrl { .. } => {
                ToolSourceError::InvalidInput(e.to_string())
            }
            SubmitError::Transport(_) => ToolSourceError::Transport(e.to_string()),
            SubmitError::MalformedResponse(_) => ToolSourceError::Execution(e.to_string()),
        }
    }
}

#[async_trait]
impl Tool for SubmitBuildRequestTool {
    fn name(&self) -> &str {
        TOOL_SUBMIT_BUILD_REQUEST
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_SUBMIT_BUILD_REQUEST.to_string(),
            description: Some(
                "Submit a JSON formatted CloudBuild (or CB) build request to the CloudBuild service"
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "build_request": { "type": "string", "description": "A CloudBuild (or CB) build request in JSON format" }
                },
                "required": ["build_request"]
            }),
        }
    }

    async fn call(&self, args: serde_json::Value) -> Result<ToolCallContent, ToolSourceError> {
        // The model sometimes passes the document as an object rather than a string.
        let build_request = match args.get("build_request") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(v) if v.is_object() => v.to_string(),
            _ => String::new(),
        };
        info!(build_request = %build_request, "submitting build request");

        let outcome = self.submitter.submit(&build_request).await.inspect_err(|e| {
            warn!(error = %e, "build submission failed");
        })?;
        Ok(ToolCallContent::text(outcome.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloudbuild::StaticTokenProvider;

    fn tool() -> SubmitBuildRequestTool {
        let submitter = BuildSubmitter::with_base_url(
            "http://127.0.0.1:9",
            "scope",
            Arc::new(StaticTokenProvider::new("t")),
        )
        .unwrap();
        SubmitBuildRequestTool::new(Arc::new(submitter))
    }

    #[tokio::test]
    async fn missing_request_is_invalid_input() {
        let err = tool().call(json!({})).await.unwrap_err();
        assert!(
            matches!(&err, ToolSourceError::InvalidInput(m) if m == "Build request is required"),
            "{}",
            err
        );
    }

    #[test]
    fn spec_names_build_request_parameter() {
        let spec = tool().spec();
        assert_eq!(spec.name, TOOL_SUBMIT_BUILD_REQUEST);
        assert_eq!(spec.input_schema["required"], json!(["build_request"]));
    }
}
