//! `create_build_request` tool: drafts a CloudBuild build-request document.

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::cloudbuild::{create_build_request, BuildRequestArgs};
use crate::tool_source::{ToolCallContent, ToolSourceError, ToolSpec};
use crate::tools::Tool;

pub const TOOL_CREATE_BUILD_REQUEST: &str = "create_build_request";

pub struct CreateBuildRequestTool {
    requester: String,
}

impl CreateBuildRequestTool {
    /// `requester` is recorded in every request (resolved once at startup).
    pub fn new(requester: impl Into<String>) -> Self {
        Self {
            requester: requester.into(),
        }
    }
}

fn optional_str(args: &serde_json::Value, key: &str) -> Option<String> {
    args.get(key).and_then(|v| v.as_str()).map(String::from)
}

pub(crate) fn parse_args(args: &serde_json::Value) -> BuildRequestArgs {
    BuildRequestArgs {
        build_queue: optional_str(args, "build_queue").unwrap_or_default(),
        description: optional_str(args, "description"),
        engine_or_drop: optional_str(args, "engine_or_drop"),
        additional_command_line_options: optional_str(args, "additional_command_line_options"),
    }
}

#[async_trait]
impl Tool for CreateBuildRequestTool {
    fn name(&self) -> &str {
        TOOL_CREATE_BUILD_REQUEST
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_CREATE_BUILD_REQUEST.to_string(),
            description: Some(
                "Create a JSON formatted CloudBuild (or CB) build request for a specific build queue, \
                 and optionally with a description, a specific engine or drop, and additional \
                 command-line options or arguments."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "build_queue": { "type": "string", "description": "The build queue in CloudBuild" },
                    "description": { "type": "string", "description": "An optional description for the build request" },
                    "engine_or_drop": { "type": "string", "description": "An optional BuildXL engine or BuildXL drop" },
                    "additional_command_line_options": { "type": "string", "description": "Optional additional command-line options or arguments" }
                },
                "required": ["build_queue"]
            }),
        }
    }

    async fn call(&self, args: serde_json::Value) -> Result<ToolCallContent, ToolSourceError> {
        let args = parse_args(&args);
        info!(build_queue = %args.build_queue, "create a build request");
        let json = create_build_request(&self.requester, &args)
            .map_err(|e| ToolSourceError::InvalidInput(e.to_string()))?;
        Ok(ToolCallContent::text(json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_args_reads_snake_case_keys() {
        let args = parse_args(&json!({
            "build_queue": "q",
            "engine_or_drop": "d",
            "additional_command_line_options": "/x",
        }));
        assert_eq!(args.build_queue, "q");
        assert_eq!(args.description, None);
        assert_eq!(args.engine_or_drop.as_deref(), Some("d"));
        assert_eq!(args.additional_command_line_options.as_deref(), Some("/x"));
    }

    #[test]
    fn spec_requires_build_queue() {
        let spec = CreateBuildRequestTool::new("alice").spec();
        assert_eq!(spec.name, TOOL_CREATE_BUILD_REQUEST);
        assert_eq!(spec.input_schema["required"], json!(["build_queue"]));
    }

    #[tokio::test]
    async fn call_returns_request_json() {
        let tool = CreateBuildRequestTool::new("alice");
        let out = tool
            .call(json!({"build_queue": "BuildXL_PR", "engine_or_drop": "myDrop"}))
            .await
            .unwrap();
        let v: serde_json::Value = serde_json::from_str(&out.text).unwrap();
        assert_eq!(v["buildQueue"], "BuildXL_PR");
        assert_eq!(v["requester"], "alice");
        assert!(v["toolPaths"]["dominoEngine"]
            .as_str()
            .unwrap()
            .ends_with("/myDrop?root=release/win-x64"));
    }

    #[tokio::test]
    async fn missing_queue_is_invalid_input() {
        let tool = CreateBuildRequestTool::new("alice");
        let err = tool.call(json!({})).await.unwrap_err();
        assert!(
            matches!(&err, ToolSourceError::InvalidInput(m) if m == "Build queue is required"),
            "{}",
            err
        );
    }
}
