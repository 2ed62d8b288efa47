//! Build-request document builder.
//!
//! Pure: the caller supplies the requester and the clock value, so the output is fully
//! determined by the inputs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Drop service prefix for engine values given as a bare drop name.
pub const DROP_BASE_URL: &str =
    "https://cloudbuild.artifacts.visualstudio.com/DefaultCollection/_apis/drop/drops/";
/// Appended to engine URLs that do not select a root.
pub const DEFAULT_DROP_ROOT: &str = "?root=release/win-x64";
/// Format of the timestamp in a generated description.
pub const DESCRIPTION_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildRequestError {
    #[error("Build queue is required")]
    MissingBuildQueue,
}

/// Serialized shape of a CloudBuild build request. Absent optional fields are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    pub build_queue: String,
    pub requester: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_paths: Option<ToolPaths>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_engine_options: Option<BuildEngineOptions>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolPaths {
    pub domino_engine: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildEngineOptions {
    pub additional_command_line_flags: String,
}

/// Inputs of the builder as the model supplies them; everything but the queue is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildRequestArgs {
    pub build_queue: String,
    pub description: Option<String>,
    pub engine_or_drop: Option<String>,
    pub additional_command_line_options: Option<String>,
}

impl BuildRequestArgs {
    pub fn new(build_queue: impl Into<String>) -> Self {
        Self {
            build_queue: build_queue.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_engine_or_drop(mut self, engine_or_drop: impl Into<String>) -> Self {
        self.engine_or_drop = Some(engine_or_drop.into());
        self
    }

    pub fn with_additional_command_line_options(mut self, options: impl Into<String>) -> Self {
        self.additional_command_line_options = Some(options.into());
        self
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

/// Expands a bare drop name to a drop URL and makes sure a root is selected.
///
/// ```
/// use bxlchat::cloudbuild::normalize_engine_or_drop;
///
/// assert_eq!(
///     normalize_engine_or_drop("https://example.com/drop?root=custom"),
///     "https://example.com/drop?root=custom"
/// );
/// ```
pub fn normalize_engine_or_drop(value: &str) -> String {
    let is_url = value
        .get(..8)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("https://"));
    let url = if is_url {
        value.to_string()
    } else {
        format!("{}{}", DROP_BASE_URL, value)
    };
    if contains_ignore_ascii_case(&url, "?root=") {
        url
    } else {
        format!("{}{}", url, DEFAULT_DROP_ROOT)
    }
}

/// Default description when the model supplies none.
pub fn default_description(requester: &str, now: DateTime<Utc>) -> String {
    format!(
        "BuildXL build requested by {} - {}",
        requester,
        now.format(DESCRIPTION_TIMESTAMP_FORMAT)
    )
}

impl BuildRequest {
    pub fn from_args(
        requester: &str,
        args: &BuildRequestArgs,
        now: DateTime<Utc>,
    ) -> Result<Self, BuildRequestError> {
        if args.build_queue.trim().is_empty() {
            return Err(BuildRequestError::MissingBuildQueue);
        }

        let description = present(&args.description)
            .map(str::to_string)
            .unwrap_or_else(|| default_description(requester, now));

        Ok(Self {
            build_queue: args.build_queue.clone(),
            requester: requester.to_string(),
            description: Some(description),
            tool_paths: present(&args.engine_or_drop).map(|engine| ToolPaths {
                domino_engine: normalize_engine_or_drop(engine),
            }),
            build_engine_options: present(&args.additional_command_line_options).map(|flags| {
                BuildEngineOptions {
                    additional_command_line_flags: flags.to_string(),
                }
            }),
        })
    }

    /// Indented JSON, the form handed back to the model.
    pub fn to_json_pretty(&self) -> String {
        // Only strings and nested structs: serialization cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Builds the request JSON with an explicit clock value.
pub fn create_build_request_at(
    requester: &str,
    args: &BuildRequestArgs,
    now: DateTime<Utc>,
) -> Result<String, BuildRequestError> {
    BuildRequest::from_args(requester, args, now).map(|r| r.to_json_pretty())
}

/// Builds the request JSON, reading the clock once.
pub fn create_build_request(
    requester: &str,
    args: &BuildRequestArgs,
) -> Result<String, BuildRequestError> {
    create_build_request_at(requester, args, Utc::now())
}
