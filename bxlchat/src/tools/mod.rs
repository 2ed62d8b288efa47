mod build_request;
mod registry;
mod submit_build;
mod r#trait;

pub use build_request::{CreateBuildRequestTool, TOOL_CREATE_BUILD_REQUEST};
pub use r#trait::Tool;
pub use registry::ToolRegistry;
pub use submit_build::{SubmitBuildRequestTool, TOOL_SUBMIT_BUILD_REQUEST};
