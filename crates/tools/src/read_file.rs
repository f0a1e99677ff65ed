//! Read-file tool: return a file's contents.
//!
//! I/O failures are not errors: the description is returned as the tool
//! output so the model can react to it on its next step.

use async_trait::async_trait;
use stepwise_core::envelope::ToolInput;
use stepwise_core::error::ToolError;
use stepwise_core::tool::{Tool, ToolResult};
use tracing::debug;

pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Reads a file and returns its contents. Input: the file path."
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolResult, ToolError> {
        let path = input
            .as_text()
            .or_else(|| input.str_field("path"))
            .ok_or_else(|| ToolError::InvalidArguments {
                tool_name: "read_file".into(),
                reason: "expected a file path".into(),
            })?;

        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(ToolResult::ok(content)),
            Err(e) => {
                debug!(path = %path, error = %e, "File read failed");
                Ok(ToolResult::soft_failure(format!(
                    "Failed to read '{path}': {e}"
                )))
            }
        }
    }
}
