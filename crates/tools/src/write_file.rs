//! Write-file tool: create or overwrite a file, creating parent directories.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use stepwise_core::envelope::ToolInput;
use stepwise_core::error::ToolError;
use stepwise_core::tool::{Tool, ToolResult};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct WriteFileParams {
    path: String,
    content: String,
}

pub struct WriteFileTool;

impl WriteFileTool {
    fn failed(reason: impl Into<String>) -> ToolError {
        ToolError::ExecutionFailed {
            tool_name: "write_file".into(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Creates or overwrites a file. Input: {\"path\": \"relative/path\", \"content\": \"file contents\"}. Missing folders are created."
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolResult, ToolError> {
        let params: WriteFileParams =
            serde_json::from_value(input.to_value()).map_err(|e| ToolError::InvalidArguments {
                tool_name: "write_file".into(),
                reason: format!("expected {{\"path\", \"content\"}}: {e}"),
            })?;

        if params.path.trim().is_empty() {
            return Err(ToolError::InvalidArguments {
                tool_name: "write_file".into(),
                reason: "'path' must not be empty".into(),
            });
        }

        let path = Path::new(&params.path);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Self::failed(format!("could not create directory {}: {e}", parent.display()))
            })?;
        }

        tokio::fs::write(path, &params.content)
            .await
            .map_err(|e| Self::failed(format!("could not write {}: {e}", params.path)))?;

        debug!(path = %params.path, bytes = params.content.len(), "File written");

        Ok(ToolResult::ok(format!(
            "File '{}' created successfully.",
            params.path
        )))
    }
}
