//! Run-command tool: execute a shell command and capture its output.
//!
//! Commands run through the host shell with stdin closed, so a program that
//! prompts for input sees end-of-file instead of blocking the agent. A
//! command containing the dev-server trigger is launched detached instead:
//! the agent gets a fixed confirmation back and never observes the server's
//! real output or exit.

use async_trait::async_trait;
use std::process::Stdio;
use stepwise_config::DevServerConfig;
use stepwise_core::envelope::ToolInput;
use stepwise_core::error::ToolError;
use stepwise_core::tool::{Tool, ToolResult};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Returned when a command finishes without printing anything.
pub const EMPTY_OUTPUT: &str = "Command executed.";

pub struct RunCommandTool {
    dev_server: DevServerConfig,
}

impl RunCommandTool {
    pub fn new(dev_server: DevServerConfig) -> Self {
        Self { dev_server }
    }

    fn is_dev_server(&self, command: &str) -> bool {
        command.contains(&self.dev_server.trigger)
    }

    /// Fire-and-forget launch. The child handle is dropped without a join
    /// point, so the server outlives this call and its outcome is never seen.
    fn launch_detached(&self, command: &str) -> ToolResult {
        let mut cmd = shell(command);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        match cmd.spawn() {
            Ok(child) => {
                info!(command = %command, pid = ?child.id(), "Development server launched");
            }
            Err(e) => {
                warn!(command = %command, error = %e, "Failed to launch development server");
                return ToolResult::soft_failure(format!(
                    "Failed to start development server: {e}"
                ));
            }
        }

        if self.dev_server.open_browser {
            open_in_browser(&self.dev_server.url);
        }

        ToolResult::ok(format!(
            "Development server started. Open {} to view the app.",
            self.dev_server.url
        ))
    }

    async fn run_to_completion(&self, command: &str) -> ToolResult {
        let mut cmd = shell(command);
        cmd.stdin(Stdio::null());

        match cmd.output().await {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);

                if !output.status.success() {
                    debug!(command = %command, status = %output.status, "Command exited unsuccessfully");
                }

                let combined = join_output(&stdout, &stderr);
                let text = if combined.trim().is_empty() {
                    EMPTY_OUTPUT.to_string()
                } else {
                    combined.trim_end().to_string()
                };

                ToolResult {
                    success: output.status.success(),
                    output: text,
                }
            }
            Err(e) => {
                warn!(command = %command, error = %e, "Failed to spawn shell");
                ToolResult::soft_failure(format!("Failed to run command: {e}"))
            }
        }
    }
}

/// stdout followed by stderr, separated by a newline when both are present.
fn join_output(stdout: &str, stderr: &str) -> String {
    if stderr.is_empty() {
        return stdout.to_string();
    }
    if stdout.is_empty() || stdout.ends_with('\n') {
        return format!("{stdout}{stderr}");
    }
    format!("{stdout}\n{stderr}")
}

fn shell(command: &str) -> Command {
    if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

fn open_in_browser(url: &str) {
    let mut cmd = if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", "", url]);
        cmd
    } else if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(url);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(url);
        cmd
    };
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    if let Err(e) = cmd.spawn() {
        warn!(url = %url, error = %e, "Could not open browser");
    }
}

#[async_trait]
impl Tool for RunCommandTool {
    fn name(&self) -> &str {
        "run_command"
    }

    fn description(&self) -> &str {
        "Executes a terminal command (compilers, interpreters, executables) and returns its output. Input: the command string."
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolResult, ToolError> {
        let command = input
            .as_text()
            .or_else(|| input.str_field("command"))
            .or_else(|| input.str_field("cmd"))
            .ok_or_else(|| ToolError::InvalidArguments {
                tool_name: "run_command".into(),
                reason: "expected a command string".into(),
            })?;

        if self.is_dev_server(command) {
            return Ok(self.launch_detached(command));
        }

        debug!(command = %command, "Executing shell command");
        Ok(self.run_to_completion(command).await)
    }
}
