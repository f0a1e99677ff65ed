//! Built-in tool implementations for Stepwise.
//!
//! The agent can write files, read files, and run shell commands. Nothing
//! here sandboxes what those commands do.

pub mod read_file;
pub mod run_command;
pub mod write_file;

use stepwise_config::DevServerConfig;
use stepwise_core::tool::ToolRegistry;

pub use read_file::ReadFileTool;
pub use run_command::RunCommandTool;
pub use write_file::WriteFileTool;

/// Create the registry of the three built-in tools.
pub fn default_registry(dev_server: DevServerConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(WriteFileTool));
    registry.register(Box::new(ReadFileTool));
    registry.register(Box::new(RunCommandTool::new(dev_server)));
    registry
}
