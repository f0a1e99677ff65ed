//! # Stepwise Core
//!
//! Domain types, traits, and error definitions for the Stepwise coding agent.
//! This crate has **no I/O** of its own: it defines the conversation log,
//! the envelope codec, and the provider and tool seams that the other
//! crates implement against.

pub mod envelope;
pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use envelope::{Envelope, ParseError, Step, ToolCall, ToolInput};
pub use error::{Error, ProtocolError, ProviderError, Result, ToolError};
pub use message::{Conversation, ConversationId, Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ResponseFormat, Usage};
pub use tool::{Tool, ToolRegistry, ToolResult};
