//! Turn progress events.
//!
//! `TurnEvent` reports what the loop is doing as it happens, so a front-end
//! can render progress lines tagged by step kind:
//! - `plan`: the model's reasoning step
//! - `tool_call`: a tool is about to run
//! - `observation`: the tool finished; its result goes back to the model
//! - `output`: the final answer for the turn
//! - `abandoned`: the turn was given up (bad reply, unknown tool, ...)

use serde::{Deserialize, Serialize};
use stepwise_core::envelope::ToolInput;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    Plan { content: String },

    ToolCall { name: String, input: ToolInput },

    Observation {
        name: String,
        output: String,
        success: bool,
    },

    Output { content: String },

    Abandoned { reason: String },
}

impl TurnEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Plan { .. } => "plan",
            Self::ToolCall { .. } => "tool_call",
            Self::Observation { .. } => "observation",
            Self::Output { .. } => "output",
            Self::Abandoned { .. } => "abandoned",
        }
    }
}

/// Receives turn events synchronously, in order.
pub trait TurnObserver: Send + Sync {
    fn on_event(&self, event: &TurnEvent);
}

/// Discards every event.
pub struct NoopObserver;

impl TurnObserver for NoopObserver {
    fn on_event(&self, _event: &TurnEvent) {}
}
