//! Protocol envelope: the structured unit exchanged with the model.
//!
//! Every model reply must be a single JSON object of the shape
//!
//! ```json
//! { "step": "plan" | "action" | "observe" | "output",
//!   "content": "...",
//!   "function": "tool name (action only)",
//!   "input": "string or object (action only)" }
//! ```
//!
//! The codec only checks shape. Whether `function` names a registered tool
//! is decided by the agent loop, so this module never sees the registry.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// The step tag of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Plan,
    Action,
    Observe,
    Output,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Plan => "plan",
            Step::Action => "action",
            Step::Observe => "observe",
            Step::Output => "output",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The argument of a tool call: a bare string (shell commands, paths) or a
/// mapping (file writes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolInput {
    Text(String),
    Fields(serde_json::Map<String, Value>),
}

impl ToolInput {
    /// The bare string form, if this input is one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ToolInput::Text(s) => Some(s),
            ToolInput::Fields(_) => None,
        }
    }

    /// A string field of a mapping input.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        match self {
            ToolInput::Fields(map) => map.get(key).and_then(Value::as_str),
            ToolInput::Text(_) => None,
        }
    }

    /// The input as a JSON value, for typed deserialization by a tool.
    pub fn to_value(&self) -> Value {
        match self {
            ToolInput::Text(s) => Value::String(s.clone()),
            ToolInput::Fields(map) => Value::Object(map.clone()),
        }
    }
}

impl fmt::Display for ToolInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolInput::Text(s) => f.write_str(s),
            ToolInput::Fields(map) => write!(f, "{}", Value::Object(map.clone())),
        }
    }
}

/// A tool invocation requested by an `action` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to execute
    pub function: String,

    /// Tool argument
    pub input: ToolInput,
}

/// A decoded envelope. One variant per step, each carrying only the fields
/// the agent loop acts on.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Plan { content: String },
    Action { content: Option<String>, call: ToolCall },
    Observe { output: String },
    Output { content: String },
}

/// A model reply that is not a well-formed envelope.
#[derive(Debug, Clone, Error)]
#[error("Could not parse model reply ({reason}): {raw}")]
pub struct ParseError {
    /// What was wrong with the reply
    pub reason: String,

    /// The reply text exactly as received
    pub raw: String,
}

impl ParseError {
    pub fn new(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            raw: raw.into(),
        }
    }
}

/// On-the-wire shape, before per-step validation.
#[derive(Debug, Serialize, Deserialize)]
struct WireEnvelope {
    step: Step,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    function: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    input: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    output: Option<Value>,
}

impl Envelope {
    /// Decode a raw model reply.
    pub fn decode(text: &str) -> Result<Self, ParseError> {
        let wire: WireEnvelope = serde_json::from_str(text.trim())
            .map_err(|e| ParseError::new(text, e.to_string()))?;

        match wire.step {
            Step::Plan => {
                let content = required_text(wire.content, text, "plan")?;
                Ok(Envelope::Plan { content })
            }
            Step::Output => {
                let content = required_text(wire.content, text, "output")?;
                Ok(Envelope::Output { content })
            }
            Step::Action => {
                let function = wire
                    .function
                    .filter(|f| !f.trim().is_empty())
                    .ok_or_else(|| ParseError::new(text, "action step without 'function'"))?;
                let input = match wire.input {
                    Some(Value::String(s)) => ToolInput::Text(s),
                    Some(Value::Object(map)) => ToolInput::Fields(map),
                    Some(other) => {
                        return Err(ParseError::new(
                            text,
                            format!("'input' must be a string or an object, got {other}"),
                        ));
                    }
                    None => return Err(ParseError::new(text, "action step without 'input'")),
                };
                Ok(Envelope::Action {
                    content: wire.content.map(value_text),
                    call: ToolCall { function, input },
                })
            }
            Step::Observe => {
                let output = match wire.output {
                    Some(Value::String(s)) => s,
                    Some(other) => other.to_string(),
                    None => wire.content.map(value_text).unwrap_or_default(),
                };
                Ok(Envelope::Observe { output })
            }
        }
    }

    /// Encode as compact JSON.
    pub fn encode(&self) -> String {
        let wire = match self {
            Envelope::Plan { content } => WireEnvelope {
                step: Step::Plan,
                content: Some(Value::String(content.clone())),
                function: None,
                input: None,
                output: None,
            },
            Envelope::Action { content, call } => WireEnvelope {
                step: Step::Action,
                content: content.clone().map(Value::String),
                function: Some(call.function.clone()),
                input: Some(call.input.to_value()),
                output: None,
            },
            Envelope::Observe { output } => WireEnvelope {
                step: Step::Observe,
                content: None,
                function: None,
                input: None,
                output: Some(Value::String(output.clone())),
            },
            Envelope::Output { content } => WireEnvelope {
                step: Step::Output,
                content: Some(Value::String(content.clone())),
                function: None,
                input: None,
                output: None,
            },
        };
        serde_json::to_string(&wire).unwrap_or_default()
    }

    /// An observation reporting a tool result back to the model.
    pub fn observation(output: impl Into<String>) -> Self {
        Envelope::Observe {
            output: output.into(),
        }
    }

    pub fn step(&self) -> Step {
        match self {
            Envelope::Plan { .. } => Step::Plan,
            Envelope::Action { .. } => Step::Action,
            Envelope::Observe { .. } => Step::Observe,
            Envelope::Output { .. } => Step::Output,
        }
    }
}

/// `content` of a plan or output step, which must be a string.
fn required_text(content: Option<Value>, raw: &str, step: &str) -> Result<String, ParseError> {
    match content {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ParseError::new(
            raw,
            format!("{step} step 'content' must be a string, got {other}"),
        )),
        None => Err(ParseError::new(raw, format!("{step} step without 'content'"))),
    }
}

/// Informational text: strings as-is, anything else as compact JSON.
fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
