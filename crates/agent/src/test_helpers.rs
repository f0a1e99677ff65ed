//! Shared test helpers for agent loop tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use stepwise_core::envelope::ToolInput;
use stepwise_core::error::{ProviderError, ToolError};
use stepwise_core::message::Message;
use stepwise_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use stepwise_core::tool::{Tool, ToolResult};

use crate::event::{TurnEvent, TurnObserver};

/// A mock provider that returns a sequence of scripted replies.
///
/// Each call to `complete` returns the next reply in the queue and records
/// the request it was given. Panics if more calls are made than replies
/// provided.
pub struct SequentialMockProvider {
    replies: Mutex<Vec<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Scripted raw reply texts, all delivered successfully.
    pub fn script(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let replies = self.replies.lock().unwrap();
        let call = requests.len();

        if call >= replies.len() {
            panic!(
                "SequentialMockProvider: no more replies (call #{}, have {})",
                call,
                replies.len()
            );
        }

        requests.push(request);
        replies[call].clone().map(|text| make_response(&text))
    }
}

/// Wrap a raw reply text as a provider response.
pub fn make_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Records every event it sees.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<TurnEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<TurnEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.event_type()).collect()
    }
}

impl TurnObserver for RecordingObserver {
    fn on_event(&self, event: &TurnEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Echoes its input back and counts invocations. Clones share the counter.
#[derive(Default, Clone)]
pub struct CountingEchoTool {
    calls: Arc<AtomicUsize>,
}

impl CountingEchoTool {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for CountingEchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes its input"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolResult, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ToolResult::ok(input.to_string()))
    }
}

/// Build a JSON action envelope as a model would send it.
pub fn action(function: &str, input: serde_json::Value) -> String {
    serde_json::json!({ "step": "action", "function": function, "input": input }).to_string()
}

pub fn plan(content: &str) -> String {
    serde_json::json!({ "step": "plan", "content": content }).to_string()
}

pub fn output(content: &str) -> String {
    serde_json::json!({ "step": "output", "content": content }).to_string()
}
