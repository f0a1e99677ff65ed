//! The agent reasoning loop implementation.

use std::sync::Arc;
use std::time::Instant;
use stepwise_core::envelope::{Envelope, Step};
use stepwise_core::error::{Error, ProtocolError};
use stepwise_core::message::{Conversation, Message};
use stepwise_core::provider::{Provider, ProviderRequest, ResponseFormat};
use stepwise_core::tool::ToolRegistry;
use tracing::{debug, info};

use crate::event::{NoopObserver, TurnEvent, TurnObserver};

/// What a completed turn produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    /// Content of the final `output` step
    pub answer: String,

    /// Number of model queries issued during the turn
    pub model_queries: u32,

    /// Number of tools invoked during the turn
    pub tool_calls: u32,
}

/// The core agent loop that drives one turn of plan/action/observe/output.
pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Default max tokens per response
    max_tokens: Option<u32>,

    /// Tool registry
    tools: Arc<ToolRegistry>,

    /// Maximum model queries per turn, unbounded when `None`
    max_steps: Option<u32>,

    /// Receives progress events as the turn unfolds
    observer: Arc<dyn TurnObserver>,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
            tools,
            max_steps: None,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Set the default max tokens per LLM response.
    pub fn with_max_tokens(mut self, max: Option<u32>) -> Self {
        self.max_tokens = max;
        self
    }

    /// Cap the number of model queries a single turn may issue.
    pub fn with_max_steps(mut self, max: Option<u32>) -> Self {
        self.max_steps = max;
        self
    }

    /// Attach an observer for turn progress events.
    pub fn with_observer(mut self, observer: Arc<dyn TurnObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub(crate) fn emit(&self, event: TurnEvent) {
        self.observer.on_event(&event);
    }

    /// Run one turn for a line of user input.
    ///
    /// The query is appended as a user message, then the model is queried
    /// repeatedly until it produces an `output` step. Every other way out of
    /// the loop is an `Err`, and the messages appended so far stay in the
    /// conversation.
    pub async fn run_turn(
        &self,
        conversation: &mut Conversation,
        query: &str,
    ) -> Result<TurnReport, Error> {
        info!(
            conversation_id = %conversation.id,
            messages = conversation.len(),
            "Starting turn"
        );

        conversation.push(Message::user(query));

        let mut model_queries: u32 = 0;
        let mut tool_calls: u32 = 0;

        loop {
            if let Some(max) = self.max_steps
                && model_queries >= max
            {
                return Err(ProtocolError::StepLimit(max).into());
            }
            model_queries += 1;

            debug!(
                conversation_id = %conversation.id,
                iteration = model_queries,
                "Agent loop iteration"
            );

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: conversation.messages().to_vec(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                response_format: ResponseFormat::JsonObject,
            };

            let response = self.provider.complete(request).await?;
            if let Some(usage) = &response.usage {
                debug!(
                    model = %response.model,
                    tokens_used = usage.total_tokens,
                    "Model replied"
                );
            }

            // Appended before decoding, parseable or not.
            let raw = response.message.content;
            conversation.push(Message::assistant(raw.clone()));

            match Envelope::decode(&raw)? {
                Envelope::Plan { content } => {
                    self.emit(TurnEvent::Plan { content });
                }
                Envelope::Action { call, .. } => {
                    let Some(tool) = self.tools.get(&call.function) else {
                        return Err(ProtocolError::UnknownTool(call.function).into());
                    };

                    self.emit(TurnEvent::ToolCall {
                        name: call.function.clone(),
                        input: call.input.clone(),
                    });

                    let start = Instant::now();
                    let result = tool.execute(&call.input).await?;
                    let duration_ms = start.elapsed().as_millis() as u64;
                    tool_calls += 1;

                    info!(
                        conversation_id = %conversation.id,
                        tool = %call.function,
                        success = result.success,
                        duration_ms,
                        "Tool executed"
                    );

                    self.emit(TurnEvent::Observation {
                        name: call.function,
                        output: result.output.clone(),
                        success: result.success,
                    });
                    conversation.push(Message::observation(result.output));
                }
                Envelope::Observe { .. } => {
                    return Err(ProtocolError::UnexpectedStep(Step::Observe).into());
                }
                Envelope::Output { content } => {
                    self.emit(TurnEvent::Output {
                        content: content.clone(),
                    });
                    info!(
                        conversation_id = %conversation.id,
                        model_queries,
                        tool_calls,
                        "Turn complete"
                    );
                    return Ok(TurnReport {
                        answer: content,
                        model_queries,
                        tool_calls,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use stepwise_config::DevServerConfig;
    use stepwise_core::error::ProviderError;
    use stepwise_core::message::Role;

    fn agent_with(provider: Arc<SequentialMockProvider>, tools: ToolRegistry) -> AgentLoop {
        AgentLoop::new(provider, "mock-model", 0.7, Arc::new(tools))
    }

    #[tokio::test]
    async fn plans_then_output_takes_one_query_each() {
        let provider = Arc::new(SequentialMockProvider::script(&[
            &plan("think"),
            &plan("think more"),
            &output("done"),
        ]));
        let observer = Arc::new(RecordingObserver::default());
        let agent = agent_with(provider.clone(), ToolRegistry::new())
            .with_observer(observer.clone());

        let mut conv = Conversation::new("system");
        let report = agent.run_turn(&mut conv, "hello").await.unwrap();

        assert_eq!(report.answer, "done");
        assert_eq!(report.model_queries, 3);
        assert_eq!(report.tool_calls, 0);
        assert_eq!(provider.call_count(), 3);
        // system + user + 3 assistant replies
        assert_eq!(conv.len(), 5);
        assert_eq!(observer.kinds(), vec!["plan", "plan", "output"]);
    }

    #[tokio::test]
    async fn each_query_sees_the_whole_conversation() {
        let provider = Arc::new(SequentialMockProvider::script(&[
            &plan("p"),
            &output("o"),
        ]));
        let agent = agent_with(provider.clone(), ToolRegistry::new());

        let mut conv = Conversation::new("system");
        agent.run_turn(&mut conv, "hi").await.unwrap();

        let requests = provider.requests();
        assert_eq!(requests[0].messages.len(), 2);
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(requests[0].messages[0].role, Role::System);
        assert_eq!(requests[0].response_format, ResponseFormat::JsonObject);
        assert_eq!(requests[0].model, "mock-model");
    }

    #[tokio::test]
    async fn action_appends_observation_as_user_message() {
        let provider = Arc::new(SequentialMockProvider::script(&[
            &action("echo", serde_json::json!("ping")),
            &output("pong"),
        ]));
        let observer = Arc::new(RecordingObserver::default());
        let echo = CountingEchoTool::default();
        let mut tools = ToolRegistry::new();
        tools.register(Box::new(echo.clone()));
        let agent = agent_with(provider.clone(), tools).with_observer(observer.clone());

        let mut conv = Conversation::new("system");
        let report = agent.run_turn(&mut conv, "ping it").await.unwrap();

        assert_eq!(report.tool_calls, 1);
        assert_eq!(report.model_queries, 2);
        assert_eq!(echo.calls(), 1);
        // system, user, action, observation, output
        assert_eq!(conv.len(), 5);
        let observation = &conv.messages()[3];
        assert_eq!(observation.role, Role::User);
        assert_eq!(
            Envelope::decode(&observation.content).unwrap(),
            Envelope::observation("ping")
        );
        assert_eq!(
            observer.kinds(),
            vec!["tool_call", "observation", "output"]
        );
    }

    #[tokio::test]
    async fn every_tool_call_is_followed_by_a_model_query() {
        let provider = Arc::new(SequentialMockProvider::script(&[
            &action("echo", serde_json::json!("one")),
            &action("echo", serde_json::json!("two")),
            &plan("both done"),
            &action("echo", serde_json::json!("three")),
            &output("finished"),
        ]));
        let echo = CountingEchoTool::default();
        let mut tools = ToolRegistry::new();
        tools.register(Box::new(echo.clone()));
        let agent = agent_with(provider.clone(), tools);

        let mut conv = Conversation::new("system");
        let report = agent.run_turn(&mut conv, "echo three times").await.unwrap();

        assert_eq!(echo.calls(), 3);
        assert_eq!(provider.call_count(), 5);
        assert_eq!(report.tool_calls as usize, echo.calls());

        // Each observation is answered by a model reply before the next tool runs.
        let requests = provider.requests();
        for (i, request) in requests.iter().enumerate().skip(1) {
            let previous = &requests[i - 1].messages;
            assert!(request.messages.len() > previous.len());
        }
        let roles: Vec<Role> = conv.messages().iter().map(|m| m.role).collect();
        for pair in roles.windows(2).skip(2) {
            assert!(!(pair[0] == Role::User && pair[1] == Role::User));
        }
    }

    #[tokio::test]
    async fn malformed_reply_is_kept_and_abandons_turn() {
        let provider = Arc::new(SequentialMockProvider::script(&["this is not json"]));
        let agent = agent_with(provider.clone(), ToolRegistry::new());

        let mut conv = Conversation::new("system");
        let err = agent.run_turn(&mut conv, "hello").await.unwrap_err();

        assert!(matches!(err, Error::Protocol(ProtocolError::Malformed(_))));
        assert_eq!(conv.len(), 3);
        assert_eq!(conv.last().unwrap().role, Role::Assistant);
        assert_eq!(conv.last().unwrap().content, "this is not json");
    }

    #[tokio::test]
    async fn unknown_tool_abandons_without_observation() {
        let provider = Arc::new(SequentialMockProvider::script(&[&action(
            "deploy",
            serde_json::json!("prod"),
        )]));
        let agent = agent_with(provider.clone(), ToolRegistry::new());

        let mut conv = Conversation::new("system");
        let err = agent.run_turn(&mut conv, "ship it").await.unwrap_err();

        match err {
            Error::Protocol(ProtocolError::UnknownTool(name)) => assert_eq!(name, "deploy"),
            other => panic!("unexpected error: {other}"),
        }
        // system + user + the action reply, nothing more
        assert_eq!(conv.len(), 3);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn observe_from_model_abandons_turn() {
        let provider = Arc::new(SequentialMockProvider::script(&[
            r#"{"step":"observe","output":"I ran it myself"}"#,
        ]));
        let agent = agent_with(provider, ToolRegistry::new());

        let mut conv = Conversation::new("system");
        let err = agent.run_turn(&mut conv, "hello").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::UnexpectedStep(Step::Observe))
        ));
        assert_eq!(conv.len(), 3);
    }

    #[tokio::test]
    async fn provider_error_abandons_turn() {
        let provider = Arc::new(SequentialMockProvider::new(vec![Err(
            ProviderError::Network("connection refused".into()),
        )]));
        let agent = agent_with(provider, ToolRegistry::new());

        let mut conv = Conversation::new("system");
        let err = agent.run_turn(&mut conv, "hello").await.unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::Network(_))));
        // Only the user message was added
        assert_eq!(conv.len(), 2);
    }

    #[tokio::test]
    async fn step_limit_is_enforced() {
        let provider = Arc::new(SequentialMockProvider::script(&[
            &plan("one"),
            &plan("two"),
        ]));
        let agent = agent_with(provider.clone(), ToolRegistry::new()).with_max_steps(Some(2));

        let mut conv = Conversation::new("system");
        let err = agent.run_turn(&mut conv, "loop forever").await.unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::StepLimit(2))));
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn write_file_invalid_input_abandons_turn() {
        let provider = Arc::new(SequentialMockProvider::script(&[&action(
            "write_file",
            serde_json::json!("just a string"),
        )]));
        let tools = stepwise_tools::default_registry(DevServerConfig::default());
        let agent = agent_with(provider, tools);

        let mut conv = Conversation::new("system");
        let err = agent.run_turn(&mut conv, "write").await.unwrap_err();
        assert!(matches!(err, Error::Tool(_)));
        assert_eq!(conv.len(), 3);
    }

    #[tokio::test]
    async fn read_file_soft_failure_continues_turn() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let provider = Arc::new(SequentialMockProvider::script(&[
            &action("read_file", serde_json::json!(missing.to_string_lossy())),
            &output("the file does not exist"),
        ]));
        let observer = Arc::new(RecordingObserver::default());
        let tools = stepwise_tools::default_registry(DevServerConfig::default());
        let agent = agent_with(provider, tools).with_observer(observer.clone());

        let mut conv = Conversation::new("system");
        let report = agent.run_turn(&mut conv, "read it").await.unwrap();
        assert_eq!(report.answer, "the file does not exist");

        let events = observer.events();
        match &events[1] {
            TurnEvent::Observation { success, output, .. } => {
                assert!(!success);
                assert!(output.contains("missing.txt"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
