//! A chat session: one conversation driven turn by turn.

use stepwise_core::message::Conversation;
use tracing::warn;

use crate::event::TurnEvent;
use crate::loop_runner::{AgentLoop, TurnReport};

/// How a submitted turn ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Completed(TurnReport),
    Abandoned { reason: String },
}

impl TurnOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TurnOutcome::Completed(_))
    }
}

/// Owns the conversation for the lifetime of the process.
///
/// A failed turn never ends the session: its messages stay in the log and
/// the next query continues from there.
pub struct Session {
    conversation: Conversation,
    agent: AgentLoop,
}

impl Session {
    pub fn new(agent: AgentLoop, system_prompt: impl Into<String>) -> Self {
        Self {
            conversation: Conversation::new(system_prompt),
            agent,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Run one turn for a line of user input.
    pub async fn submit(&mut self, query: &str) -> TurnOutcome {
        match self.agent.run_turn(&mut self.conversation, query).await {
            Ok(report) => TurnOutcome::Completed(report),
            Err(e) => {
                warn!(
                    conversation_id = %self.conversation.id,
                    error = %e,
                    "Turn abandoned"
                );
                let reason = e.to_string();
                self.agent.emit(TurnEvent::Abandoned {
                    reason: reason.clone(),
                });
                TurnOutcome::Abandoned { reason }
            }
        }
    }
}
