//! The agent loop: the heart of Stepwise.
//!
//! Each turn follows a **plan → action → observe → output** cycle:
//!
//! 1. **Receive** one line of user input
//! 2. **Query** the model with the whole conversation
//! 3. **If plan**: report it and query again
//! 4. **If action**: run the named tool, append its result as an observation,
//!    and query again
//! 5. **If output**: report the answer and end the turn
//!
//! Anything else (an unparseable reply, an unknown tool, a failed query)
//! abandons the turn. The session keeps going.

pub mod event;
pub mod loop_runner;
pub mod prompt;
pub mod session;

#[cfg(test)]
mod test_helpers;

pub use event::{NoopObserver, TurnEvent, TurnObserver};
pub use loop_runner::{AgentLoop, TurnReport};
pub use prompt::build_system_prompt;
pub use session::{Session, TurnOutcome};
