//! Console rendering of turn progress.

use stepwise_agent::{TurnEvent, TurnObserver};

/// Prints one tagged line per turn event on stdout.
pub struct ConsoleObserver;

impl TurnObserver for ConsoleObserver {
    fn on_event(&self, event: &TurnEvent) {
        println!("{}", render(event));
        if matches!(event, TurnEvent::Output { .. }) {
            println!("✨ Ready for your next command.");
        }
    }
}

/// Format an event as a console line.
pub fn render(event: &TurnEvent) -> String {
    match event {
        TurnEvent::Plan { content } => format!("🧠: {content}"),
        TurnEvent::ToolCall { name, input } => {
            format!("🛠️: Calling tool: {name} with input: {input}")
        }
        TurnEvent::Observation { name, success, .. } => {
            if *success {
                format!("   {name} finished")
            } else {
                format!("   {name} reported a failure")
            }
        }
        TurnEvent::Output { content } => format!("🤖: {content}"),
        TurnEvent::Abandoned { reason } => format!("⚠️ {reason}"),
    }
}
