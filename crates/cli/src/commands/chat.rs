//! `stepwise chat`: Interactive or single-message chat mode.

use std::io::Write;
use std::sync::Arc;
use stepwise_agent::{AgentLoop, Session, TurnOutcome, build_system_prompt};
use stepwise_config::AppConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::console::ConsoleObserver;

/// Providers that run locally and accept requests without a key.
const KEYLESS_PROVIDERS: &[&str] = &["ollama", "vllm", "llamacpp", "llama.cpp"];

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() && !KEYLESS_PROVIDERS.contains(&config.provider.as_str()) {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables (or put it in .env):");
        eprintln!("    STEPWISE_API_KEY=sk-...");
        eprintln!("    OPENAI_API_KEY=sk-...");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let mut session = build_session(&config)?;

    if let Some(msg) = message {
        // Single message mode
        return match session.submit(&msg).await {
            TurnOutcome::Completed(_) => Ok(()),
            TurnOutcome::Abandoned { reason } => Err(reason.into()),
        };
    }

    println!();
    println!("  Stepwise coding agent");
    println!("  Provider:  {}", config.provider);
    println!("  Model:     {}", config.model);
    println!("  Type a request and press Enter. Type 'exit' to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if matches!(query, "exit" | "quit") {
            break;
        }

        session.submit(query).await;
    }

    info!(
        messages = session.conversation().len(),
        "Chat session ended"
    );
    println!();
    Ok(())
}

/// Wire the provider, tools and console into a fresh session.
fn build_session(config: &AppConfig) -> Result<Session, Box<dyn std::error::Error>> {
    let provider = stepwise_providers::router::build_from_config(config)?;
    let tools = Arc::new(stepwise_tools::default_registry(config.dev_server.clone()));

    let system_prompt = match &config.agent.system_prompt_override {
        Some(prompt) => prompt.clone(),
        None => build_system_prompt(&tools),
    };

    let agent = AgentLoop::new(provider, &config.model, config.temperature, tools)
        .with_max_tokens(config.max_tokens)
        .with_max_steps(config.agent.max_steps)
        .with_observer(Arc::new(ConsoleObserver));

    Ok(Session::new(agent, system_prompt))
}
