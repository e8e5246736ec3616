//! Hello World - minimal demonstration of the agentic orchestration
//! engine's public facade.
//!
//! Expects `workspace/SOUL.md`, `workspace/AGENT.md` and
//! `mcp_servers.json` next to the working directory the binary is run
//! from, and `OPENAI_API_KEY` in the environment.

use agentic_api::AgenticClient;
use agentic_core::AgentConfig;
use anyhow::{Context, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AgentConfig::from_env("mcp_servers.json");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(config.log_filter()).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let client = AgenticClient::new(config).context("failed to construct the agent")?;

    let prompt = "Hello! Please introduce yourself in one sentence.";
    println!("Sending query: {prompt}");
    println!("{}", "-".repeat(50));

    let response = client.invoke("hello-world-demo", prompt).await.context("invoke failed")?;
    println!("Agent says: {}", response.message);

    client.close().await;
    println!("{}", "-".repeat(50));
    println!("Query completed.");
    Ok(())
}
