//! Public facade for the agentic orchestration engine.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use agentic_api::AgenticClient;
//! use agentic_core::AgentConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AgentConfig::from_env("mcp_servers.json");
//!     let client = AgenticClient::new(config)?;
//!     let response = client.invoke("session-1", "say hi").await?;
//!     println!("{}", response.message);
//!     client.close().await;
//!     Ok(())
//! }
//! ```

pub mod client;

pub use agentic_core as core;
pub use agentic_core::{AgentConfig, AgentError, AgentResponse, CheckpointStore, InMemoryCheckpointStore};

pub use client::AgenticClient;
