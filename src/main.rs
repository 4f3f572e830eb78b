//! Agent Gateway CLI
//!
//! Thin shell over the library: loads the agent and provider catalogs,
//! runs one request against an agent, and prints each streamed delta as a
//! JSON line on stdout. Persistence, auth, and wire framing live outside
//! this binary.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use agent_gateway::agent::{AgentDefinitionLoader, AgentRequest};
use agent_gateway::Orchestrator;
use agent_gateway_llm::{ProviderCatalog, ProviderEntry};
use agent_gateway_tools::{ShellTool, ToolRegistry};

#[derive(Parser)]
#[command(name = "agent-gateway", about = "LLM agent execution server core")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one request against an agent and stream deltas as JSON lines
    Run {
        /// Directory of agent definition *.json files
        #[arg(long)]
        agents: PathBuf,
        /// Provider configuration TOML file
        #[arg(long)]
        providers: PathBuf,
        /// Agent id to run
        #[arg(long)]
        agent: String,
        /// Optional chat id for history-scoped ids
        #[arg(long)]
        chat_id: Option<String>,
        /// The user message
        message: String,
    },
    /// List the agents available in a definition directory
    List {
        #[arg(long)]
        agents: PathBuf,
    },
}

#[derive(Debug, Deserialize)]
struct ProviderConfigFile {
    #[serde(default)]
    providers: Vec<ProviderEntry>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::List { agents } => {
            let catalog = AgentDefinitionLoader::load_dir(&agents)?;
            for id in catalog.ids() {
                println!("{}", id);
            }
        }
        Command::Run {
            agents,
            providers,
            agent,
            chat_id,
            message,
        } => {
            let agent_catalog = AgentDefinitionLoader::load_dir(&agents)?;
            let definition = agent_catalog
                .get(&agent)
                .with_context(|| format!("agent not found: {}", agent))?;

            let raw = std::fs::read_to_string(&providers)
                .with_context(|| format!("cannot read {}", providers.display()))?;
            let config: ProviderConfigFile =
                toml::from_str(&raw).context("invalid provider configuration")?;
            let provider_catalog = Arc::new(ProviderCatalog::from_entries(&config.providers));

            let mut registry = ToolRegistry::new();
            registry.register(Arc::new(ShellTool::default()));
            let registry = Arc::new(registry);

            let mut request = AgentRequest::new(message);
            if let Some(chat_id) = chat_id {
                request = request.with_chat_id(chat_id);
            }

            let orchestrator = Orchestrator::new(provider_catalog);
            let mut stream = orchestrator.run_stream(definition, request, vec![], registry);
            while let Some(delta) = stream.recv().await {
                println!("{}", serde_json::to_string(&delta)?);
            }
        }
    }
    Ok(())
}
