//! Agent Execution Orchestrator
//!
//! Drives one run end to end: builds the execution context, dispatches to
//! the control strategy named by the agent's run spec, and guarantees the
//! output stream always terminates with a `Finish` delta. Any failure the
//! strategies surface (budget exhaustion, provider errors) degrades to a
//! generic apology delta instead of propagating to the caller.
//!
//! Concurrency model: each run is one spawned task consuming one delta
//! stream at a time. Runs share only the read-only provider/tool catalogs.

pub mod accumulator;
pub mod context;
pub mod plan;
pub mod sink;
pub mod strategies;
pub mod turn;
pub mod verify;

pub use accumulator::ToolCallAccumulator;
pub use context::{ExecutionContext, HistoryKind};
pub use sink::DeltaSink;
pub use turn::{ModelTurn, OrchestratorServices, TurnOptions};
pub use verify::VerifyGate;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use agent_gateway_core::{AgentDelta, ControlStrategy, Message};
use agent_gateway_llm::ProviderCatalog;
use agent_gateway_tools::ToolRegistry;

use crate::agent::{AgentDefinition, AgentRequest};

/// Emitted instead of an exception when a run fails.
const APOLOGY_MESSAGE: &str = "The model call failed. Please try again later.";

/// Entry point for agent runs.
pub struct Orchestrator {
    services: Arc<OrchestratorServices>,
}

impl Orchestrator {
    pub fn new(catalog: Arc<ProviderCatalog>) -> Self {
        Self {
            services: Arc::new(OrchestratorServices::new(catalog)),
        }
    }

    pub fn with_services(services: Arc<OrchestratorServices>) -> Self {
        Self { services }
    }

    /// Start one run and return its delta stream. The run proceeds on its
    /// own task; dropping the receiver cancels further emission without
    /// aborting in-flight upstream work.
    pub fn run_stream(
        &self,
        definition: Arc<AgentDefinition>,
        request: AgentRequest,
        history: Vec<Message>,
        tools: Arc<ToolRegistry>,
    ) -> mpsc::Receiver<AgentDelta> {
        let (tx, rx) = mpsc::channel(64);
        let services = Arc::clone(&self.services);

        tokio::spawn(async move {
            let sink = DeltaSink::new(tx);
            let run_id = request.run_id.clone();
            let agent_id = definition.id.clone();
            info!(run_id = %run_id, agent = %agent_id, "run started");

            let enabled = tools.select(&definition.tools);
            let control = definition.run_spec.control;
            let mut context = ExecutionContext::new(definition, request, history);

            let result = match control {
                ControlStrategy::Oneshot => {
                    strategies::run_oneshot(&services, &mut context, &sink).await
                }
                ControlStrategy::ToolOneshot => {
                    strategies::run_tool_oneshot(&services, &mut context, &enabled, &sink).await
                }
                ControlStrategy::ReactLoop { max_steps } => {
                    strategies::run_react_loop(&services, &mut context, &enabled, max_steps, &sink)
                        .await
                }
                ControlStrategy::PlanExecute { max_steps } => {
                    strategies::run_plan_execute(
                        &services,
                        &mut context,
                        &enabled,
                        max_steps,
                        &sink,
                    )
                    .await
                }
            };

            match result {
                Ok(()) => {
                    info!(
                        run_id = %run_id,
                        agent = %agent_id,
                        model_calls = context.model_calls(),
                        tool_calls = context.tool_calls(),
                        "run completed"
                    );
                }
                Err(e) => {
                    warn!(run_id = %run_id, agent = %agent_id, error = %e, "orchestration failed");
                    sink.emit(AgentDelta::content(APOLOGY_MESSAGE)).await;
                }
            }
            sink.emit(AgentDelta::finish("stop")).await;
        });

        rx
    }
}
