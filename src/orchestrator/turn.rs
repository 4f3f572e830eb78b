//! Model Turn Runner
//!
//! Issues one streaming model call, emits live deltas under the emission
//! policy, and returns the fully accumulated turn. Also owns the shared
//! tool-execution step the strategies call between turns.
//!
//! Emission policy: reasoning and content chunks stream live only until the
//! first tool-call fragment of the turn; after that they are accumulated
//! silently (the consumer is showing tool activity, not stale text).
//! Tool-call chunks stream live whenever enabled and the fragment carries
//! non-empty argument text.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use agent_gateway_core::{AgentDelta, Message, PlannedToolCall, ToolCallChunk, ToolChoice};
use agent_gateway_llm::{CallSpec, ProviderCatalog, ToolSchema};
use agent_gateway_tools::{ToolCoordinator, ToolRegistry};

use crate::agent::RuntimePromptTemplates;
use crate::error::{AppError, AppResult};
use crate::orchestrator::accumulator::ToolCallAccumulator;
use crate::orchestrator::context::{ExecutionContext, HistoryKind};
use crate::orchestrator::sink::DeltaSink;

/// Result of one streamed model call.
#[derive(Debug, Clone, Default)]
pub struct ModelTurn {
    pub final_text: String,
    pub reasoning_text: String,
    pub tool_calls: Vec<PlannedToolCall>,
}

/// Per-turn knobs: tool choice, stage label, and the emission flags.
#[derive(Debug, Clone, Copy)]
pub struct TurnOptions<'a> {
    pub tool_choice: ToolChoice,
    pub stage: &'a str,
    pub parallel_tool_calls: bool,
    pub emit_reasoning: bool,
    pub emit_content: bool,
    pub emit_tool_calls: bool,
}

impl<'a> TurnOptions<'a> {
    pub fn new(tool_choice: ToolChoice, stage: &'a str) -> Self {
        Self {
            tool_choice,
            stage,
            parallel_tool_calls: false,
            emit_reasoning: false,
            emit_content: true,
            emit_tool_calls: true,
        }
    }

    pub fn emit_reasoning(mut self, emit: bool) -> Self {
        self.emit_reasoning = emit;
        self
    }

    pub fn emit_content(mut self, emit: bool) -> Self {
        self.emit_content = emit;
        self
    }

    pub fn emit_tool_calls(mut self, emit: bool) -> Self {
        self.emit_tool_calls = emit;
        self
    }

    pub fn parallel_tool_calls(mut self, parallel: bool) -> Self {
        self.parallel_tool_calls = parallel;
        self
    }
}

/// Shared collaborators for one orchestrated run: the provider catalog,
/// the runtime prompt templates, and the verify gate. Read-only, shared
/// across runs.
pub struct OrchestratorServices {
    pub catalog: Arc<ProviderCatalog>,
    pub prompts: RuntimePromptTemplates,
    pub verify: crate::orchestrator::verify::VerifyGate,
}

impl OrchestratorServices {
    pub fn new(catalog: Arc<ProviderCatalog>) -> Self {
        Self::with_prompts(catalog, RuntimePromptTemplates::defaults())
    }

    pub fn with_prompts(catalog: Arc<ProviderCatalog>, prompts: RuntimePromptTemplates) -> Self {
        let verify =
            crate::orchestrator::verify::VerifyGate::new(Arc::clone(&catalog), prompts.clone());
        Self {
            catalog,
            prompts,
            verify,
        }
    }

    /// Run one streamed model turn over the given phase history.
    ///
    /// Counts the model call (and re-checks the budget) before the call is
    /// issued. Provider/stream errors propagate to the orchestrator
    /// boundary.
    pub async fn run_model_turn(
        &self,
        context: &mut ExecutionContext,
        system_prompt: &str,
        history: HistoryKind,
        extra_user_prompt: Option<String>,
        tools: Vec<ToolSchema>,
        options: TurnOptions<'_>,
        sink: &DeltaSink,
    ) -> AppResult<ModelTurn> {
        context.increment_model_calls()?;

        let definition = Arc::clone(&context.definition);
        let mut spec = CallSpec::new(
            definition.provider_key.as_str(),
            definition.model.as_str(),
            system_prompt,
            context.messages(history).clone(),
        )
        .with_tools(tools, options.tool_choice)
        .with_stage(options.stage);
        spec.extra_user_prompt = extra_user_prompt;
        spec.compute_effort = definition.run_spec.compute;
        spec.reasoning_enabled = definition.reasoning_enabled;
        spec.parallel_tool_calls = options.parallel_tool_calls;

        let client = self.catalog.get(&definition.provider_key)?;
        let (stream_tx, mut stream_rx) = mpsc::channel(100);
        let stream_handle = tokio::spawn(async move { client.stream_deltas(spec, stream_tx).await });

        let mut reasoning = String::new();
        let mut content = String::new();
        let mut accumulator = ToolCallAccumulator::new();
        let mut tool_call_observed = false;

        while let Some(delta) = stream_rx.recv().await {
            if !delta.tool_calls.is_empty() {
                tool_call_observed = true;
            }

            if let Some(chunk) = delta.reasoning.as_deref().filter(|s| !s.is_empty()) {
                reasoning.push_str(chunk);
                if options.emit_reasoning && !tool_call_observed {
                    sink.emit(AgentDelta::reasoning(chunk)).await;
                }
            }

            if let Some(chunk) = delta.content.as_deref().filter(|s| !s.is_empty()) {
                content.push_str(chunk);
                if options.emit_content && !tool_call_observed {
                    sink.emit(AgentDelta::content(chunk)).await;
                }
            }

            let mut streamed_calls = Vec::new();
            for (position, fragment) in delta.tool_calls.iter().enumerate() {
                let resolved = accumulator.absorb(fragment, position);
                if options.emit_tool_calls && !fragment.arguments.is_empty() {
                    streamed_calls.push(ToolCallChunk {
                        id: resolved.call_id,
                        call_type: resolved.call_type,
                        name: resolved.name,
                        arguments: fragment.arguments.clone(),
                    });
                }
            }
            if !streamed_calls.is_empty() {
                sink.emit(AgentDelta::tool_calls(streamed_calls)).await;
            }
        }

        stream_handle
            .await
            .map_err(|e| AppError::internal(format!("model stream task failed: {}", e)))??;

        let turn = ModelTurn {
            final_text: content,
            reasoning_text: reasoning,
            tool_calls: accumulator.finish(),
        };
        debug!(
            stage = options.stage,
            tool_calls = turn.tool_calls.len(),
            content_len = turn.final_text.len(),
            "model turn complete"
        );
        Ok(turn)
    }

    /// Execute a batch of planned tool calls, count them against the
    /// budget, stream the results, and append the standard message pair to
    /// the conversation and execute histories.
    pub async fn execute_tools_and_emit(
        &self,
        context: &mut ExecutionContext,
        enabled: &ToolRegistry,
        planned: &[PlannedToolCall],
        sink: &DeltaSink,
    ) -> AppResult<()> {
        let run_id = context.request.run_id.clone();
        let batch =
            ToolCoordinator::execute_tool_calls(planned, enabled, &mut context.tool_records, &run_id)
                .await;
        context.increment_tool_calls(batch.events.len() as u32)?;

        for delta in batch.deltas {
            sink.emit(delta).await;
        }
        for event in &batch.events {
            for kind in [HistoryKind::Conversation, HistoryKind::Execute] {
                let messages = context.messages_mut(kind);
                messages.push(Message::assistant_tool_call(
                    event.call_id.as_str(),
                    event.tool_type.as_str(),
                    event.tool_name.as_str(),
                    event.args_json.as_str(),
                ));
                messages.push(Message::tool_response(
                    event.call_id.as_str(),
                    event.tool_name.as_str(),
                    event.result_text.as_str(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentDefinition, AgentPromptSet, AgentRequest};
    use agent_gateway_core::{
        Budget, ControlStrategy, RunSpec, ToolPolicy, VerifyPolicy,
    };
    use agent_gateway_llm::{LlmResult, ModelClient, ModelDelta, ToolCallFragment};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted model client: each call pops the next list of deltas.
    struct ScriptedClient {
        script: Mutex<Vec<Vec<ModelDelta>>>,
    }

    impl ScriptedClient {
        fn new(script: Vec<Vec<ModelDelta>>) -> Self {
            Self {
                script: Mutex::new(script),
            }
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedClient {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn stream_deltas(
            &self,
            _spec: CallSpec,
            tx: mpsc::Sender<ModelDelta>,
        ) -> LlmResult<()> {
            let deltas = {
                let mut script = self.script.lock().unwrap();
                if script.is_empty() {
                    Vec::new()
                } else {
                    script.remove(0)
                }
            };
            for delta in deltas {
                if tx.send(delta).await.is_err() {
                    break;
                }
            }
            Ok(())
        }
    }

    fn services_with(script: Vec<Vec<ModelDelta>>) -> OrchestratorServices {
        let mut catalog = ProviderCatalog::new();
        catalog.register("default", Arc::new(ScriptedClient::new(script)));
        OrchestratorServices::new(Arc::new(catalog))
    }

    fn test_context() -> ExecutionContext {
        let definition = Arc::new(AgentDefinition {
            id: "test".to_string(),
            description: String::new(),
            provider_key: "default".to_string(),
            model: "test-model".to_string(),
            prompts: AgentPromptSet::new("sys"),
            run_spec: RunSpec::new(
                ControlStrategy::Oneshot,
                ToolPolicy::Allow,
                VerifyPolicy::None,
                Budget::DEFAULT,
            ),
            tools: vec![],
            reasoning_enabled: false,
        });
        ExecutionContext::new(definition, AgentRequest::new("hi"), vec![])
    }

    fn tool_fragment(id: Option<&str>, name: Option<&str>, arguments: &str) -> ToolCallFragment {
        ToolCallFragment {
            id: id.map(String::from),
            index: Some(0),
            call_type: Some("function".to_string()),
            name: name.map(String::from),
            arguments: arguments.to_string(),
        }
    }

    #[tokio::test]
    async fn test_emission_gated_after_first_tool_fragment() {
        let services = services_with(vec![vec![
            ModelDelta::content("thinking "),
            ModelDelta::tool_fragments(vec![tool_fragment(Some("c1"), Some("bash"), "{}")]),
            ModelDelta::content("more"),
        ]]);
        let mut context = test_context();
        let (tx, mut rx) = mpsc::channel(16);
        let sink = DeltaSink::new(tx);

        let turn = services
            .run_model_turn(
                &mut context,
                "sys",
                HistoryKind::Conversation,
                None,
                vec![],
                TurnOptions::new(ToolChoice::Auto, "test"),
                &sink,
            )
            .await
            .unwrap();

        // "more" is accumulated but not emitted live.
        assert_eq!(turn.final_text, "thinking more");
        drop(sink);

        let mut emitted = Vec::new();
        while let Some(delta) = rx.recv().await {
            emitted.push(delta);
        }
        let content_deltas: Vec<_> = emitted
            .iter()
            .filter(|d| matches!(d, AgentDelta::Content { .. }))
            .collect();
        assert_eq!(content_deltas.len(), 1);
        assert_eq!(*content_deltas[0], AgentDelta::content("thinking "));
        // The tool-call chunk streamed live.
        assert!(emitted
            .iter()
            .any(|d| matches!(d, AgentDelta::ToolCalls { .. })));
    }

    #[tokio::test]
    async fn test_turn_increments_model_calls() {
        let services = services_with(vec![vec![ModelDelta::content("ok")]]);
        let mut context = test_context();
        let (tx, _rx) = mpsc::channel(16);
        let sink = DeltaSink::new(tx);

        services
            .run_model_turn(
                &mut context,
                "sys",
                HistoryKind::Conversation,
                None,
                vec![],
                TurnOptions::new(ToolChoice::None, "test"),
                &sink,
            )
            .await
            .unwrap();
        assert_eq!(context.model_calls(), 1);
    }

    #[tokio::test]
    async fn test_tool_chunks_without_arguments_not_emitted() {
        let services = services_with(vec![vec![
            // Name-only fragment (no argument text): accumulated, not streamed.
            ModelDelta::tool_fragments(vec![tool_fragment(Some("c1"), Some("bash"), "")]),
            ModelDelta::tool_fragments(vec![tool_fragment(None, None, "{\"command\":\"ls\"}")]),
        ]]);
        let mut context = test_context();
        let (tx, mut rx) = mpsc::channel(16);
        let sink = DeltaSink::new(tx);

        let turn = services
            .run_model_turn(
                &mut context,
                "sys",
                HistoryKind::Conversation,
                None,
                vec![],
                TurnOptions::new(ToolChoice::Auto, "test"),
                &sink,
            )
            .await
            .unwrap();
        drop(sink);

        assert_eq!(turn.tool_calls.len(), 1);
        assert_eq!(turn.tool_calls[0].call_id, "c1");

        let mut chunk_events = 0;
        while let Some(delta) = rx.recv().await {
            if let AgentDelta::ToolCalls { calls } = delta {
                chunk_events += 1;
                assert_eq!(calls[0].id, "c1");
                assert_eq!(calls[0].name, "bash");
            }
        }
        assert_eq!(chunk_events, 1);
    }
}
