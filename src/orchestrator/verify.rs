//! Verify Gate
//!
//! Optional second pass over the candidate final answer. When the run's
//! verify policy asks for it, one additional model call reviews the draft
//! and only the second-pass output is streamed; the first draft is never
//! double-emitted. The verify call rides outside the run budget: it is the
//! gate on the answer, not part of the answer's work.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use agent_gateway_core::{AgentDelta, Message, ToolChoice, VerifyPolicy};
use agent_gateway_llm::{CallSpec, ProviderCatalog};

use crate::agent::{AgentDefinition, RuntimePromptTemplates};
use crate::error::{AppError, AppResult};
use crate::orchestrator::sink::DeltaSink;

/// Second-pass verification gate.
pub struct VerifyGate {
    catalog: Arc<ProviderCatalog>,
    prompts: RuntimePromptTemplates,
}

impl VerifyGate {
    pub fn new(catalog: Arc<ProviderCatalog>, prompts: RuntimePromptTemplates) -> Self {
        Self { catalog, prompts }
    }

    pub fn requires_second_pass(&self, policy: VerifyPolicy) -> bool {
        policy == VerifyPolicy::SecondPassFix
    }

    /// Stream the verify pass: the candidate answer is embedded in the
    /// prompt and every content chunk is forwarded live. Returns the
    /// accumulated second-pass text.
    pub async fn stream_second_pass(
        &self,
        definition: &AgentDefinition,
        system_prompt: &str,
        messages: Vec<Message>,
        candidate: &str,
        stage: &str,
        sink: &DeltaSink,
    ) -> AppResult<String> {
        let verify_system = join_prompts(system_prompt, &self.prompts.verify_system);
        let verify_user =
            RuntimePromptTemplates::render(&self.prompts.verify_user, &[("candidate", candidate)]);

        let mut spec = CallSpec::new(
            definition.provider_key.as_str(),
            definition.model.as_str(),
            verify_system,
            messages,
        )
        .with_tools(vec![], ToolChoice::None)
        .with_extra_user_prompt(verify_user)
        .with_stage(stage);
        spec.compute_effort = definition.run_spec.compute;

        let client = self.catalog.get(&definition.provider_key)?;
        let (stream_tx, mut stream_rx) = mpsc::channel(100);
        let handle = tokio::spawn(async move { client.stream_deltas(spec, stream_tx).await });

        let mut output = String::new();
        while let Some(delta) = stream_rx.recv().await {
            if let Some(chunk) = delta.content.as_deref().filter(|s| !s.is_empty()) {
                output.push_str(chunk);
                sink.emit(AgentDelta::content(chunk)).await;
            }
        }
        handle
            .await
            .map_err(|e| AppError::internal(format!("verify stream task failed: {}", e)))??;

        debug!(stage, output_len = output.len(), "verify pass complete");
        Ok(output)
    }

    /// Final-answer emission under the verify policy.
    ///
    /// Without a second pass, the draft is emitted only if it was not
    /// already streamed live. With one, only the second-pass output is
    /// emitted; an empty verify result falls back to the not-yet-emitted
    /// draft.
    pub async fn emit_final_answer(
        &self,
        definition: &AgentDefinition,
        messages: &[Message],
        candidate: &str,
        already_emitted: bool,
        sink: &DeltaSink,
    ) -> AppResult<()> {
        let policy = definition.run_spec.verify;
        let candidate = candidate.trim();

        if !self.requires_second_pass(policy) {
            if !already_emitted && !candidate.is_empty() {
                sink.emit(AgentDelta::content(candidate)).await;
            }
            return Ok(());
        }

        if candidate.is_empty() {
            return Ok(());
        }
        let output = self
            .stream_second_pass(
                definition,
                definition.prompts.primary(),
                messages.to_vec(),
                candidate,
                "agent-verify",
                sink,
            )
            .await?;

        if output.is_empty() && !already_emitted {
            sink.emit(AgentDelta::content(candidate)).await;
        }
        Ok(())
    }
}

fn join_prompts(base: &str, appendix: &str) -> String {
    let base = base.trim();
    let appendix = appendix.trim();
    if base.is_empty() {
        return appendix.to_string();
    }
    if appendix.is_empty() {
        return base.to_string();
    }
    format!("{}\n\n{}", base, appendix)
}
