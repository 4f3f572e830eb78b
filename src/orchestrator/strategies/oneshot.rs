//! Oneshot Strategy
//!
//! Single model turn with tool calling disabled; terminal after one turn.
//! The draft streams live unless a verify pass will rewrite it.

use agent_gateway_core::ToolChoice;

use crate::error::AppResult;
use crate::orchestrator::context::{ExecutionContext, HistoryKind};
use crate::orchestrator::sink::DeltaSink;
use crate::orchestrator::turn::{OrchestratorServices, TurnOptions};

pub async fn run_oneshot(
    services: &OrchestratorServices,
    context: &mut ExecutionContext,
    sink: &DeltaSink,
) -> AppResult<()> {
    let definition = context.definition.clone();
    let emit_reasoning = definition.reasoning_enabled;
    let second_pass = services
        .verify
        .requires_second_pass(definition.run_spec.verify);

    let turn = services
        .run_model_turn(
            context,
            definition.prompts.primary(),
            HistoryKind::Conversation,
            None,
            vec![],
            TurnOptions::new(ToolChoice::None, "agent-oneshot")
                .emit_reasoning(emit_reasoning)
                .emit_content(!second_pass),
            sink,
        )
        .await?;

    let final_text = turn.final_text.trim().to_string();
    context.append_assistant_message(HistoryKind::Conversation, &final_text);
    services
        .verify
        .emit_final_answer(
            &definition,
            context.messages(HistoryKind::Conversation),
            &final_text,
            !second_pass,
            sink,
        )
        .await
}
