//! Tool-Oneshot Strategy
//!
//! One tool round: a first turn that may (or, under REQUIRE, must) call
//! tools, a single repair retry when the requirement was violated, tool
//! execution, and one closing turn with tools disabled. A requirement still
//! unmet after the repair is a logged soft violation, not a failure.

use tracing::warn;

use agent_gateway_core::ToolChoice;
use agent_gateway_tools::ToolRegistry;

use crate::error::AppResult;
use crate::orchestrator::context::{ExecutionContext, HistoryKind};
use crate::orchestrator::sink::DeltaSink;
use crate::orchestrator::turn::{OrchestratorServices, TurnOptions};

pub async fn run_tool_oneshot(
    services: &OrchestratorServices,
    context: &mut ExecutionContext,
    enabled: &ToolRegistry,
    sink: &DeltaSink,
) -> AppResult<()> {
    let definition = context.definition.clone();
    let emit_reasoning = definition.reasoning_enabled;
    let system_prompt = definition.prompts.primary();
    let schemas = enabled.function_schemas();

    let tool_choice = if context.requires_tool() {
        ToolChoice::Required
    } else {
        ToolChoice::Auto
    };
    let mut first_turn = services
        .run_model_turn(
            context,
            system_prompt,
            HistoryKind::Conversation,
            None,
            schemas.clone(),
            TurnOptions::new(tool_choice, "agent-tooling-first").emit_reasoning(emit_reasoning),
            sink,
        )
        .await?;

    // The repair loop: at most one corrective retry per call site.
    if first_turn.tool_calls.is_empty() && context.requires_tool() {
        let nudge = services.prompts.tool_required_retry.clone();
        context
            .messages_mut(HistoryKind::Conversation)
            .push(agent_gateway_core::Message::user(nudge));
        first_turn = services
            .run_model_turn(
                context,
                system_prompt,
                HistoryKind::Conversation,
                None,
                schemas,
                TurnOptions::new(ToolChoice::Required, "agent-tooling-first-repair")
                    .emit_reasoning(emit_reasoning),
                sink,
            )
            .await?;
    }

    if first_turn.tool_calls.is_empty() {
        if context.requires_tool() {
            warn!(
                agent = %definition.id,
                "tool policy REQUIRE violated in tool-oneshot: no tool call produced"
            );
        }
        let final_text = first_turn.final_text.trim().to_string();
        context.append_assistant_message(HistoryKind::Conversation, &final_text);
        return services
            .verify
            .emit_final_answer(
                &definition,
                context.messages(HistoryKind::Conversation),
                &final_text,
                true,
                sink,
            )
            .await;
    }

    services
        .execute_tools_and_emit(context, enabled, &first_turn.tool_calls, sink)
        .await?;

    let second_pass = services
        .verify
        .requires_second_pass(definition.run_spec.verify);
    let final_prompt = services.prompts.tool_final.clone();
    let second_turn = services
        .run_model_turn(
            context,
            system_prompt,
            HistoryKind::Conversation,
            Some(final_prompt),
            vec![],
            TurnOptions::new(ToolChoice::None, "agent-tooling-final")
                .emit_reasoning(emit_reasoning)
                .emit_content(!second_pass),
            sink,
        )
        .await?;

    let final_text = second_turn.final_text.trim().to_string();
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
