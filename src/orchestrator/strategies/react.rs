//! React-Loop Strategy
//!
//! Up to `max_steps` call/execute rounds. A turn that produces tool calls
//! executes them and loops; a turn with usable final text concludes;
//! anything else consumes a step with a corrective nudge. When the steps
//! run out, the force-final turn concludes the run unconditionally.

use agent_gateway_core::{Message, ToolChoice};
use agent_gateway_tools::ToolRegistry;

use crate::error::AppResult;
use crate::orchestrator::context::{ExecutionContext, HistoryKind};
use crate::orchestrator::sink::DeltaSink;
use crate::orchestrator::strategies::force_final_answer;
use crate::orchestrator::turn::{OrchestratorServices, TurnOptions};

pub async fn run_react_loop(
    services: &OrchestratorServices,
    context: &mut ExecutionContext,
    enabled: &ToolRegistry,
    max_steps: u32,
    sink: &DeltaSink,
) -> AppResult<()> {
    let definition = context.definition.clone();
    let system_prompt = definition.prompts.primary();
    let schemas = enabled.function_schemas();

    for step in 1..=max_steps {
        let tool_choice = if context.requires_tool() {
            ToolChoice::Required
        } else {
            ToolChoice::Auto
        };
        let stage = format!("agent-react-step-{}", step);
        let turn = services
            .run_model_turn(
                context,
                system_prompt,
                HistoryKind::Conversation,
                None,
                schemas.clone(),
                TurnOptions::new(tool_choice, &stage),
                sink,
            )
            .await?;

        if !turn.tool_calls.is_empty() {
            services
                .execute_tools_and_emit(context, enabled, &turn.tool_calls, sink)
                .await?;
            continue;
        }

        if context.requires_tool() {
            let nudge = services.prompts.tool_required_continue.clone();
            context
                .messages_mut(HistoryKind::Conversation)
                .push(Message::user(nudge));
            continue;
        }

        let final_text = turn.final_text.trim().to_string();
        if final_text.is_empty() {
            let nudge = services.prompts.final_or_tools.clone();
            context
                .messages_mut(HistoryKind::Conversation)
                .push(Message::user(nudge));
            continue;
        }

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

    // Steps exhausted without a conclusion: the terminal fallback.
    let second_pass = services
        .verify
        .requires_second_pass(definition.run_spec.verify);
    let forced = force_final_answer(
        services,
        context,
        system_prompt,
        HistoryKind::Conversation,
        "agent-react-force-final",
        !second_pass,
        sink,
    )
    .await?;
    context.append_assistant_message(HistoryKind::Conversation, &forced);
    services
        .verify
        .emit_final_answer(
            &definition,
            context.messages(HistoryKind::Conversation),
            &forced,
            !second_pass,
            sink,
        )
        .await
}
