//! Plan-Execute Strategy
//!
//! Three phases over two histories: a planning turn (no tools) parsed into
//! an ordered step list, a per-step execution loop on the execute history
//! (tool turn with one corrective retry, tool execution, short summary
//! turn), and a forced final turn over the combined step results. A plan
//! that cannot be parsed degrades to a single default step built from the
//! raw user request.

use serde_json::Value;

use agent_gateway_core::{AgentDelta, Message, PlanTask, ToolChoice, ToolRecord};
use agent_gateway_tools::ToolRegistry;

use crate::agent::RuntimePromptTemplates;
use crate::error::AppResult;
use crate::orchestrator::context::{ExecutionContext, HistoryKind};
use crate::orchestrator::plan::{default_step, parse_plan_steps, PlanStep};
use crate::orchestrator::sink::DeltaSink;
use crate::orchestrator::strategies::force_final_answer;
use crate::orchestrator::turn::{OrchestratorServices, TurnOptions};

pub async fn run_plan_execute(
    services: &OrchestratorServices,
    context: &mut ExecutionContext,
    enabled: &ToolRegistry,
    max_steps: u32,
    sink: &DeltaSink,
) -> AppResult<()> {
    let definition = context.definition.clone();
    let prompts = &definition.prompts;
    let schemas = enabled.function_schemas();

    // Phase 1: planning turn, tools disabled.
    let plan_instruction = services.prompts.plan_generate.clone();
    let plan_turn = services
        .run_model_turn(
            context,
            prompts.plan_prompt(),
            HistoryKind::Plan,
            Some(plan_instruction),
            vec![],
            TurnOptions::new(ToolChoice::None, "agent-plan-generate"),
            sink,
        )
        .await?;

    let mut steps = parse_plan_steps(&plan_turn.final_text);
    if steps.is_empty() {
        steps = vec![default_step(&context.request.message)];
    }

    context.plan_tasks = steps
        .iter()
        .map(|step| PlanTask {
            task_id: step.id.clone(),
            description: step.title.clone(),
            status: "init".to_string(),
        })
        .collect();
    let plan_id = context.plan_id();
    sink.emit(AgentDelta::plan_update(
        plan_id.clone(),
        context.plan_tasks.clone(),
    ))
    .await;

    // Phase 2: per-step execution on the execute history.
    let total = steps.len();
    for (index, step) in steps.iter().enumerate() {
        let step_no = (index + 1) as u32;
        if step_no > max_steps {
            break;
        }
        execute_step(
            services, context, enabled, &schemas, step, step_no, total, sink,
        )
        .await?;

        if let Some(task) = context.plan_tasks.get_mut(index) {
            task.status = "completed".to_string();
        }
        sink.emit(AgentDelta::plan_update(
            plan_id.clone(),
            context.plan_tasks.clone(),
        ))
        .await;
    }

    // Phase 3: forced final over everything the steps produced.
    let done_instruction = services.prompts.all_steps_done.clone();
    context
        .messages_mut(HistoryKind::Execute)
        .push(Message::user(done_instruction));

    let second_pass = services
        .verify
        .requires_second_pass(definition.run_spec.verify);
    let final_text = force_final_answer(
        services,
        context,
        prompts.summary_prompt(),
        HistoryKind::Execute,
        "agent-plan-final",
        !second_pass,
        sink,
    )
    .await?;
    context.append_assistant_message(HistoryKind::Execute, &final_text);
    services
        .verify
        .emit_final_answer(
            &definition,
            context.messages(HistoryKind::Execute),
            &final_text,
            !second_pass,
            sink,
        )
        .await
}

#[allow(clippy::too_many_arguments)]
async fn execute_step(
    services: &OrchestratorServices,
    context: &mut ExecutionContext,
    enabled: &ToolRegistry,
    schemas: &[agent_gateway_llm::ToolSchema],
    step: &PlanStep,
    step_no: u32,
    total: usize,
    sink: &DeltaSink,
) -> AppResult<()> {
    let execute_prompt = context.definition.prompts.execute_prompt().to_string();

    let framing = RuntimePromptTemplates::render(
        &services.prompts.step_framing,
        &[
            ("step_no", &step_no.to_string()),
            ("total", &total.to_string()),
            ("title", &step.title),
            ("goal", &step.goal),
            ("success", &step.success_criteria),
        ],
    );
    context
        .messages_mut(HistoryKind::Execute)
        .push(Message::user(framing));

    let tool_choice = if context.requires_tool() {
        ToolChoice::Required
    } else {
        ToolChoice::Auto
    };
    let stage = format!("agent-plan-execute-step-{}", step_no);
    let mut step_turn = services
        .run_model_turn(
            context,
            &execute_prompt,
            HistoryKind::Execute,
            None,
            schemas.to_vec(),
            TurnOptions::new(tool_choice, &stage).parallel_tool_calls(true),
            sink,
        )
        .await?;

    // One corrective retry, identical to the tool-oneshot repair.
    if step_turn.tool_calls.is_empty() && context.requires_tool() {
        let nudge = services.prompts.tool_required_retry.clone();
        context
            .messages_mut(HistoryKind::Execute)
            .push(Message::user(nudge));
        let repair_stage = format!("agent-plan-execute-step-{}-repair", step_no);
        step_turn = services
            .run_model_turn(
                context,
                &execute_prompt,
                HistoryKind::Execute,
                None,
                schemas.to_vec(),
                TurnOptions::new(ToolChoice::Required, &repair_stage).parallel_tool_calls(true),
                sink,
            )
            .await?;
    }

    if !step_turn.tool_calls.is_empty() {
        services
            .execute_tools_and_emit(context, enabled, &step_turn.tool_calls, sink)
            .await?;

        let summary_instruction = services.prompts.step_summary.clone();
        let summary_stage = format!("agent-plan-step-summary-{}", step_no);
        let summary_turn = services
            .run_model_turn(
                context,
                &execute_prompt,
                HistoryKind::Execute,
                Some(summary_instruction),
                vec![],
                TurnOptions::new(ToolChoice::None, &summary_stage),
                sink,
            )
            .await?;
        let summary = summary_turn.final_text.trim().to_string();
        context.append_assistant_message(HistoryKind::Execute, &summary);
        if !summary.is_empty() {
            context.tool_records.push(step_record(step, &summary));
        }
    } else {
        let text = step_turn.final_text.trim().to_string();
        if !text.is_empty() {
            context.append_assistant_message(HistoryKind::Execute, &text);
            context.tool_records.push(step_record(step, &text));
        }
    }
    Ok(())
}

fn step_record(step: &PlanStep, summary: &str) -> ToolRecord {
    let mut record = ToolRecord::new();
    record.insert("stepId".to_string(), Value::String(step.id.clone()));
    record.insert("stepTitle".to_string(), Value::String(step.title.clone()));
    record.insert("summary".to_string(), Value::String(summary.to_string()));
    record
}
