//! Runtime Prompt Templates
//!
//! The fixed instruction strings the orchestrator injects at runtime:
//! corrective nudges for the tool-required repair loop, the force-final
//! instruction, plan/step framing, and the verify-pass prompts. Templates
//! use `{name}` placeholders rendered with [`RuntimePromptTemplates::render`].

/// Runtime prompt strings, overridable per deployment.
#[derive(Debug, Clone)]
pub struct RuntimePromptTemplates {
    /// Repair nudge when a REQUIRE policy turn produced no tool calls.
    pub tool_required_retry: String,
    /// Repair nudge inside a loop step.
    pub tool_required_continue: String,
    /// Nudge when a turn produced neither tools nor usable text.
    pub final_or_tools: String,
    /// Closing turn after tool execution in the one-round strategies.
    pub tool_final: String,
    /// Force-final instruction: answer now, no tools, no continuation talk.
    pub force_final: String,
    /// Planning-turn instruction requesting structured JSON steps.
    pub plan_generate: String,
    /// Step framing template: `{step_no}`, `{total}`, `{title}`, `{goal}`, `{success}`.
    pub step_framing: String,
    /// Step summary instruction.
    pub step_summary: String,
    /// Instruction appended once all steps ran.
    pub all_steps_done: String,
    /// Appendix to the system prompt for the verify pass.
    pub verify_system: String,
    /// Verify user prompt template: `{candidate}`.
    pub verify_user: String,
}

impl RuntimePromptTemplates {
    pub fn defaults() -> Self {
        Self {
            tool_required_retry: "You must call at least one tool to complete the task. \
                Choose a tool and issue the call."
                .to_string(),
            tool_required_continue: "You must call at least one tool to continue. \
                Issue a tool call directly."
                .to_string(),
            final_or_tools: "Give the final answer based on what you already have, \
                or call a tool to gather more information."
                .to_string(),
            tool_final: "Produce the final answer from the information gathered. \
                Do not call any more tools."
                .to_string(),
            force_final: "Answer now from the current information. Calling tools again is \
                forbidden.\nDo not describe further actions (such as \"let me check first\" \
                or \"I will look at the resources\").\nIf the information is insufficient, \
                structure the answer as:\n1) Confirmed information\n2) Blocking point\n3) Minimal next step"
                .to_string(),
            plan_generate: "Output a structured plan as JSON: an object with a `steps` array \
                where each step has `title`, `goal`, and `successCriteria`."
                .to_string(),
            step_framing: "Current step [{step_no}/{total}]: {title}\nGoal: {goal}\nSuccess criteria: {success}"
                .to_string(),
            step_summary: "Summarize the outcome of the current step.".to_string(),
            all_steps_done: "All steps are complete. Produce the final answer from the \
                combined step results."
                .to_string(),
            verify_system: "Before replying, review the draft answer for factual errors, \
                unsupported claims, and missing pieces of the user's request."
                .to_string(),
            verify_user: "Here is the draft final answer:\n\n{candidate}\n\nCorrect it if \
                needed and output the final answer only, with no commentary about the review."
                .to_string(),
        }
    }

    /// Replace each `{name}` placeholder with its value. Unknown
    /// placeholders are left in place.
    pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
        let mut out = template.to_string();
        for (key, value) in vars {
            out = out.replace(&format!("{{{}}}", key), value);
        }
        out
    }
}

impl Default for RuntimePromptTemplates {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_replaces_placeholders() {
        let out = RuntimePromptTemplates::render(
            "Current step [{step_no}/{total}]: {title}",
            &[("step_no", "2"), ("total", "5"), ("title", "Collect data")],
        );
        assert_eq!(out, "Current step [2/5]: Collect data");
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        let out = RuntimePromptTemplates::render("{known} and {unknown}", &[("known", "x")]);
        assert_eq!(out, "x and {unknown}");
    }

    #[test]
    fn test_defaults_are_nonempty() {
        let prompts = RuntimePromptTemplates::defaults();
        assert!(!prompts.force_final.is_empty());
        assert!(prompts.verify_user.contains("{candidate}"));
        assert!(prompts.step_framing.contains("{step_no}"));
    }
}
