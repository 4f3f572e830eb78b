//! Execution Context
//!
//! Per-run mutable state: the three phase message histories, accumulated
//! tool records, the monotonic model/tool call counters, and the budget
//! clock. Exclusively owned by one run's control strategy; no locking.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Instant;

use agent_gateway_core::{Budget, Message, PlanTask, ToolRecord};

use crate::agent::{AgentDefinition, AgentRequest};
use crate::error::{AppError, AppResult};

/// Which phase history a turn reads from and appends to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    Conversation,
    Plan,
    Execute,
}

/// Per-run mutable state.
pub struct ExecutionContext {
    pub definition: Arc<AgentDefinition>,
    pub request: AgentRequest,
    budget: Budget,
    started_at: Instant,

    conversation_messages: Vec<Message>,
    plan_messages: Vec<Message>,
    execute_messages: Vec<Message>,
    pub tool_records: Vec<ToolRecord>,
    pub plan_tasks: Vec<PlanTask>,
    plan_id: Option<String>,

    model_calls: u32,
    tool_calls: u32,
}

impl ExecutionContext {
    /// Create a fresh context. Each phase history is seeded with the prior
    /// conversation history plus the new user message.
    pub fn new(
        definition: Arc<AgentDefinition>,
        request: AgentRequest,
        history: Vec<Message>,
    ) -> Self {
        let seed = |history: &[Message], message: &str| {
            let mut messages = history.to_vec();
            messages.push(Message::user(message));
            messages
        };
        let budget = definition.run_spec.budget.normalized();

        Self {
            conversation_messages: seed(&history, &request.message),
            plan_messages: seed(&history, &request.message),
            execute_messages: seed(&history, &request.message),
            tool_records: Vec::new(),
            plan_tasks: Vec::new(),
            plan_id: None,
            budget,
            started_at: Instant::now(),
            model_calls: 0,
            tool_calls: 0,
            definition,
            request,
        }
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    pub fn model_calls(&self) -> u32 {
        self.model_calls
    }

    pub fn tool_calls(&self) -> u32 {
        self.tool_calls
    }

    pub fn messages(&self, kind: HistoryKind) -> &Vec<Message> {
        match kind {
            HistoryKind::Conversation => &self.conversation_messages,
            HistoryKind::Plan => &self.plan_messages,
            HistoryKind::Execute => &self.execute_messages,
        }
    }

    pub fn messages_mut(&mut self, kind: HistoryKind) -> &mut Vec<Message> {
        match kind {
            HistoryKind::Conversation => &mut self.conversation_messages,
            HistoryKind::Plan => &mut self.plan_messages,
            HistoryKind::Execute => &mut self.execute_messages,
        }
    }

    /// Append a non-blank assistant message to the given history.
    pub fn append_assistant_message(&mut self, kind: HistoryKind, text: &str) {
        let normalized = text.trim();
        if !normalized.is_empty() {
            self.messages_mut(kind).push(Message::assistant(normalized));
        }
    }

    /// Count one model call and re-check the budget.
    pub fn increment_model_calls(&mut self) -> AppResult<()> {
        self.model_calls += 1;
        self.check_budget()
    }

    /// Count `n` tool calls and re-check the budget.
    pub fn increment_tool_calls(&mut self, n: u32) -> AppResult<()> {
        self.tool_calls += n;
        self.check_budget()
    }

    /// Budget check, run after every counter increment. The wall clock is
    /// only inspected here, between discrete calls; a single long call can
    /// overshoot the deadline until the next increment catches it.
    pub fn check_budget(&self) -> AppResult<()> {
        if self.model_calls > self.budget.model.max_calls {
            return Err(AppError::budget_exceeded(format!(
                "max model calls {}",
                self.budget.model.max_calls
            )));
        }
        if self.tool_calls > self.budget.tool.max_calls {
            return Err(AppError::budget_exceeded(format!(
                "max tool calls {}",
                self.budget.tool.max_calls
            )));
        }
        if self.started_at.elapsed().as_millis() as u64 >= self.budget.timeout_ms {
            return Err(AppError::budget_exceeded(format!(
                "timeout {}ms",
                self.budget.timeout_ms
            )));
        }
        Ok(())
    }

    /// Whether this run's tool policy demands at least one tool call.
    pub fn requires_tool(&self) -> bool {
        self.definition.run_spec.requires_tool()
    }

    /// Stable plan id for this run, derived from the chat id when present
    /// so replans within one chat keep the same id.
    pub fn plan_id(&mut self) -> String {
        if let Some(id) = &self.plan_id {
            return id.clone();
        }
        let id = match self.request.chat_id.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(chat_id) => {
                let mut hasher = DefaultHasher::new();
                chat_id.trim().hash(&mut hasher);
                format!("plan_{:012x}", hasher.finish() & 0xffff_ffff_ffff)
            }
            None => {
                let normalized: String = self
                    .request
                    .run_id
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect();
                if normalized.is_empty() {
                    "plan_default".to_string()
                } else {
                    format!("plan_{}", &normalized[..normalized.len().min(12)])
                }
            }
        };
        self.plan_id = Some(id.clone());
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_gateway_core::{ControlStrategy, RunSpec, ScopeBudget, ToolPolicy, VerifyPolicy};

    fn test_definition(budget: Budget) -> Arc<AgentDefinition> {
        Arc::new(AgentDefinition {
            id: "test".to_string(),
            description: String::new(),
            provider_key: "default".to_string(),
            model: "test-model".to_string(),
            prompts: crate::agent::AgentPromptSet::new("sys"),
            run_spec: RunSpec::new(
                ControlStrategy::Oneshot,
                ToolPolicy::Allow,
                VerifyPolicy::None,
                budget,
            ),
            tools: vec![],
            reasoning_enabled: false,
        })
    }

    fn small_budget() -> Budget {
        Budget {
            timeout_ms: 60_000,
            model: ScopeBudget::new(2, 10_000, 0),
            tool: ScopeBudget::new(1, 10_000, 0),
        }
    }

    #[test]
    fn test_histories_seeded_with_user_message() {
        let ctx = ExecutionContext::new(
            test_definition(Budget::DEFAULT),
            AgentRequest::new("hello"),
            vec![Message::assistant("earlier")],
        );
        for kind in [HistoryKind::Conversation, HistoryKind::Plan, HistoryKind::Execute] {
            let messages = ctx.messages(kind);
            assert_eq!(messages.len(), 2);
            assert_eq!(messages[1].plain_text(), "hello");
        }
    }

    #[test]
    fn test_counters_are_monotonic_and_bounded() {
        let mut ctx = ExecutionContext::new(
            test_definition(small_budget()),
            AgentRequest::new("hi"),
            vec![],
        );
        assert!(ctx.increment_model_calls().is_ok());
        assert!(ctx.increment_model_calls().is_ok());
        let err = ctx.increment_model_calls().unwrap_err();
        assert!(matches!(err, AppError::BudgetExceeded(_)));
        assert_eq!(ctx.model_calls(), 3);

        assert!(ctx.increment_tool_calls(1).is_err()); // model scope already blown
    }

    #[test]
    fn test_tool_budget_enforced() {
        let mut ctx = ExecutionContext::new(
            test_definition(small_budget()),
            AgentRequest::new("hi"),
            vec![],
        );
        assert!(ctx.increment_tool_calls(1).is_ok());
        assert!(ctx.increment_tool_calls(1).is_err());
    }

    #[test]
    fn test_timeout_enforced() {
        let budget = Budget {
            timeout_ms: 1,
            ..small_budget()
        };
        let mut ctx =
            ExecutionContext::new(test_definition(budget), AgentRequest::new("hi"), vec![]);
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(matches!(
            ctx.increment_model_calls().unwrap_err(),
            AppError::BudgetExceeded(msg) if msg.contains("timeout")
        ));
    }

    #[test]
    fn test_append_assistant_skips_blank() {
        let mut ctx = ExecutionContext::new(
            test_definition(Budget::DEFAULT),
            AgentRequest::new("hi"),
            vec![],
        );
        ctx.append_assistant_message(HistoryKind::Conversation, "   ");
        assert_eq!(ctx.messages(HistoryKind::Conversation).len(), 1);
        ctx.append_assistant_message(HistoryKind::Conversation, "done");
        assert_eq!(ctx.messages(HistoryKind::Conversation).len(), 2);
    }

    #[test]
    fn test_plan_id_stable_per_chat() {
        let definition = test_definition(Budget::DEFAULT);
        let mut a = ExecutionContext::new(
            Arc::clone(&definition),
            AgentRequest::new("hi").with_chat_id("chat-1"),
            vec![],
        );
        let mut b = ExecutionContext::new(
            definition,
            AgentRequest::new("again").with_chat_id("chat-1"),
            vec![],
        );
        assert_eq!(a.plan_id(), b.plan_id());
        assert!(a.plan_id().starts_with("plan_"));
    }
}
