//! Plan Parsing
//!
//! Turns a planning turn's free-form output into an ordered step list.
//! Three tiers: a JSON object with a `steps` array, then line-prefixed
//! bullet/numbered/Chinese-enumerated lines, then nothing (the caller
//! synthesizes a single default step). Malformed model output is never
//! fatal here.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// One planned step.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanStep {
    pub id: String,
    pub title: String,
    pub goal: String,
    pub success_criteria: String,
}

fn step_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[-*•]|\d+[.)]|步骤\s*\d+[:：.)]?|[一二三四五六七八九十]+[、.)])\s*(.+)$")
            .unwrap_or_else(|e| panic!("invalid step prefix regex: {}", e))
    })
}

/// Parse plan steps from raw model output. Returns an empty list when
/// neither the JSON form nor the line form yields anything.
pub fn parse_plan_steps(raw: &str) -> Vec<PlanStep> {
    if let Some(steps) = parse_json_steps(raw) {
        if !steps.is_empty() {
            return steps;
        }
    }
    parse_line_steps(raw)
}

/// Default single step used when parsing produced nothing.
pub fn default_step(user_message: &str) -> PlanStep {
    PlanStep {
        id: "step-1".to_string(),
        title: "Execute the task".to_string(),
        goal: user_message.to_string(),
        success_criteria: "Produce a usable result".to_string(),
    }
}

fn parse_json_steps(raw: &str) -> Option<Vec<PlanStep>> {
    let root = read_json(raw)?;
    let steps = root.get("steps")?.as_array()?;

    let mut parsed = Vec::new();
    for (i, node) in steps.iter().enumerate() {
        let index = i + 1;
        let text = |key: &str, fallback: String| -> String {
            node.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .unwrap_or(fallback)
        };
        let title = text("title", format!("Step {}", index));
        let goal = text("goal", title.clone());
        parsed.push(PlanStep {
            id: text("id", format!("step-{}", index)),
            success_criteria: text("successCriteria", "Complete the step".to_string()),
            title,
            goal,
        });
    }
    Some(parsed)
}

fn parse_line_steps(raw: &str) -> Vec<PlanStep> {
    let mut steps = Vec::new();
    let mut index = 0;
    for line in raw.replace("\r\n", "\n").split('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some(captures) = step_prefix_regex().captures(trimmed) else {
            continue;
        };
        let content = captures
            .get(1)
            .map(|m| m.as_str().trim())
            .unwrap_or_default();
        if content.is_empty() {
            continue;
        }
        index += 1;
        steps.push(PlanStep {
            id: format!("step-{}", index),
            title: content.to_string(),
            goal: content.to_string(),
            success_criteria: format!("Complete: {}", content),
        });
    }
    steps
}

/// Best-effort JSON extraction: strips code fences and falls back to the
/// outermost brace span when the text around the object is noise.
fn read_json(raw: &str) -> Option<Value> {
    let mut normalized = raw.trim();
    if normalized.starts_with("```") && normalized.ends_with("```") && normalized.len() >= 6 {
        normalized = normalized[3..normalized.len() - 3].trim();
        normalized = normalized.strip_prefix("json").unwrap_or(normalized).trim();
    }
    if let Ok(value) = serde_json::from_str::<Value>(normalized) {
        if value.is_object() {
            return Some(value);
        }
        return None;
    }
    let start = normalized.find('{')?;
    let end = normalized.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&normalized[start..=end])
        .ok()
        .filter(Value::is_object)
}
