//! Streaming Tool-Call Accumulator
//!
//! Reassembles fragmented tool-call deltas into complete, stably-identified
//! records. Providers stream tool calls as many small chunks and often omit
//! the explicit id after a call's first fragment, referencing the call only
//! by positional index; misattributing a fragment to the wrong call is a
//! correctness bug this type exists to rule out.
//!
//! Identity resolution, per fragment:
//! - a non-blank `id` IS the call's identity (and is bound to the fragment's
//!   index, when present, for later id-less fragments)
//! - otherwise the index is looked up in the index->id binding
//! - an unseen index gets a synthesized `tool_N` id and is registered
//!
//! Argument text arrives as a left-to-right concatenation of a streamed
//! JSON object and is appended verbatim.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use agent_gateway_core::PlannedToolCall;
use agent_gateway_llm::ToolCallFragment;

#[derive(Debug)]
struct Accumulated {
    call_id: String,
    name: Option<String>,
    call_type: Option<String>,
    arguments: String,
}

/// What one absorbed fragment resolved to; used for live chunk emission.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFragment {
    pub call_id: String,
    /// Best-known name at this point in the stream (may still be empty).
    pub name: String,
    /// Best-known type, defaulting to "function".
    pub call_type: String,
}

/// Accumulator for one model turn. Exclusively owned by the turn runner and
/// discarded when the turn ends.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    /// First-seen order of call ids.
    order: Vec<String>,
    by_id: HashMap<String, Accumulated>,
    index_to_id: HashMap<usize, String>,
    synth_counter: u64,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb one fragment. `position` is the fragment's position within
    /// its delta, used as the effective index when the fragment carries
    /// neither id nor index.
    pub fn absorb(&mut self, fragment: &ToolCallFragment, position: usize) -> ResolvedFragment {
        let call_id = self.resolve_id(fragment, position);

        if !self.by_id.contains_key(&call_id) {
            self.order.push(call_id.clone());
        }
        let acc = self.by_id.entry(call_id.clone()).or_insert_with(|| Accumulated {
            call_id: call_id.clone(),
            name: None,
            call_type: None,
            arguments: String::new(),
        });

        if let Some(name) = fragment.name.as_deref().filter(|s| !s.trim().is_empty()) {
            acc.name = Some(name.to_string());
        }
        if let Some(call_type) = fragment
            .call_type
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            acc.call_type = Some(call_type.to_string());
        }
        if !fragment.arguments.is_empty() {
            acc.arguments.push_str(&fragment.arguments);
        }

        ResolvedFragment {
            call_id: acc.call_id.clone(),
            name: acc.name.clone().unwrap_or_default(),
            call_type: acc
                .call_type
                .clone()
                .unwrap_or_else(|| "function".to_string()),
        }
    }

    fn resolve_id(&mut self, fragment: &ToolCallFragment, position: usize) -> String {
        if let Some(id) = fragment.id.as_deref().filter(|s| !s.trim().is_empty()) {
            if let Some(index) = fragment.index {
                self.index_to_id.insert(index, id.to_string());
            }
            return id.to_string();
        }

        let effective_index = fragment.index.unwrap_or(position);
        if let Some(id) = self.index_to_id.get(&effective_index) {
            return id.clone();
        }
        self.synth_counter += 1;
        let generated = format!("tool_{}", self.synth_counter);
        self.index_to_id.insert(effective_index, generated.clone());
        generated
    }

    /// Finish the turn: every accumulator with a non-blank name becomes a
    /// `PlannedToolCall` in first-seen order. Argument text is parsed as a
    /// JSON object best-effort; anything unusable yields an empty map
    /// rather than failing the turn.
    pub fn finish(self) -> Vec<PlannedToolCall> {
        let mut by_id = self.by_id;
        self.order
            .iter()
            .filter_map(|id| by_id.remove(id))
            .filter_map(|acc| {
                let name = acc.name.as_deref().unwrap_or("").trim().to_lowercase();
                if name.is_empty() {
                    return None;
                }
                Some(PlannedToolCall::new(
                    name,
                    parse_argument_map(&acc.arguments),
                    acc.call_id,
                ))
            })
            .collect()
    }
}

fn parse_argument_map(raw: &str) -> BTreeMap<String, Value> {
    if raw.trim().is_empty() {
        return BTreeMap::new();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map.into_iter().collect(),
        _ => BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(
        id: Option<&str>,
        index: Option<usize>,
        name: Option<&str>,
        arguments: &str,
    ) -> ToolCallFragment {
        ToolCallFragment {
            id: id.map(String::from),
            index,
            call_type: None,
            name: name.map(String::from),
            arguments: arguments.to_string(),
        }
    }

    #[test]
    fn test_id_stability_across_id_less_fragments() {
        let mut acc = ToolCallAccumulator::new();
        acc.absorb(&fragment(Some("call_abc"), Some(0), Some("bash"), "{\"comman"), 0);
        // Later fragments reference the call only by index.
        acc.absorb(&fragment(None, Some(0), None, "d\":\"ls\"}"), 0);

        let calls = acc.finish();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].call_id, "call_abc");
        assert_eq!(calls[0].name, "bash");
        assert_eq!(
            calls[0].arguments.get("command"),
            Some(&Value::String("ls".to_string()))
        );
    }

    #[test]
    fn test_argument_concatenation() {
        let mut acc = ToolCallAccumulator::new();
        acc.absorb(&fragment(Some("c1"), Some(0), Some("bash"), "{\"comman"), 0);
        acc.absorb(&fragment(None, Some(0), None, "d\":\"ls\"}"), 0);
        let calls = acc.finish();
        assert_eq!(calls[0].arguments_json(), r#"{"command":"ls"}"#);
    }

    #[test]
    fn test_synthesized_id_for_unseen_index() {
        let mut acc = ToolCallAccumulator::new();
        let resolved = acc.absorb(&fragment(None, Some(0), Some("bash"), "{}"), 0);
        assert_eq!(resolved.call_id, "tool_1");
        // Same index keeps resolving to the synthesized id.
        let resolved = acc.absorb(&fragment(None, Some(0), None, ""), 0);
        assert_eq!(resolved.call_id, "tool_1");
    }

    #[test]
    fn test_two_parallel_calls_by_index() {
        let mut acc = ToolCallAccumulator::new();
        acc.absorb(&fragment(Some("call_a"), Some(0), Some("read"), "{\"path\":"), 0);
        acc.absorb(&fragment(Some("call_b"), Some(1), Some("bash"), "{\"command\":"), 0);
        acc.absorb(&fragment(None, Some(0), None, "\"a.rs\"}"), 0);
        acc.absorb(&fragment(None, Some(1), None, "\"ls\"}"), 0);

        let calls = acc.finish();
        assert_eq!(calls.len(), 2);
        // First-seen order preserved.
        assert_eq!(calls[0].call_id, "call_a");
        assert_eq!(calls[0].arguments.get("path"), Some(&Value::String("a.rs".to_string())));
        assert_eq!(calls[1].call_id, "call_b");
        assert_eq!(calls[1].arguments.get("command"), Some(&Value::String("ls".to_string())));
    }

    #[test]
    fn test_blank_name_dropped_at_finish() {
        let mut acc = ToolCallAccumulator::new();
        acc.absorb(&fragment(Some("c1"), Some(0), None, "{\"x\": 1}"), 0);
        assert!(acc.finish().is_empty());
    }

    #[test]
    fn test_invalid_json_yields_empty_map() {
        let mut acc = ToolCallAccumulator::new();
        acc.absorb(&fragment(Some("c1"), Some(0), Some("bash"), "{\"never finished"), 0);
        let calls = acc.finish();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].arguments.is_empty());
    }

    #[test]
    fn test_name_lowercased() {
        let mut acc = ToolCallAccumulator::new();
        acc.absorb(&fragment(Some("c1"), Some(0), Some("Bash"), "{}"), 0);
        assert_eq!(acc.finish()[0].name, "bash");
    }

    #[test]
    fn test_fragment_without_id_or_index_uses_position() {
        let mut acc = ToolCallAccumulator::new();
        let first = acc.absorb(&fragment(None, None, Some("read"), "{\"p\":"), 0);
        let second = acc.absorb(&fragment(None, None, None, "\"x\"}"), 0);
        assert_eq!(first.call_id, second.call_id);
        let calls = acc.finish();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].arguments.get("p"), Some(&Value::String("x".to_string())));
    }

    #[test]
    fn test_resolved_fragment_reports_merged_name_and_type() {
        let mut acc = ToolCallAccumulator::new();
        let first = acc.absorb(
            &ToolCallFragment {
                id: Some("c1".to_string()),
                index: Some(0),
                call_type: Some("function".to_string()),
                name: Some("bash".to_string()),
                arguments: "{".to_string(),
            },
            0,
        );
        assert_eq!(first.name, "bash");
        assert_eq!(first.call_type, "function");

        // Continuation without name/type reports the merged values.
        let next = acc.absorb(&fragment(None, Some(0), None, "}"), 0);
        assert_eq!(next.name, "bash");
        assert_eq!(next.call_type, "function");
    }
}
