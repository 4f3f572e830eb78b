//! Tool Registry
//!
//! Insertion-ordered name -> tool registry. Ordering matters: tool schemas
//! are advertised to the model in registration order, and reordering them
//! between calls confuses caching gateways.

use std::collections::HashMap;
use std::sync::Arc;

use agent_gateway_llm::ToolSchema;

use crate::tool::Tool;

/// Registry of available tools.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Insertion order for deterministic iteration.
    order: Vec<String>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_lowercase();
        if !self.tools.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.tools.insert(name, tool);
    }

    /// Look up a tool by (case-insensitive) name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(&name.to_lowercase()).cloned()
    }

    /// All tool names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Restrict to the given names (registration order preserved). An empty
    /// selection list means "all tools".
    pub fn select(&self, configured: &[String]) -> Self {
        if configured.is_empty() {
            return Self {
                tools: self.tools.clone(),
                order: self.order.clone(),
            };
        }
        let mut selected = Self::new();
        for raw in configured {
            let name = raw.trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            if let Some(tool) = self.tools.get(&name) {
                selected.register(Arc::clone(tool));
            }
        }
        selected
    }

    /// Schemas for every registered tool, in registration order.
    pub fn function_schemas(&self) -> Vec<ToolSchema> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| ToolSchema {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
