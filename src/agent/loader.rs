//! Agent Definition Loader
//!
//! Loads agent definitions from a directory of `*.json` files into a
//! read-only catalog. Definitions are normalized (budget and strategy
//! defaults applied) at load time so the orchestrator never sees a
//! half-specified spec.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::agent::definition::AgentDefinition;
use crate::error::{AppError, AppResult};

/// Read-only catalog of loaded agents, shared across concurrent runs.
#[derive(Debug, Default)]
pub struct AgentCatalog {
    agents: HashMap<String, Arc<AgentDefinition>>,
}

impl AgentCatalog {
    pub fn get(&self, id: &str) -> Option<Arc<AgentDefinition>> {
        self.agents.get(id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.agents.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Loads `*.json` agent definition files from a directory.
pub struct AgentDefinitionLoader;

impl AgentDefinitionLoader {
    /// Load every `.json` file in `dir`. Files that fail to parse are
    /// skipped with a warning; duplicate agent ids are an error.
    pub fn load_dir(dir: &Path) -> AppResult<AgentCatalog> {
        if !dir.is_dir() {
            return Err(AppError::config(format!(
                "agent definition directory not found: {}",
                dir.display()
            )));
        }

        let mut catalog = AgentCatalog::default();
        let mut entries: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        entries.sort();

        for path in entries {
            let raw = std::fs::read_to_string(&path)?;
            let definition: AgentDefinition = match serde_json::from_str(&raw) {
                Ok(d) => d,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "skipping unparseable agent definition");
                    continue;
                }
            };
            Self::insert(&mut catalog, definition, &path)?;
        }

        info!(count = catalog.len(), dir = %dir.display(), "loaded agent definitions");
        Ok(catalog)
    }

    fn insert(catalog: &mut AgentCatalog, mut definition: AgentDefinition, path: &Path) -> AppResult<()> {
        let id = definition.id.trim().to_string();
        if id.is_empty() {
            return Err(AppError::config(format!(
                "agent definition missing id: {}",
                path.display()
            )));
        }
        if catalog.agents.contains_key(&id) {
            return Err(AppError::config(format!("duplicate agent id: {}", id)));
        }
        if definition.provider_key.trim().is_empty() {
            return Err(AppError::config(format!("agent {} missing provider_key", id)));
        }
        if definition.model.trim().is_empty() {
            return Err(AppError::config(format!("agent {} missing model", id)));
        }
        definition.id = id.clone();
        definition.run_spec = definition.run_spec.normalized();
        catalog.agents.insert(id, Arc::new(definition));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_agent(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    const MINIMAL: &str = r#"{
        "id": "assistant",
        "provider_key": "default",
        "model": "gpt-4o",
        "prompts": { "system": "Be helpful." }
    }"#;

    #[test]
    fn test_load_minimal_definition() {
        let dir = tempfile::tempdir().unwrap();
        write_agent(dir.path(), "assistant.json", MINIMAL);

        let catalog = AgentDefinitionLoader::load_dir(dir.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        let agent = catalog.get("assistant").unwrap();
        assert_eq!(agent.model, "gpt-4o");
        // Defaults applied at load time.
        assert!(agent.run_spec.budget.model.max_calls > 0);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_agent(dir.path(), "a.json", MINIMAL);
        write_agent(dir.path(), "b.json", MINIMAL);

        let err = AgentDefinitionLoader::load_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate agent id"));
    }

    #[test]
    fn test_unparseable_file_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_agent(dir.path(), "bad.json", "{not json");
        write_agent(dir.path(), "good.json", MINIMAL);

        let catalog = AgentDefinitionLoader::load_dir(dir.path()).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_missing_directory_is_config_error() {
        let err = AgentDefinitionLoader::load_dir(Path::new("/nonexistent/agents")).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_missing_provider_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        write_agent(
            dir.path(),
            "a.json",
            r#"{"id": "x", "provider_key": "", "model": "m"}"#,
        );
        let err = AgentDefinitionLoader::load_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("provider_key"));
    }
}
