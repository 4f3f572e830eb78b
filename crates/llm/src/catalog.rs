//! Provider Catalog
//!
//! Read-only registry mapping provider keys to model clients. Built once at
//! startup and shared across concurrent runs; no run ever mutates it.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::openai::OpenAiCompatClient;
use crate::provider::ModelClient;
use crate::types::{LlmError, LlmResult};

/// One configured provider endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

/// provider_key -> client registry.
pub struct ProviderCatalog {
    clients: HashMap<String, Arc<dyn ModelClient>>,
}

impl ProviderCatalog {
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
        }
    }

    /// Build a catalog of OpenAI-compatible clients from config entries.
    pub fn from_entries(entries: &[ProviderEntry]) -> Self {
        let mut catalog = Self::new();
        for entry in entries {
            catalog.register(
                entry.key.as_str(),
                Arc::new(OpenAiCompatClient::new(
                    entry.base_url.clone(),
                    entry.api_key.clone(),
                )),
            );
        }
        catalog
    }

    /// Register a client under a key. Replaces an existing entry.
    pub fn register(&mut self, key: impl Into<String>, client: Arc<dyn ModelClient>) {
        self.clients.insert(key.into(), client);
    }

    /// Look up a client by provider key.
    pub fn get(&self, key: &str) -> LlmResult<Arc<dyn ModelClient>> {
        self.clients
            .get(key)
            .cloned()
            .ok_or_else(|| LlmError::InvalidRequest {
                message: format!("unknown provider key: {}", key),
            })
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }
}

impl Default for ProviderCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_from_entries() {
        let catalog = ProviderCatalog::from_entries(&[ProviderEntry {
            key: "default".to_string(),
            base_url: Some("http://localhost:8080/v1/chat/completions".to_string()),
            api_key: Some("sk-test".to_string()),
            default_model: None,
        }]);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("default").is_ok());
    }

    #[test]
    fn test_unknown_key_is_invalid_request() {
        let catalog = ProviderCatalog::new();
        assert!(matches!(
            catalog.get("nope"),
            Err(LlmError::InvalidRequest { .. })
        ));
    }
}
