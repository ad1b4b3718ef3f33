//! Model registry: the fixed table of model keys the relay accepts.
//!
//! Built once at startup from config (or the built-in table) and read-only
//! afterwards. Lookup order is insertion order, which is also the order
//! `/api/models` reports.

use serde::Deserialize;

/// Static record of one selectable model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelDescriptor {
    /// Key sent by clients and forwarded upstream as the `model` field.
    pub key: String,
    /// Human-readable name.
    pub display_name: String,
    /// Maximum generation token budget passed as `max_tokens`.
    pub max_tokens: u32,
}

impl ModelDescriptor {
    pub fn new(key: &str, display_name: &str, max_tokens: u32) -> Self {
        Self {
            key: key.to_string(),
            display_name: display_name.to_string(),
            max_tokens,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
}

impl ModelRegistry {
    /// Build a registry from an explicit list. Later duplicates of a key are
    /// dropped so lookups stay unambiguous.
    pub fn new(models: Vec<ModelDescriptor>) -> Self {
        let mut unique: Vec<ModelDescriptor> = Vec::with_capacity(models.len());
        for m in models {
            if !unique.iter().any(|u| u.key == m.key) {
                unique.push(m);
            }
        }
        Self { models: unique }
    }

    pub fn get(&self, key: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Model keys in registry order.
    pub fn keys(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.key.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(vec![
            ModelDescriptor::new("gpt-4-0", "GPT-4-0", 4096),
            ModelDescriptor::new("gpt-4", "GPT-4", 8192),
            ModelDescriptor::new("gpt-3.5-turbo", "GPT-3.5 Turbo", 4096),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_has_three_models_in_order() {
        let reg = ModelRegistry::default();
        assert_eq!(reg.keys(), vec!["gpt-4-0", "gpt-4", "gpt-3.5-turbo"]);
    }

    #[test]
    fn default_budgets() {
        let reg = ModelRegistry::default();
        assert_eq!(reg.get("gpt-4").map(|m| m.max_tokens), Some(8192));
        assert_eq!(reg.get("gpt-4-0").map(|m| m.max_tokens), Some(4096));
        assert_eq!(reg.get("gpt-3.5-turbo").unwrap().display_name, "GPT-3.5 Turbo");
    }

    #[test]
    fn unknown_key_is_none() {
        let reg = ModelRegistry::default();
        assert!(reg.get("gpt-5").is_none());
        assert!(!reg.contains("GPT-4"));
    }

    #[test]
    fn duplicate_keys_keep_first() {
        let reg = ModelRegistry::new(vec![
            ModelDescriptor::new("local", "Local A", 1024),
            ModelDescriptor::new("local", "Local B", 2048),
        ]);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("local").unwrap().max_tokens, 1024);
    }
}
