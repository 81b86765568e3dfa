//! Dialect registry for runtime lookup by provider name.
//!
//! ```rust
//! use bprovider::DialectRegistry;
//!
//! let registry = DialectRegistry::new();
//! assert!(registry.is_empty());
//! assert_eq!(registry.len(), 0);
//! ```

use std::sync::Arc;

use bcommon::Registry;

use crate::WireDialect;

#[derive(Default)]
pub struct DialectRegistry {
    dialects: Registry<String, Arc<dyn WireDialect>>,
}

impl DialectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<D>(&mut self, dialect: D)
    where
        D: WireDialect + 'static,
    {
        self.dialects
            .insert(dialect.name().to_string(), Arc::new(dialect));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn WireDialect>> {
        self.dialects.get(name).cloned()
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn WireDialect>> {
        self.dialects.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.dialects.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.dialects.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.dialects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::{ModelInfo, ProviderError, RequestContext, ResponseFragment};

    #[derive(Debug)]
    struct FakeDialect;

    impl WireDialect for FakeDialect {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn chat_path(&self) -> &'static str {
            "chat"
        }

        fn models_path(&self) -> &'static str {
            "models"
        }

        fn build_request(&self, _context: &RequestContext<'_>) -> Result<Value, ProviderError> {
            Ok(Value::Null)
        }

        fn parse_chunk(&self, _raw: &str, _streaming: bool) -> Vec<ResponseFragment> {
            Vec::new()
        }

        fn parse_models(&self, _body: &str) -> Result<Vec<ModelInfo>, ProviderError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn registry_registers_and_returns_dialects_by_name() {
        let mut registry = DialectRegistry::new();
        assert!(registry.is_empty());

        registry.register(FakeDialect);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("fake"));
        assert_eq!(registry.names(), vec!["fake".to_string()]);

        let dialect = registry.get("fake").expect("dialect should exist");
        assert_eq!(dialect.chat_path(), "chat");

        let removed = registry.remove("fake");
        assert!(removed.is_some());
        assert!(registry.is_empty());
    }
}
