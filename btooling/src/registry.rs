//! Tool registry with per-tool source tags.
//!
//! A source tag names the tool server an entry came from; untagged entries
//! are built-ins that every exchange may use. The engine's
//! `load_tools(server_ids)` contract is backed by
//! [`ToolRegistry::definitions_for_sources`].

use std::future::Future;
use std::sync::Arc;

use bcommon::Registry;
use bprovider::ToolDefinition;

use crate::{FunctionTool, Tool, ToolError, ToolExecutionContext};

struct RegisteredTool {
    tool: Arc<dyn Tool>,
    source: Option<String>,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: Registry<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        let name = tool.definition().name;
        self.tools.insert(
            name,
            RegisteredTool {
                tool: Arc::new(tool),
                source: None,
            },
        );
    }

    pub fn register_with_source<T>(&mut self, source: impl Into<String>, tool: T)
    where
        T: Tool + 'static,
    {
        let name = tool.definition().name;
        self.tools.insert(
            name,
            RegisteredTool {
                tool: Arc::new(tool),
                source: Some(source.into()),
            },
        );
    }

    pub fn register_fn<F, Fut>(&mut self, definition: ToolDefinition, handler: F)
    where
        F: Fn(String, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        self.register(FunctionTool::new(definition, handler));
    }

    pub fn register_sync_fn<F>(&mut self, definition: ToolDefinition, handler: F)
    where
        F: Fn(String, ToolExecutionContext) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        self.register_fn(definition, move |args_json, context| {
            let output = handler(args_json, context);
            async move { output }
        });
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(|entry| Arc::clone(&entry.tool))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.remove(name).map(|entry| entry.tool)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|entry| entry.tool.definition())
            .collect()
    }

    /// Definitions visible to an exchange that asked for the given tool
    /// servers. Built-ins (no source tag) are always included; an empty
    /// `server_ids` slice selects built-ins only.
    pub fn definitions_for_sources(&self, server_ids: &[String]) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .filter(|entry| match &entry.source {
                None => true,
                Some(source) => server_ids.contains(source),
            })
            .map(|entry| entry.tool.definition())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(name: &str) -> ToolDefinition {
        ToolDefinition {
            name: name.to_string(),
            description: format!("Tool {name}"),
            input_schema: "{\"type\":\"object\"}".to_string(),
        }
    }

    #[test]
    fn registry_tracks_registered_tools() {
        let mut registry = ToolRegistry::new();
        assert!(registry.is_empty());

        registry.register_sync_fn(definition("echo"), |args, _ctx| Ok(args));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("echo"));
        assert_eq!(registry.definitions().len(), 1);

        let removed = registry.remove("echo");
        assert!(removed.is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn definitions_for_sources_filters_by_server_and_keeps_builtins() {
        let mut registry = ToolRegistry::new();
        registry.register_sync_fn(definition("builtin"), |args, _ctx| Ok(args));
        registry.register_with_source(
            "calc-server",
            FunctionTool::new(definition("add"), |args, _ctx| async move { Ok(args) }),
        );
        registry.register_with_source(
            "web-server",
            FunctionTool::new(definition("fetch"), |args, _ctx| async move { Ok(args) }),
        );

        let builtins_only = registry.definitions_for_sources(&[]);
        assert_eq!(builtins_only.len(), 1);
        assert_eq!(builtins_only[0].name, "builtin");

        let with_calc = registry.definitions_for_sources(&["calc-server".to_string()]);
        let names: Vec<_> = with_calc.iter().map(|tool| tool.name.as_str()).collect();
        assert_eq!(names, vec!["add", "builtin"]);
    }
}
