//! Tool registry: a named collection of callable tools.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::Tool;
use super::ToolSpec;
use super::ledger::LedgerTool;
use crate::error::{LedgerError, Result};
use crate::service::LedgerService;

/// A collection of registered [`Tool`] implementations, keyed by name.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the ten ledger tools backed by `service`.
    pub fn with_ledger_tools(service: &LedgerService) -> Self {
        let mut registry = Self::new();
        for tool in LedgerTool::all(service) {
            registry.register(tool);
        }
        registry
    }

    /// Register a tool under [`Tool::name`], returning any tool it replaced.
    pub fn register(&mut self, tool: impl Tool + 'static) -> Option<Arc<dyn Tool>> {
        let name = tool.name().to_owned();
        self.tools.insert(name, Arc::new(tool))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Registered tool names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Specs for every registered tool, sorted by name.
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self.tools.values().map(|t| t.spec()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke the tool named `name`. An unregistered name is `NotFound`.
    pub async fn call(&self, name: &str, args: Value) -> Result<Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| LedgerError::not_found(format!("unknown tool: {name}")))?;
        tool.call(args).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.list())
            .finish()
    }
}
