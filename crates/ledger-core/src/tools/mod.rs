//! Tool adapter: ledger operations exposed as named, JSON-argument tools
//! for an agent runtime or any other dynamic caller.

pub mod ledger;
pub mod registry;

pub use ledger::{LedgerTool, ToolOperation};
pub use registry::ToolRegistry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// A single callable tool.
///
/// Object-safe so it can be stored as `Arc<dyn Tool>` in a
/// [`ToolRegistry`].
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema describing the argument object.
    fn parameters(&self) -> Value;

    async fn call(&self, args: Value) -> Result<Value>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_owned(),
            description: self.description().to_owned(),
            parameters: self.parameters(),
        }
    }
}

/// Serializable description of a tool, as advertised to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

// Compile-time assertion: Tool must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn Tool) {}
};
