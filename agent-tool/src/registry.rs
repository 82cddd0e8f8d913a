//! Name-keyed tool registry: register, has, all, remove.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, ToolError};
use crate::tool::ToolDyn;

/// Holds tools as `Arc<dyn ToolDyn>` keyed by name.
///
/// Registration is rare and single-writer; lookup is read-dominant, so
/// this is a plain `HashMap` guarded by whatever lock the owning agent
/// chooses (the registry itself is not internally synchronized).
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolDyn>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registers a tool. Fails if a tool with the same name already exists.
    pub fn register(&mut self, tool: Arc<dyn ToolDyn>) -> Result<()> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::DuplicateRegistration(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolDyn>> {
        self.tools.get(name)
    }

    /// All registered tools, in unspecified order.
    pub fn all(&self) -> Vec<Arc<dyn ToolDyn>> {
        self.tools.values().cloned().collect()
    }

    /// Removes a tool by name, returning it if present.
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn ToolDyn>> {
        self.tools.remove(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
