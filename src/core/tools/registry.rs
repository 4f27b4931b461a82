//! Tool Registry
//!
//! Maps function names to the local handlers the backend may invoke over the
//! control channel. Each handler declares its own [`ToolDef`], so the tool
//! list sent in `session.update` is derived from what is registered.
//!
//! # Usage
//!
//! ```ignore
//! use waav_voice_client::core::tools::builtin_registry;
//!
//! let registry = builtin_registry(http, search_url)?;
//! registry.validate_declarations(&registry.definitions())?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::realtime::{RealtimeError, RealtimeResult, ToolDef};

/// Result returned to the backend as `function_call_output`.
///
/// Serializes as `{"success": <bool>, ...payload}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub success: bool,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ToolOutcome {
    /// A successful outcome with no payload.
    pub fn success() -> Self {
        Self {
            success: true,
            payload: Map::new(),
        }
    }

    /// A failed outcome carrying an `error` message.
    pub fn failure(message: impl Into<String>) -> Self {
        let mut payload = Map::new();
        payload.insert("error".to_string(), Value::String(message.into()));
        Self {
            success: false,
            payload,
        }
    }

    /// Add a payload field.
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.payload.insert(key.to_string(), value);
        self
    }

    /// Encode as the JSON string carried in `output`.
    pub fn to_output(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A locally implemented function the backend can call.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Declaration sent to the backend.
    fn definition(&self) -> ToolDef;

    /// Run the function. Failures are reported in the outcome, never raised.
    async fn call(&self, arguments: Value) -> ToolOutcome;
}

/// Registry of tool handlers keyed by function name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
    /// Registration order, used for the declared tool list
    order: Vec<String>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.order)
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under the name from its declaration.
    ///
    /// Registering the same name twice is a configuration error.
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) -> RealtimeResult<()> {
        let name = handler.definition().name;
        if name.is_empty() {
            return Err(RealtimeError::InvalidConfiguration(
                "Tool name must not be empty".to_string(),
            ));
        }
        if self.handlers.contains_key(&name) {
            return Err(RealtimeError::InvalidConfiguration(format!(
                "Tool '{}' is already registered",
                name
            )));
        }

        tracing::debug!("Registered tool: {}", name);
        self.order.push(name.clone());
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Look up a handler by function name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Declarations of every registered handler, in registration order.
    pub fn definitions(&self) -> Vec<ToolDef> {
        self.order
            .iter()
            .filter_map(|name| self.handlers.get(name))
            .map(|handler| handler.definition())
            .collect()
    }

    /// Check that every declared tool has a registered handler.
    pub fn validate_declarations(&self, declared: &[ToolDef]) -> RealtimeResult<()> {
        let missing: Vec<&str> = declared
            .iter()
            .map(|tool| tool.name.as_str())
            .filter(|name| !self.handlers.contains_key(*name))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(RealtimeError::InvalidConfiguration(format!(
                "Declared tools without a handler: {}",
                missing.join(", ")
            )))
        }
    }
}
