//! Function-call tools.
//!
//! The backend invokes tools by name through
//! `response.function_call_arguments.done`; the session controller looks the
//! name up in a [`ToolRegistry`] and returns the [`ToolOutcome`] as a
//! `function_call_output` item.

mod registry;
mod search;

pub use registry::{ToolHandler, ToolOutcome, ToolRegistry};
pub use search::{SEARCH_HOSPITAL, SearchHospitalTool};

use std::sync::Arc;
use url::Url;

use crate::core::realtime::RealtimeResult;

/// Registry holding the built-in tools.
pub fn builtin_registry(http: reqwest::Client, search_url: Url) -> RealtimeResult<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(SearchHospitalTool::new(http, search_url)))?;
    Ok(registry)
}
