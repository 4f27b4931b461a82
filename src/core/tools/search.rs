//! Knowledge-base search tool (`search_hospital`).
//!
//! Forwards the model's query to the backend search endpoint:
//!
//! - Request: `POST {base}/api/search` with JSON `{"query": "..."}`
//! - Response: JSON `{"results": ...}`
//!
//! Every failure (bad arguments, network, HTTP status, body parsing) is
//! returned as `{"success": false, "error": "..."}`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use url::Url;

use super::registry::{ToolHandler, ToolOutcome};
use crate::core::realtime::ToolDef;

/// Function name the backend uses to invoke the search.
pub const SEARCH_HOSPITAL: &str = "search_hospital";

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
}

/// Search handler backed by the backend search endpoint.
#[derive(Debug, Clone)]
pub struct SearchHospitalTool {
    http: reqwest::Client,
    endpoint: Url,
}

impl SearchHospitalTool {
    pub fn new(http: reqwest::Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Run one search and return the `results` field of the response body,
    /// if any.
    pub async fn search(&self, query: &str) -> Result<Option<Value>, reqwest::Error> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&SearchRequest { query })
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        Ok(body.get("results").cloned())
    }
}

#[async_trait]
impl ToolHandler for SearchHospitalTool {
    fn definition(&self) -> ToolDef {
        ToolDef::function(
            SEARCH_HOSPITAL,
            "Search through the knowledge base of hospital to find relevant information",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query to find relevant information"
                    }
                },
                "required": ["query"]
            }),
        )
    }

    async fn call(&self, arguments: Value) -> ToolOutcome {
        let args: SearchArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => {
                tracing::warn!("Invalid {} arguments: {}", SEARCH_HOSPITAL, e);
                return ToolOutcome::failure(e.to_string());
            }
        };

        tracing::debug!("Searching knowledge base: {}", args.query);

        match self.search(&args.query).await {
            Ok(Some(results)) => ToolOutcome::success().with("results", results),
            Ok(None) => ToolOutcome::success(),
            Err(e) => {
                tracing::warn!("Knowledge base search failed: {}", e);
                ToolOutcome::failure(e.to_string())
            }
        }
    }
}
