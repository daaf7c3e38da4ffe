use serde::Deserialize;
use std::collections::HashSet;
use tracing::{info, warn};

use super::catalog::{lookup, MarketEndpoint};
use super::market::MarketDataClient;
use crate::errors::{RegistryError, ToolError, ToolResult};
use crate::models::tool::{Tool, ToolCall};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchArguments {
    #[serde(rename = "searchQuery")]
    search_query: String,
}

/// The fixed set of tools one deployment exposes to the completion service
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    endpoints: Vec<&'static MarketEndpoint>,
    tools: Vec<Tool>,
    client: MarketDataClient,
}

impl ToolRegistry {
    /// Build a registry from catalog names, in the given order.
    pub fn from_names<S: AsRef<str>>(
        names: &[S],
        client: MarketDataClient,
    ) -> Result<Self, RegistryError> {
        if names.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen = HashSet::new();
        let mut endpoints = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            if !seen.insert(name) {
                return Err(RegistryError::DuplicateTool(name.to_string()));
            }
            let endpoint =
                lookup(name).ok_or_else(|| RegistryError::UnknownTool(name.to_string()))?;
            endpoints.push(endpoint);
        }

        let tools = endpoints.iter().map(|endpoint| endpoint.to_tool()).collect();
        Ok(Self {
            endpoints,
            tools,
            client,
        })
    }

    /// Declarations for the completion request
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.endpoints.iter().map(|endpoint| endpoint.name)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Run one tool call. Never panics and never fails the surrounding
    /// completion; every problem comes back as a [`ToolError`].
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult<String> {
        let endpoint = self
            .endpoints
            .iter()
            .find(|endpoint| endpoint.name == call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;

        let arguments: SearchArguments = serde_json::from_str(&call.arguments)
            .map_err(|e| ToolError::InvalidParameters(e.to_string()))?;

        info!(tool = endpoint.name, query = %arguments.search_query, "calling market data tool");
        let result = self.client.fetch(endpoint, &arguments.search_query).await;
        if let Err(err) = &result {
            warn!(tool = endpoint.name, error = %err, "market data tool failed");
        }
        result
    }
}

/// Text the completion service sees as the output of a tool call.
///
/// Success is the JSON payload; an upstream HTTP failure is its bare reason
/// phrase; anything else is the error message.
pub fn render_tool_result(result: &ToolResult<String>) -> String {
    match result {
        Ok(payload) => payload.clone(),
        Err(err) => err.to_string(),
    }
}
