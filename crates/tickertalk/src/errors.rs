use thiserror::Error;

/// Failure of a single market-data tool invocation.
///
/// These never abort a completion: the orchestrator renders them into the
/// transcript so the model can reason about what went wrong.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// The upstream answered with a non-2xx status. Displays as the bare
    /// reason phrase, which is what the model gets to see.
    #[error("{reason}")]
    Upstream { status_code: u16, reason: String },

    #[error("Market data request failed: {0}")]
    Transport(String),

    #[error("Market data response was not valid JSON: {0}")]
    InvalidPayload(String),
}

pub type ToolResult<T> = Result<T, ToolError>;

/// Errors raised while assembling a deployment's tool registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Duplicate tool name: {0}")]
    DuplicateTool(String),

    #[error("At least one tool must be registered")]
    Empty,
}
