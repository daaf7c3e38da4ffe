use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool that can be used by a model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// The name of the tool
    pub name: String,
    /// A description of what the tool does
    pub description: String,
    /// JSON schema of the arguments the tool accepts
    pub parameters: Value,
}

impl Tool {
    /// Create a new tool with the given name and description
    pub fn new<N, D>(name: N, description: D, parameters: Value) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Tool {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A tool invocation requested by the completion service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Identifier the service uses to match the result to the request
    pub id: String,
    /// The name of the tool to execute
    pub name: String,
    /// Raw JSON text of the arguments, exactly as the model produced it
    pub arguments: String,
}

impl ToolCall {
    pub fn new<I, N, A>(id: I, name: N, arguments: A) -> Self
    where
        I: Into<String>,
        N: Into<String>,
        A: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}
