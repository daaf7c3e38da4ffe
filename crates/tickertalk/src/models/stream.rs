use super::tool::ToolCall;

/// One incremental unit of orchestrator output, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    /// A delta of generated text
    Text(String),
    /// The service asked for a tool to be run
    ToolCall(ToolCall),
    /// A requested tool finished; `ok` is false when it produced an error
    ToolResult { id: String, name: String, ok: bool },
}

impl StreamChunk {
    pub fn text<S: Into<String>>(text: S) -> Self {
        StreamChunk::Text(text.into())
    }

    /// The text delta carried by this chunk, empty for tool chunks
    pub fn as_text(&self) -> &str {
        match self {
            StreamChunk::Text(text) => text,
            _ => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concatenation_skips_tool_chunks() {
        let chunks = vec![
            StreamChunk::text("AAPL "),
            StreamChunk::ToolCall(ToolCall::new("1", "stock_quote", "{}")),
            StreamChunk::ToolResult {
                id: "1".into(),
                name: "stock_quote".into(),
                ok: true,
            },
            StreamChunk::text("is up."),
        ];
        let reply: String = chunks.iter().map(StreamChunk::as_text).collect();
        assert_eq!(reply, "AAPL is up.");
    }
}
