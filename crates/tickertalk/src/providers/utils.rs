use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};

use crate::models::message::Message;
use crate::models::tool::{Tool, ToolCall};

/// Convert the transcript to OpenAI's API message specification
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            json!({
                "role": message.role,
                "content": message.content,
            })
        })
        .collect()
}

/// Convert internal Tool format to OpenAI's API tool specification
pub fn tools_to_openai_spec(tools: &[Tool]) -> Result<Vec<Value>> {
    let mut tool_names = HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
                "strict": true,
            }
        }));
    }

    Ok(result)
}

/// The assistant turn that requested `calls`, replayed in the next round
/// together with any text the model streamed before them
pub fn tool_calls_to_openai_spec(text: &str, calls: &[ToolCall]) -> Value {
    let tool_calls: Vec<Value> = calls
        .iter()
        .map(|call| {
            json!({
                "id": call.id,
                "type": "function",
                "function": {
                    "name": call.name,
                    "arguments": call.arguments,
                }
            })
        })
        .collect();

    let content = if text.is_empty() {
        Value::Null
    } else {
        json!(text)
    };

    json!({
        "role": "assistant",
        "content": content,
        "tool_calls": tool_calls,
    })
}

/// The `tool` turn carrying the output of one call
pub fn tool_response_to_openai_spec(id: &str, content: &str) -> Value {
    json!({
        "role": "tool",
        "tool_call_id": id,
        "content": content,
    })
}

/// Pull a human readable message out of an OpenAI style error body
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("error").unwrap_or(&value);
    error
        .get("message")
        .and_then(|message| message.as_str())
        .map(String::from)
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
pub struct ToolCallDelta {
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: Option<FunctionDelta>,
}

#[derive(Debug, Deserialize)]
pub struct FunctionDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

/// Parse one `data:` payload of a streamed chat completion
pub fn parse_chunk(data: &str) -> Result<ChatCompletionChunk> {
    let value: Value = serde_json::from_str(data)?;
    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(|message| message.as_str())
            .map(String::from)
            .unwrap_or_else(|| error.to_string());
        return Err(anyhow!("Completion stream error: {}", message));
    }
    Ok(serde_json::from_value(value)?)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Data(String),
    Done,
}

/// Splits a `text/event-stream` body into `data:` payloads.
///
/// Bytes are buffered until a full line is available so a UTF-8 sequence
/// split across network reads is decoded intact.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<SseEvent>> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(event) = decode_line(&line)? {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Decode whatever is left once the body ends without a final newline
    pub fn finish(self) -> Result<Option<SseEvent>> {
        decode_line(&self.buffer)
    }
}

fn decode_line(line: &[u8]) -> Result<Option<SseEvent>> {
    let line = std::str::from_utf8(line)?.trim_end_matches(&['\r', '\n'][..]);
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let data = data.strip_prefix(' ').unwrap_or(data);

    Ok(match data {
        "" => None,
        "[DONE]" => Some(SseEvent::Done),
        _ => Some(SseEvent::Data(data.to_string())),
    })
}

/// Reassembles tool calls that arrive as fragments keyed by index
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<u32, ToolCall>,
}

impl ToolCallAccumulator {
    pub fn push(&mut self, delta: ToolCallDelta) {
        let index = delta.index.unwrap_or(0);
        let entry = self
            .calls
            .entry(index)
            .or_insert_with(|| ToolCall::new(format!("call_{index}"), "", ""));

        if let Some(id) = delta.id {
            entry.id = id;
        }
        if let Some(function) = delta.function {
            if let Some(name) = function.name.filter(|name| !name.is_empty()) {
                entry.name = name;
            }
            if let Some(arguments) = function.arguments {
                entry.arguments.push_str(&arguments);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn finish(self) -> Vec<ToolCall> {
        self.calls.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tools_to_openai_spec_duplicate() {
        let schema = json!({"type": "object"});
        let tools = vec![
            Tool::new("stock_quote", "quote", schema.clone()),
            Tool::new("stock_quote", "quote again", schema),
        ];
        let err = tools_to_openai_spec(&tools).unwrap_err();
        assert!(err.to_string().contains("Duplicate tool name"));
    }

    #[test]
    fn test_tools_to_openai_spec() {
        let tools = vec![Tool::new("stock_quote", "quote", json!({"type": "object"}))];
        let spec = tools_to_openai_spec(&tools).unwrap();
        assert_eq!(spec[0]["type"], "function");
        assert_eq!(spec[0]["function"]["name"], "stock_quote");
        assert_eq!(spec[0]["function"]["strict"], true);
    }

    #[test]
    fn test_messages_to_openai_spec() {
        let spec = messages_to_openai_spec(&[Message::system("sys"), Message::user("hi")]);
        assert_eq!(
            spec,
            vec![
                json!({"role": "system", "content": "sys"}),
                json!({"role": "user", "content": "hi"}),
            ]
        );
    }

    #[test]
    fn test_tool_round_messages() {
        let call = ToolCall::new("call_1", "stock_quote", r#"{"searchQuery":"AAPL"}"#);
        let request = tool_calls_to_openai_spec("", &[call.clone()]);
        assert_eq!(request["content"], Value::Null);
        assert_eq!(request["tool_calls"][0]["function"]["arguments"], r#"{"searchQuery":"AAPL"}"#);

        let response = tool_response_to_openai_spec("call_1", "Internal Server Error");
        assert_eq!(
            response,
            json!({"role": "tool", "tool_call_id": "call_1", "content": "Internal Server Error"})
        );

        let request = tool_calls_to_openai_spec("Let me check the quote.", &[call]);
        assert_eq!(request["content"], "Let me check the quote.");
        assert_eq!(request["tool_calls"][0]["id"], "call_1");
    }

    #[test]
    fn test_sse_decoder_split_reads() {
        let mut decoder = SseDecoder::default();
        let body = "data: {\"a\":\"caf\u{e9}\"}\n\n: keep-alive\nevent: ping\ndata: [DONE]\n";
        let bytes = body.as_bytes();
        // Cut inside the two-byte 'é'
        let cut = body.find('\u{e9}').unwrap() + 1;

        let mut events = decoder.push(&bytes[..cut]).unwrap();
        assert!(events.is_empty());
        events.extend(decoder.push(&bytes[cut..]).unwrap());

        assert_eq!(
            events,
            vec![
                SseEvent::Data("{\"a\":\"caf\u{e9}\"}".to_string()),
                SseEvent::Done
            ]
        );
        assert_eq!(decoder.finish().unwrap(), None);
    }

    #[test]
    fn test_sse_decoder_trailing_line() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(b"data:{\"x\":1}\r").unwrap().is_empty());
        assert_eq!(
            decoder.finish().unwrap(),
            Some(SseEvent::Data("{\"x\":1}".to_string()))
        );
    }

    #[test]
    fn test_parse_chunk() {
        let chunk = parse_chunk(
            r#"{"id":"c","choices":[{"index":0,"delta":{"content":"Hi"},"finish_reason":null}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Hi"));

        let finished = parse_chunk(r#"{"choices":[{"index":0,"finish_reason":"stop"}]}"#).unwrap();
        assert_eq!(finished.choices[0].finish_reason.as_deref(), Some("stop"));
        assert!(finished.choices[0].delta.content.is_none());

        let err = parse_chunk(r#"{"error":{"message":"model overloaded"}}"#).unwrap_err();
        assert!(err.to_string().contains("model overloaded"));
    }

    #[test]
    fn test_tool_call_accumulator() {
        let mut calls = ToolCallAccumulator::default();
        assert!(calls.is_empty());

        let fragments = [
            r#"{"index":0,"id":"call_a","function":{"name":"stock_quote","arguments":""}}"#,
            r#"{"index":1,"id":"call_b","function":{"name":"market_sentiment","arguments":"{\"search"}}"#,
            r#"{"index":0,"function":{"arguments":"{\"searchQuery\":\"AAPL\"}"}}"#,
            r#"{"index":1,"function":{"arguments":"Query\":\"MSFT\"}"}}"#,
        ];
        for fragment in fragments {
            calls.push(serde_json::from_str(fragment).unwrap());
        }

        assert_eq!(
            calls.finish(),
            vec![
                ToolCall::new("call_a", "stock_quote", r#"{"searchQuery":"AAPL"}"#),
                ToolCall::new("call_b", "market_sentiment", r#"{"searchQuery":"MSFT"}"#),
            ]
        );
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(
            extract_error_message(r#"{"error":{"message":"Invalid API key"}}"#).as_deref(),
            Some("Invalid API key")
        );
        assert_eq!(extract_error_message("Bad Gateway"), None);
    }
}
