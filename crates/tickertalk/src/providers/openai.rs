use anyhow::{anyhow, Result};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};
use reqwest::{Client, Response};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::base::{ChunkStream, CompletionOrchestrator};
use super::configs::CompletionConfig;
use super::utils::{
    extract_error_message, messages_to_openai_spec, parse_chunk, tool_calls_to_openai_spec,
    tool_response_to_openai_spec, tools_to_openai_spec, SseDecoder, SseEvent,
    ToolCallAccumulator,
};
use crate::models::message::Message;
use crate::models::stream::StreamChunk;
use crate::tools::{render_tool_result, ToolRegistry};

/// Streams chat completions from an OpenAI-compatible endpoint and runs the
/// tool loop locally: every round that ends in tool calls is answered
/// through the registry and followed by another streamed request.
#[derive(Debug, Clone)]
pub struct OpenAiOrchestrator {
    client: Client,
    config: CompletionConfig,
}

impl OpenAiOrchestrator {
    pub fn new(config: CompletionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    fn payload(&self, messages: &[Value], tools: &[Value]) -> Value {
        let mut payload = json!({
            "model": self.config.model,
            "messages": messages,
            "stream": true,
        });

        if !tools.is_empty() {
            if let Some(object) = payload.as_object_mut() {
                object.insert("tools".to_string(), json!(tools));
            }
        }
        payload
    }

    async fn post(&self, payload: &Value) -> Result<Response> {
        let url = format!(
            "{}/chat/completions",
            self.config.host.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body).unwrap_or(body);
        Err(anyhow!("Completion request failed ({}): {}", status, message))
    }

    fn run_rounds(
        self,
        first: Response,
        mut messages: Vec<Value>,
        tools_spec: Vec<Value>,
        tools: Arc<ToolRegistry>,
    ) -> impl Stream<Item = Result<StreamChunk>> + Send {
        try_stream! {
            let mut response = first;
            let mut rounds = 1;

            loop {
                let mut calls = ToolCallAccumulator::default();
                let mut text = String::new();
                let mut payloads = Box::pin(sse_payloads(response));

                while let Some(data) = payloads.next().await {
                    let chunk = parse_chunk(&data?)?;
                    for choice in chunk.choices {
                        if let Some(delta) = choice.delta.content.filter(|delta| !delta.is_empty()) {
                            text.push_str(&delta);
                            yield StreamChunk::Text(delta);
                        }
                        for delta in choice.delta.tool_calls.into_iter().flatten() {
                            calls.push(delta);
                        }
                    }
                }

                if calls.is_empty() {
                    break;
                }

                let calls = calls.finish();
                for call in &calls {
                    debug!(tool = %call.name, id = %call.id, "completion requested tool");
                    yield StreamChunk::ToolCall(call.clone());
                }

                let outputs =
                    futures::future::join_all(calls.iter().map(|call| tools.dispatch(call))).await;

                messages.push(tool_calls_to_openai_spec(&text, &calls));
                for (call, output) in calls.iter().zip(outputs.iter()) {
                    messages.push(tool_response_to_openai_spec(
                        &call.id,
                        &render_tool_result(output),
                    ));
                    yield StreamChunk::ToolResult {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        ok: output.is_ok(),
                    };
                }

                if rounds >= self.config.max_rounds {
                    Err::<(), _>(anyhow!(
                        "Completion still requested tools after {} rounds",
                        rounds
                    ))?;
                }
                rounds += 1;
                response = self.post(&self.payload(&messages, &tools_spec)).await?;
            }
        }
    }
}

/// `data:` payloads of one streamed response, up to `[DONE]` or end of body
fn sse_payloads(response: Response) -> impl Stream<Item = Result<String>> + Send {
    try_stream! {
        let mut body = Box::pin(response.bytes_stream());
        let mut decoder = SseDecoder::default();
        let mut done = false;

        while !done {
            let Some(bytes) = body.next().await else {
                break;
            };
            for event in decoder.push(&bytes?)? {
                match event {
                    SseEvent::Data(data) => yield data,
                    SseEvent::Done => {
                        done = true;
                        break;
                    }
                }
            }
        }

        if !done {
            if let Some(SseEvent::Data(data)) = decoder.finish()? {
                yield data;
            }
        }
    }
}

#[async_trait]
impl CompletionOrchestrator for OpenAiOrchestrator {
    async fn stream_complete(
        &self,
        transcript: Vec<Message>,
        tools: Arc<ToolRegistry>,
    ) -> Result<ChunkStream> {
        let messages = messages_to_openai_spec(&transcript);
        let tools_spec = tools_to_openai_spec(tools.tools())?;

        // The first round is sent eagerly so an unreachable or rejecting
        // service is reported before any output is streamed.
        let first = self.post(&self.payload(&messages, &tools_spec)).await?;

        Ok(Box::pin(self.clone().run_rounds(
            first, messages, tools_spec, tools,
        )))
    }
}
