use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::Poll;

use super::base::{ChunkStream, CompletionOrchestrator};
use crate::models::message::Message;
use crate::models::stream::StreamChunk;
use crate::tools::ToolRegistry;

/// What a [`MockOrchestrator`] was asked to complete
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub transcript: Vec<Message>,
    pub tool_names: Vec<String>,
}

/// An orchestrator that replays pre-configured chunks, for testing
#[derive(Debug, Default)]
pub struct MockOrchestrator {
    chunks: Vec<StreamChunk>,
    start_error: Option<String>,
    trailing_error: Option<String>,
    stay_open: bool,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    dropped: Arc<AtomicBool>,
}

/// Marks the replayed stream as dropped
#[derive(Debug)]
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl MockOrchestrator {
    /// Create a mock that streams `chunks` and then ends
    pub fn new(chunks: Vec<StreamChunk>) -> Self {
        Self {
            chunks,
            ..Default::default()
        }
    }

    /// Create a mock whose completion cannot be started
    pub fn failing<S: Into<String>>(message: S) -> Self {
        Self {
            start_error: Some(message.into()),
            ..Default::default()
        }
    }

    /// Fail the stream after the configured chunks were delivered
    pub fn with_trailing_error<S: Into<String>>(mut self, message: S) -> Self {
        self.trailing_error = Some(message.into());
        self
    }

    /// Keep the stream pending after the configured chunks instead of ending it
    pub fn never_ending(mut self) -> Self {
        self.stay_open = true;
        self
    }

    /// Whether the last stream handed out has been dropped by its consumer
    pub fn stream_dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionOrchestrator for MockOrchestrator {
    async fn stream_complete(
        &self,
        transcript: Vec<Message>,
        tools: Arc<ToolRegistry>,
    ) -> Result<ChunkStream> {
        self.requests.lock().unwrap().push(RecordedRequest {
            transcript,
            tool_names: tools.names().map(String::from).collect(),
        });

        if let Some(message) = &self.start_error {
            return Err(anyhow!(message.clone()));
        }

        let mut items: Vec<Result<StreamChunk>> = self.chunks.iter().cloned().map(Ok).collect();
        if let Some(message) = &self.trailing_error {
            items.push(Err(anyhow!(message.clone())));
        }
        self.dropped.store(false, Ordering::SeqCst);
        let flag = DropFlag(self.dropped.clone());
        let stay_open = self.stay_open;
        let tail = stream::poll_fn(move |_| {
            let _flag = &flag;
            if stay_open {
                Poll::Pending
            } else {
                Poll::Ready(None)
            }
        });

        Ok(Box::pin(stream::iter(items).chain(tail)))
    }
}
