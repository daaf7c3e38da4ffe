use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;

use crate::models::message::Message;
use crate::models::stream::StreamChunk;
use crate::tools::ToolRegistry;

/// Incremental output of one completion, in arrival order
pub type ChunkStream = BoxStream<'static, Result<StreamChunk>>;

/// Runs a transcript against a completion service that may call tools.
///
/// Implementations own the whole tool loop: they decide when to invoke
/// registry entries and feed the results back until the service produces
/// its final answer.
#[async_trait]
pub trait CompletionOrchestrator: Send + Sync {
    /// Start a streamed completion. Errors returned here happen before any
    /// output was produced; later failures arrive as `Err` items.
    async fn stream_complete(
        &self,
        transcript: Vec<Message>,
        tools: Arc<ToolRegistry>,
    ) -> Result<ChunkStream>;
}
