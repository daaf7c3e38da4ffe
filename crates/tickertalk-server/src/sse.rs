use axum::{
    body::Body,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::Stream;
use http::header::{HeaderName, CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use serde::Deserialize;
use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
};
use tokio_stream::wrappers::ReceiverStream;

/// How text deltas are written to the response body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamFraming {
    /// Bare text fragments, as the chat UI expects
    #[default]
    Raw,
    /// Standard event-stream records, one `data:` line per text line
    Event,
}

impl StreamFraming {
    pub fn frame(&self, text: &str) -> String {
        match self {
            StreamFraming::Raw => text.to_string(),
            StreamFraming::Event => {
                let mut framed = String::with_capacity(text.len() + 8);
                for line in text.split('\n') {
                    framed.push_str("data: ");
                    framed.push_str(line);
                    framed.push('\n');
                }
                framed.push('\n');
                framed
            }
        }
    }
}

/// Live event-stream response fed by the streaming task through a channel
pub struct SseResponse {
    rx: ReceiverStream<String>,
}

impl SseResponse {
    pub fn new(rx: ReceiverStream<String>) -> Self {
        Self { rx }
    }
}

impl Stream for SseResponse {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx)
            .poll_next(cx)
            .map(|opt| opt.map(|s| Ok(Bytes::from(s))))
    }
}

impl IntoResponse for SseResponse {
    fn into_response(self) -> Response {
        let body = Body::from_stream(self);

        (
            [
                (CONTENT_TYPE, "text/event-stream"),
                (CACHE_CONTROL, "no-cache, no-transform"),
                (CONNECTION, "keep-alive"),
                // Stops reverse proxies from buffering the stream
                (HeaderName::from_static("x-accel-buffering"), "no"),
            ],
            body,
        )
            .into_response()
    }
}
