//! Channel-backed event stream between the pipeline task and the SSE handler

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::domain::ChatEvent;

/// Receiving half of a chat run. Yields events in exactly the order the
/// pipeline produced them and ends when the pipeline task drops its sender.
pub struct ChatStream {
    receiver: mpsc::Receiver<ChatEvent>,
}

impl ChatStream {
    /// Create a sender/stream pair.
    pub fn channel(buffer: usize) -> (ChatStreamSender, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (ChatStreamSender { sender: tx }, Self { receiver: rx })
    }

    /// Collect every remaining event. Test helper; production code consumes
    /// the stream incrementally through the SSE response.
    pub async fn collect(mut self) -> Vec<ChatEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.receiver.recv().await {
            events.push(event);
        }
        events
    }
}

impl Stream for ChatStream {
    type Item = ChatEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_recv(cx)
    }
}

/// Sending half held by the pipeline task.
#[derive(Clone)]
pub struct ChatStreamSender {
    sender: mpsc::Sender<ChatEvent>,
}

impl ChatStreamSender {
    /// Push one event. Returns `false` once the consumer is gone, which the
    /// pipeline treats as a signal to stop emitting.
    pub async fn send(&self, event: ChatEvent) -> bool {
        self.sender.send(event).await.is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
