use crate::types::CollabEvent;
use tokio::sync::mpsc;

/// Cloneable producer side of a session's event feed.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<CollabEvent>,
}

impl EventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<CollabEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Forward an event. A dropped receiver means the consumer went away; the
    /// event is discarded and the producer keeps running.
    pub fn emit(&self, event: CollabEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Event consumer gone, dropping event");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventType;

    #[tokio::test]
    async fn test_emit_preserves_order() {
        let (sink, mut rx) = EventSink::channel();
        sink.emit(CollabEvent::new(EventType::ToolStarted, "bio-agent"));
        sink.emit(CollabEvent::new(EventType::ToolResult, "bio-agent"));

        assert_eq!(rx.recv().await.unwrap().event_type, EventType::ToolStarted);
        assert_eq!(rx.recv().await.unwrap().event_type, EventType::ToolResult);
    }

    #[test]
    fn test_emit_after_disconnect_is_silent() {
        let (sink, rx) = EventSink::channel();
        drop(rx);
        assert!(sink.is_closed());
        sink.emit(CollabEvent::new(EventType::Thought, "lit-agent"));
    }
}
