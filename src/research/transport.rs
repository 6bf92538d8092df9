use crate::research::coordinator::ORCHESTRATOR;
use crate::types::{CollabEvent, EventType};
use futures::{Stream, stream};
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;

/// One unit on the outgoing feed.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Event(CollabEvent),
    /// Nothing happened for a heartbeat interval.
    Heartbeat,
}

pub struct EventTransport;

impl EventTransport {
    /// Turn the session's event channel into a bounded frame stream.
    ///
    /// The stream ends after forwarding `session_done`, when every producer is
    /// gone, or at the ceiling, where a single `timeout` event is the last frame.
    /// Dropping the stream drops the receiver; producers keep running and their
    /// events are discarded.
    pub fn frames(
        rx: UnboundedReceiver<CollabEvent>,
        ceiling: Duration,
        heartbeat: Duration,
    ) -> impl Stream<Item = Frame> + Send + 'static {
        let deadline = Instant::now() + ceiling;

        stream::unfold(Some(rx), move |state| async move {
            let mut rx = state?;
            let now = Instant::now();
            if now >= deadline {
                return Some((Frame::Event(timeout_event(ceiling)), None));
            }

            let wait = heartbeat.min(deadline - now);
            match tokio::time::timeout(wait, rx.recv()).await {
                Ok(Some(event)) => {
                    let done = event.event_type == EventType::SessionDone;
                    Some((Frame::Event(event), (!done).then_some(rx)))
                }
                Ok(None) => None,
                Err(_) if Instant::now() >= deadline => {
                    Some((Frame::Event(timeout_event(ceiling)), None))
                }
                Err(_) => Some((Frame::Heartbeat, Some(rx))),
            }
        })
    }
}

fn timeout_event(ceiling: Duration) -> CollabEvent {
    tracing::warn!(ceiling_secs = ceiling.as_secs(), "Session hit duration ceiling");
    CollabEvent::new(EventType::Timeout, ORCHESTRATOR).with_payload(json!({
        "message": format!("Session exceeded its {}s duration ceiling", ceiling.as_secs()),
        "ceiling_secs": ceiling.as_secs(),
    }))
}
