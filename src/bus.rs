use crate::chat::ChatMessage;
use serde::{Deserialize, Serialize};
use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// A submission was accepted and decoded
    PacketReceived { video_id: String, messages: usize },

    /// A chat message was written to the store
    MessageSaved(ChatMessage),

    /// A submission was aborted
    IngestFailed {
        video_id: Option<String>,
        error: String,
    },

    /// Periodic liveness announcement
    Status { message: String },
}

pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(256);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: Event) {
        // We ignore the error if there are no receivers
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscribe a `tracing` logger to the bus.
pub fn spawn_logger(bus: &EventBus) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event logger fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn log_event(event: &Event) {
    match event {
        Event::PacketReceived { video_id, messages } => {
            tracing::debug!(video_id = %video_id, messages, "Packet received");
        }
        Event::MessageSaved(msg) => {
            let sent_at = msg
                .sent_at()
                .map(|t| t.to_rfc3339())
                .unwrap_or_default();
            info!(
                id = %msg.id,
                video_id = %msg.video_id,
                sent_at = %sent_at,
                "[Saved] {}: {}",
                msg.author.name,
                msg.text
            );
        }
        Event::IngestFailed { video_id, error } => {
            warn!(video_id = ?video_id, "Submission failed: {}", error);
        }
        Event::Status { message } => info!("{}", message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(Event::Status {
            message: "up".into(),
        });

        match rx.recv().await.unwrap() {
            Event::Status { message } => assert_eq!(message, "up"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn logger_stops_when_bus_is_dropped() {
        let bus = EventBus::new();
        let handle = spawn_logger(&bus);
        bus.publish(Event::PacketReceived {
            video_id: "abc".into(),
            messages: 0,
        });
        drop(bus);
        handle.await.unwrap();
    }
}
