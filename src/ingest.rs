use crate::audit::AuditLog;
use crate::bus::{Event, EventBus};
use crate::error::{Error, Result};
use crate::extract::extract_data;
use crate::store::MessageSink;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// One forwarded packet, as posted by the browser-side interceptor.
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    #[serde(rename = "videoId")]
    pub video_id: String,
    pub data: Value,
}

impl Submission {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::MalformedSubmission(e.to_string()))
    }
}

/// Runs one submission through audit, extraction and storage.
///
/// Holds no per-submission state; every call is independent.
pub struct Ingestor {
    sink: Arc<dyn MessageSink>,
    audit: Option<Arc<AuditLog>>,
    event_bus: Arc<EventBus>,
}

impl Ingestor {
    pub fn new(
        sink: Arc<dyn MessageSink>,
        audit: Option<Arc<AuditLog>>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            sink,
            audit,
            event_bus,
        }
    }

    /// Returns the number of stored messages. The first failure aborts the
    /// rest of the submission; messages stored before it stay stored.
    pub async fn ingest(&self, submission: &Submission) -> Result<usize> {
        let result = self.run(submission).await;
        if let Err(e) = &result {
            self.event_bus.publish(Event::IngestFailed {
                video_id: Some(submission.video_id.clone()),
                error: e.to_string(),
            });
        }
        result
    }

    async fn run(&self, submission: &Submission) -> Result<usize> {
        if let Some(audit) = &self.audit {
            audit.append(&submission.data).await?;
        }

        let messages = extract_data(&submission.data);
        self.event_bus.publish(Event::PacketReceived {
            video_id: submission.video_id.clone(),
            messages: messages.len(),
        });

        let mut saved = 0;
        for msg in messages {
            let msg = msg.with_video_id(submission.video_id.as_str());
            self.sink.insert(&submission.video_id, &msg).await?;
            saved += 1;
            self.event_bus.publish(Event::MessageSaved(msg));
        }

        Ok(saved)
    }

    /// Report a body that never made it to a [`Submission`].
    pub fn reject(&self, error: &Error) {
        self.event_bus.publish(Event::IngestFailed {
            video_id: None,
            error: error.to_string(),
        });
    }
}
