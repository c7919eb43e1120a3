use crate::entity::Author;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One chat message extracted from a forwarded live-chat packet.
///
/// Every field has a non-null default: missing source data becomes an empty
/// string or zero rather than an absent value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    /// Stamped by the ingestion endpoint; the extractor leaves it empty.
    pub video_id: String,
    pub author: Author,
    pub text: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

impl ChatMessage {
    /// The send time, if the timestamp is within chrono's range.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_ms)
    }

    pub fn with_video_id(mut self, video_id: impl Into<String>) -> Self {
        self.video_id = video_id.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_fields() {
        let msg = ChatMessage {
            id: "m1".into(),
            video_id: "abc".into(),
            author: Author::new("Alice", "UC1"),
            text: "hi".into(),
            timestamp_ms: 1_700_000_000_000,
        };

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["videoId"], "abc");
        assert_eq!(value["timestampMs"], 1_700_000_000_000_i64);
        assert_eq!(value["author"]["channelId"], "UC1");
        assert_eq!(value["author"]["photoUrl"], "");
    }

    #[test]
    fn sent_at_converts_millis() {
        let msg = ChatMessage {
            timestamp_ms: 1_700_000_000_000,
            ..Default::default()
        };
        assert_eq!(msg.sent_at().unwrap().timestamp(), 1_700_000_000);
    }
}
