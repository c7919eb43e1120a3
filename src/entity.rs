use serde::{Deserialize, Serialize};
use std::fmt;

/// The person who posted a chat message, as seen by the streaming platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub name: String,
    pub channel_id: String,
    /// Only filled in when the source renderer carried author badges.
    #[serde(default)]
    pub photo_url: String,
}

impl Author {
    pub fn new(name: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channel_id: channel_id.into(),
            photo_url: String::new(),
        }
    }

    pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = url.into();
        self
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.channel_id.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} ({})", self.name, self.channel_id)
        }
    }
}
