//! Message runs: the fragments a live-chat message body is split into.
//!
//! A run is either literal text or an emoji reference. Custom (channel
//! specific) emoji have no universal identifier, so they are rendered from
//! their shortcut label instead.

use serde_json::Value;
use std::borrow::Cow;

const CUSTOM_FALLBACK: &str = "custom";
const EMOJI_PLACEHOLDER: &str = "[emoji]";

/// One fragment of a message body, borrowed from the decoded packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Run<'a> {
    Text(&'a str),
    Emoji(EmojiRef<'a>),
    /// Neither text nor emoji; contributes nothing.
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmojiRef<'a> {
    pub is_custom: bool,
    /// `None` when the reference carries no `shortcuts` field at all.
    pub shortcuts: Option<Vec<&'a str>>,
    pub emoji_id: Option<&'a str>,
}

impl<'a> Run<'a> {
    /// Decode a run without ever failing; unexpected shapes fall back to
    /// empty values.
    pub fn from_value(value: &'a Value) -> Self {
        if let Some(text) = value.get("text") {
            return Run::Text(text.as_str().unwrap_or_default());
        }

        match value.get("emoji") {
            Some(emoji) => Run::Emoji(EmojiRef::from_value(emoji)),
            None => Run::Unknown,
        }
    }

    pub fn to_fragment(&self) -> Cow<'a, str> {
        match self {
            Run::Text(text) => Cow::Borrowed(*text),
            Run::Emoji(emoji) => emoji.to_fragment(),
            Run::Unknown => Cow::Borrowed(""),
        }
    }
}

impl<'a> EmojiRef<'a> {
    pub fn from_value(value: &'a Value) -> Self {
        let shortcuts = value.get("shortcuts").map(|shortcuts| {
            shortcuts
                .as_array()
                .map(|labels| labels.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default()
        });

        Self {
            is_custom: value
                .get("isCustomEmoji")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            shortcuts,
            emoji_id: value.get("emojiId").and_then(Value::as_str),
        }
    }

    pub fn to_fragment(&self) -> Cow<'a, str> {
        if self.is_custom {
            if let Some(shortcuts) = &self.shortcuts {
                let label = shortcuts
                    .iter()
                    .map(|s| s.trim_matches(':'))
                    .find(|s| !s.is_empty())
                    .unwrap_or(CUSTOM_FALLBACK);
                return Cow::Owned(format!(":{label}:"));
            }
        }

        match self.emoji_id {
            Some(id) => Cow::Borrowed(id),
            None => Cow::Borrowed(EMOJI_PLACEHOLDER),
        }
    }
}

/// Render one raw run value into its text fragment.
pub fn normalize_run(run: &Value) -> Cow<'_, str> {
    Run::from_value(run).to_fragment()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_run_is_returned_unchanged() {
        let run = json!({ "text": "hello there " });
        assert_eq!(normalize_run(&run), "hello there ");
    }

    #[test]
    fn custom_emoji_uses_shortcut() {
        let run = json!({ "emoji": { "isCustomEmoji": true, "shortcuts": [":wave:"] } });
        assert_eq!(normalize_run(&run), ":wave:");
    }

    #[test]
    fn custom_emoji_shortcut_is_rewrapped() {
        let run = json!({ "emoji": { "isCustomEmoji": true, "shortcuts": ["::yt::", ":other:"] } });
        assert_eq!(normalize_run(&run), ":yt:");

        let run = json!({ "emoji": { "isCustomEmoji": true, "shortcuts": ["bare"] } });
        assert_eq!(normalize_run(&run), ":bare:");
    }

    #[test]
    fn custom_emoji_without_shortcuts_falls_back() {
        let run = json!({ "emoji": { "isCustomEmoji": true, "shortcuts": [] } });
        assert_eq!(normalize_run(&run), ":custom:");

        let run = json!({ "emoji": { "isCustomEmoji": true, "shortcuts": ["::", ""] } });
        assert_eq!(normalize_run(&run), ":custom:");
    }

    #[test]
    fn standard_emoji_uses_id() {
        let run = json!({ "emoji": { "emojiId": "😀", "shortcuts": [":grinning:"] } });
        assert_eq!(normalize_run(&run), "😀");
    }

    #[test]
    fn custom_flag_without_shortcut_field_uses_id() {
        let run = json!({ "emoji": { "isCustomEmoji": true, "emojiId": "UCx/abc" } });
        assert_eq!(normalize_run(&run), "UCx/abc");
    }

    #[test]
    fn bare_emoji_reference_is_placeholder() {
        let run = json!({ "emoji": {} });
        assert_eq!(normalize_run(&run), "[emoji]");

        let run = json!({ "emoji": { "emojiId": 42 } });
        assert_eq!(normalize_run(&run), "[emoji]");
    }

    #[test]
    fn unknown_run_is_empty() {
        assert_eq!(normalize_run(&json!({ "navigationEndpoint": {} })), "");
        assert_eq!(normalize_run(&json!("not a run")), "");
        assert_eq!(Run::from_value(&json!(null)), Run::Unknown);
    }

    #[test]
    fn non_string_text_is_empty() {
        assert_eq!(normalize_run(&json!({ "text": 7 })), "");
    }
}
