//! Walks forwarded live-chat packets and pulls out text chat messages.
//!
//! Packets are loosely structured and frequently incomplete, so every lookup
//! here is tolerant: a missing or mis-shaped segment yields a default value
//! or skips the action, never an error.

use crate::chat::ChatMessage;
use crate::entity::Author;
use crate::run::normalize_run;
use serde_json::Value;

/// Extract every text chat message of one packet, in action order.
///
/// `video_id` is left empty; it is not part of the packet.
pub fn extract_packet(packet: &Value) -> Vec<ChatMessage> {
    let Some(actions) = packet
        .get("continuationContents")
        .and_then(|c| c.get("liveChatContinuation"))
        .and_then(|c| c.get("actions"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    actions
        .iter()
        .filter_map(|action| {
            action
                .get("addChatItemAction")
                .and_then(|a| a.get("item"))
                .and_then(|i| i.get("liveChatTextMessageRenderer"))
        })
        .map(message_from_renderer)
        .collect()
}

/// Extract from the `data` field of a submission.
///
/// Forwarders send one packet object, or an array of packets when they
/// batch; anything else holds no messages.
pub fn extract_data(data: &Value) -> Vec<ChatMessage> {
    match data {
        Value::Object(_) => extract_packet(data),
        Value::Array(packets) => packets.iter().flat_map(extract_packet).collect(),
        _ => Vec::new(),
    }
}

fn message_from_renderer(renderer: &Value) -> ChatMessage {
    let text = renderer
        .get("message")
        .and_then(|m| m.get("runs"))
        .and_then(Value::as_array)
        .map(|runs| runs.iter().map(normalize_run).collect::<String>())
        .unwrap_or_default();

    let mut author = Author::new(
        str_at(renderer.get("authorName").and_then(|n| n.get("simpleText"))),
        str_at(renderer.get("authorExternalChannelId")),
    );

    // Photo URLs are only trusted when the renderer also lists badges.
    let has_badges = renderer
        .get("authorBadges")
        .and_then(Value::as_array)
        .is_some_and(|badges| !badges.is_empty());
    if has_badges {
        author = author.with_photo_url(str_at(
            renderer
                .get("authorPhoto")
                .and_then(|p| p.get("thumbnails"))
                .and_then(|t| t.get(0))
                .and_then(|t| t.get("url")),
        ));
    }

    ChatMessage {
        id: str_at(renderer.get("id")),
        video_id: String::new(),
        author,
        text,
        timestamp_ms: usec_to_ms(renderer.get("timestampUsec")),
    }
}

fn str_at(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_default()
}

/// Microseconds (string or number) to milliseconds, floored. Anything
/// non-numeric becomes 0.
fn usec_to_ms(value: Option<&Value>) -> i64 {
    let usec = match value {
        Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or(0),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        _ => 0,
    };
    usec.div_euclid(1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn packet(actions: Value) -> Value {
        json!({
            "continuationContents": {
                "liveChatContinuation": { "actions": actions }
            }
        })
    }

    fn text_action(id: &str, author: &str, runs: Value) -> Value {
        json!({
            "addChatItemAction": {
                "item": {
                    "liveChatTextMessageRenderer": {
                        "id": id,
                        "message": { "runs": runs },
                        "authorName": { "simpleText": author },
                        "authorExternalChannelId": "UCalice",
                        "timestampUsec": "1700000000000000"
                    }
                }
            }
        })
    }

    #[test]
    fn extracts_single_message() {
        let packet = packet(json!([text_action("m1", "Alice", json!([{ "text": "hi" }]))]));

        let messages = extract_packet(&packet);
        assert_eq!(messages.len(), 1);

        let msg = &messages[0];
        assert_eq!(msg.id, "m1");
        assert_eq!(msg.video_id, "");
        assert_eq!(msg.author.name, "Alice");
        assert_eq!(msg.author.channel_id, "UCalice");
        assert_eq!(msg.author.photo_url, "");
        assert_eq!(msg.text, "hi");
        assert_eq!(msg.timestamp_ms, 1_700_000_000_000);
    }

    #[test]
    fn concatenates_runs_in_order() {
        let runs = json!([
            { "text": "good " },
            { "emoji": { "emojiId": "😀" } },
            { "text": " morning " },
            { "emoji": { "isCustomEmoji": true, "shortcuts": [":wave:"] } }
        ]);
        let messages = extract_packet(&packet(json!([text_action("m1", "Alice", runs)])));
        assert_eq!(messages[0].text, "good 😀 morning :wave:");
    }

    #[test]
    fn text_only_runs_concatenate() {
        let parts = ["a", "bc", "", "def ", "g"];
        let runs: Vec<Value> = parts.iter().map(|p| json!({ "text": p })).collect();
        let messages = extract_packet(&packet(json!([text_action("m1", "A", json!(runs))])));
        assert_eq!(messages[0].text, parts.concat());
    }

    #[test]
    fn missing_path_yields_nothing() {
        assert!(extract_packet(&json!({})).is_empty());
        assert!(extract_packet(&json!(null)).is_empty());
        assert!(extract_packet(&json!([1, 2, 3])).is_empty());
        assert!(extract_packet(&json!({ "continuationContents": "oops" })).is_empty());
        assert!(extract_packet(&json!({
            "continuationContents": { "liveChatContinuation": { "actions": {} } }
        }))
        .is_empty());
    }

    #[test]
    fn skips_non_text_actions() {
        let actions = json!([
            { "addChatItemAction": { "item": { "liveChatPaidMessageRenderer": { "id": "p1" } } } },
            { "markChatItemAsDeletedAction": { "targetItemId": "x" } },
            text_action("m2", "Bob", json!([{ "text": "yo" }])),
            "garbage"
        ]);
        let messages = extract_packet(&packet(actions));
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "m2");
    }

    #[test]
    fn empty_renderer_gets_defaults() {
        let actions = json!([{ "addChatItemAction": { "item": { "liveChatTextMessageRenderer": {} } } }]);
        let messages = extract_packet(&packet(actions));
        assert_eq!(messages, vec![ChatMessage::default()]);
    }

    #[test]
    fn photo_url_requires_badges() {
        let mut action = text_action("m1", "Alice", json!([]));
        let renderer = &mut action["addChatItemAction"]["item"]["liveChatTextMessageRenderer"];
        renderer["authorPhoto"] = json!({ "thumbnails": [{ "url": "https://img/1" }, { "url": "https://img/2" }] });

        let without = extract_packet(&packet(json!([action.clone()])));
        assert_eq!(without[0].author.photo_url, "");

        action["addChatItemAction"]["item"]["liveChatTextMessageRenderer"]["authorBadges"] =
            json!([{ "liveChatAuthorBadgeRenderer": {} }]);
        let with = extract_packet(&packet(json!([action.clone()])));
        assert_eq!(with[0].author.photo_url, "https://img/1");

        action["addChatItemAction"]["item"]["liveChatTextMessageRenderer"]
            .as_object_mut()
            .unwrap()
            .remove("authorPhoto");
        let no_photo = extract_packet(&packet(json!([action])));
        assert_eq!(no_photo[0].author.photo_url, "");
    }

    #[test]
    fn timestamp_conversion() {
        assert_eq!(usec_to_ms(Some(&json!("1700000000000000"))), 1_700_000_000_000);
        assert_eq!(usec_to_ms(Some(&json!(1_700_000_000_123_456_i64))), 1_700_000_000_123);
        assert_eq!(usec_to_ms(Some(&json!("not a number"))), 0);
        assert_eq!(usec_to_ms(Some(&json!(""))), 0);
        assert_eq!(usec_to_ms(Some(&json!({}))), 0);
        assert_eq!(usec_to_ms(None), 0);
    }

    #[test]
    fn data_array_holds_packets() {
        let first = packet(json!([text_action("m1", "Alice", json!([{ "text": "one" }]))]));
        let second = packet(json!([text_action("m2", "Bob", json!([{ "text": "two" }]))]));

        let messages = extract_data(&json!([first.clone(), {}, second]));
        let ids: Vec<_> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m1", "m2"]);

        assert_eq!(extract_data(&first).len(), 1);
        assert!(extract_data(&json!("text")).is_empty());
    }
}
