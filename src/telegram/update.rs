//! Inbound webhook updates.
//!
//! Bodies decode into teloxide's [`Update`]. Update kinds teloxide cannot
//! parse land in `UpdateKind::Error` instead of failing the whole body.

use teloxide::types::{Message, PhotoSize, Update};

/// Decodes an update from a raw webhook body.
pub fn decode_update(body: &[u8]) -> Result<Update, serde_json::Error> {
    serde_json::from_slice(body)
}

/// Returns the highest-resolution variant of the attached photo.
///
/// Ties on pixel count are broken by file size, then by position
/// (Telegram lists sizes smallest first).
pub fn largest_photo(msg: &Message) -> Option<&PhotoSize> {
    msg.photo()?
        .iter()
        .max_by_key(|size| (pixels(size), size.file.size))
}

/// Whether the message carries user media that is not a photo.
pub fn has_other_media(msg: &Message) -> bool {
    msg.document().is_some()
        || msg.sticker().is_some()
        || msg.video().is_some()
        || msg.animation().is_some()
        || msg.voice().is_some()
        || msg.audio().is_some()
}

/// Display name of the sender for logging.
pub fn sender_name(msg: &Message) -> String {
    match &msg.from {
        Some(user) => user
            .username
            .clone()
            .unwrap_or_else(|| user.first_name.clone()),
        None => "Unknown".to_owned(),
    }
}

fn pixels(size: &PhotoSize) -> u64 {
    u64::from(size.width) * u64::from(size.height)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use teloxide::types::{ChatId, UpdateKind};

    use super::*;

    fn message(fields: serde_json::Value) -> Message {
        let mut value = json!({
            "message_id": 1,
            "date": 1_700_000_000,
            "chat": {"id": -1001, "type": "supergroup", "title": "Friends"},
            "from": {"id": 5, "is_bot": false, "first_name": "Ann"}
        });
        if let (Some(base), Some(extra)) = (value.as_object_mut(), fields.as_object()) {
            base.extend(extra.clone());
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_decode_text_message() {
        let body = json!({
            "update_id": 10,
            "message": {
                "message_id": 1,
                "date": 1_700_000_000,
                "chat": {"id": -1001, "type": "supergroup", "title": "Friends"},
                "from": {"id": 5, "is_bot": false, "first_name": "Ann"},
                "text": "hello"
            }
        });
        let update = decode_update(&serde_json::to_vec(&body).unwrap()).unwrap();

        assert_eq!(update.id.0, 10);
        let UpdateKind::Message(msg) = update.kind else {
            panic!("not a message update");
        };
        assert_eq!(msg.chat.id, ChatId(-1001));
        assert_eq!(msg.text(), Some("hello"));
        assert_eq!(sender_name(&msg), "Ann");
        assert!(largest_photo(&msg).is_none());
        assert!(!has_other_media(&msg));
    }

    #[test]
    fn test_unparseable_kind_is_kept_as_error() {
        let body = br#"{"update_id": 11, "message": {"message_id": 1}}"#;
        let update = decode_update(body).unwrap();
        assert!(matches!(update.kind, UpdateKind::Error(_)));
    }

    #[test]
    fn test_largest_photo_picks_most_pixels() {
        let msg = message(json!({
            "photo": [
                {"file_id": "small", "file_unique_id": "s", "width": 90, "height": 60, "file_size": 1000},
                {"file_id": "large", "file_unique_id": "l", "width": 1280, "height": 853, "file_size": 90000},
                {"file_id": "medium", "file_unique_id": "m", "width": 320, "height": 213, "file_size": 9000}
            ]
        }));

        assert_eq!(largest_photo(&msg).unwrap().file.id.0, "large");
    }

    #[test]
    fn test_largest_photo_tie_prefers_last() {
        let msg = message(json!({
            "photo": [
                {"file_id": "first", "file_unique_id": "a", "width": 100, "height": 100, "file_size": 500},
                {"file_id": "second", "file_unique_id": "b", "width": 100, "height": 100, "file_size": 500}
            ]
        }));

        assert_eq!(largest_photo(&msg).unwrap().file.id.0, "second");
    }

    #[test]
    fn test_other_media_detected() {
        let msg = message(json!({
            "document": {"file_id": "doc", "file_unique_id": "d", "file_size": 10}
        }));

        assert!(has_other_media(&msg));
        assert!(largest_photo(&msg).is_none());
    }

    #[test]
    fn test_malformed_body_is_rejected() {
        assert!(decode_update(b"not json").is_err());
        assert!(decode_update(br#"{"message": {}}"#).is_err());
    }
}
