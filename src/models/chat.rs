use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::AttachmentKind;
use crate::db::StorageError;

/// A file attached to a chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageAttachment {
    pub kind: AttachmentKind,
    pub url: String,
}

impl MessageAttachment {
    /// Build an attachment from a wire-format kind tag, rejecting unknown kinds.
    pub fn new(kind: &str, url: impl Into<String>) -> Result<Self, StorageError> {
        Ok(Self {
            kind: kind.parse()?,
            url: url.into(),
        })
    }
}

/// One message in a conversation log.
///
/// A conversation is addressed by the unordered set of participant user ids;
/// the sender always counts as a participant. Either `text` or at least one
/// attachment must be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: Option<i64>,
    pub from_user: i64,
    pub sent_at: NaiveDateTime,
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<MessageAttachment>,
}

impl Message {
    pub fn new(
        from_user: i64,
        sent_at: NaiveDateTime,
        text: impl Into<String>,
        attachments: Vec<MessageAttachment>,
    ) -> Self {
        Self {
            message_id: None,
            from_user,
            sent_at,
            text: text.into(),
            attachments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_from_valid_kind() {
        let attachment = MessageAttachment::new("video", "https://example.com/clip").unwrap();
        assert_eq!(attachment.kind, AttachmentKind::Video);
        assert_eq!(attachment.url, "https://example.com/clip");
    }

    #[test]
    fn attachment_rejects_unknown_kind() {
        let result = MessageAttachment::new("unknown_type", "https://example.com");
        assert!(matches!(result, Err(StorageError::InvalidEnum { .. })));
    }

    #[test]
    fn attachment_serializes_kind_as_tag() {
        let attachment = MessageAttachment::new("image", "https://example.com/x.png").unwrap();
        let json = serde_json::to_string(&attachment).unwrap();
        assert!(json.contains("\"kind\":\"image\""));
        let back: MessageAttachment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, attachment);
    }
}
