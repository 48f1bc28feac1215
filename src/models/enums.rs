use serde::{Deserialize, Serialize};

use crate::db::StorageError;

/// Kind of file attached to a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Video,
    Audio,
    Image,
    File,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Image => "image",
            Self::File => "file",
        }
    }
}

impl std::str::FromStr for AttachmentKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            "image" => Ok(Self::Image),
            "file" => Ok(Self::File),
            _ => Err(StorageError::InvalidEnum {
                field: "AttachmentKind".into(),
                value: s.into(),
            }),
        }
    }
}
