//! Message DTOs

use crate::core::ChatError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

pub const MAX_MESSAGE_LENGTH: u64 = 5000;

/// DTO to post a text message through the REST fallback
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct SendMessageDTO {
    #[validate(length(min = 1, max = 5000, message = "Message content must be between 1 and 5000 characters"))]
    pub message: String,
}

impl SendMessageDTO {
    /// Trims the text and validates it
    pub fn new(text: &str) -> Result<Self, ChatError> {
        let dto = Self {
            message: text.trim().to_string(),
        };
        dto.validate()?;
        Ok(dto)
    }
}

/// Kind of media attached to an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Name of the multipart part carrying the file, also the endpoint suffix
    pub fn part_name(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    pub fn empty_error(self) -> ChatError {
        ChatError::media(format!("{} is empty", self.part_name()))
    }

    /// MIME type guessed from the file extension
    pub fn mime_for(self, path: &Path) -> &'static str {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match (self, ext.as_deref()) {
            (MediaKind::Image, Some("png")) => "image/png",
            (MediaKind::Image, Some("gif")) => "image/gif",
            (MediaKind::Image, Some("webp")) => "image/webp",
            (MediaKind::Image, _) => "image/jpeg",
            (MediaKind::Video, Some("webm")) => "video/webm",
            (MediaKind::Video, Some("mov")) => "video/quicktime",
            (MediaKind::Video, Some("3gp")) => "video/3gpp",
            (MediaKind::Video, _) => "video/mp4",
        }
    }
}
