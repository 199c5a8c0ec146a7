use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Broad kind of an uploaded file, derived from its MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Image,
    Video,
    Document,
    Audio,
    Archive,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Image => "image",
            FileCategory::Video => "video",
            FileCategory::Document => "document",
            FileCategory::Audio => "audio",
            FileCategory::Archive => "archive",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FileCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(FileCategory::Image),
            "video" => Ok(FileCategory::Video),
            "document" => Ok(FileCategory::Document),
            "audio" => Ok(FileCategory::Audio),
            "archive" => Ok(FileCategory::Archive),
            _ => Err(AppError::BadRequest(format!("Unknown file category: {s}"))),
        }
    }
}

/// Metadata of an uploaded file. The bytes live in object storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: i64,
    pub original_name: String,
    pub storage_key: String,
    pub content_type: String,
    pub size: i64,
    pub category: FileCategory,
    pub created_at: DateTime<Utc>,
}

/// Metadata for a file that has just been written to storage.
#[derive(Debug, Clone)]
pub struct NewStoredFile {
    pub original_name: String,
    pub storage_key: String,
    pub content_type: String,
    pub size: i64,
    pub category: FileCategory,
}
