//! Upload policy: MIME resolution, file validation, and storage key layout.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::file::FileCategory;

const MB: u64 = 1024 * 1024;

pub const MAX_FILE_NAME_LEN: usize = 255;

/// Largest accepted upload of any category, used to size the body limit.
pub const MAX_UPLOAD_BYTES: u64 = 100 * MB;

const IMAGE_MIME: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    "image/bmp",
];
const VIDEO_MIME: &[&str] = &[
    "video/mp4",
    "video/mpeg",
    "video/quicktime",
    "video/x-msvideo",
    "video/x-flv",
    "video/webm",
    "video/x-matroska",
];
const DOCUMENT_MIME: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "text/plain",
    "text/csv",
];
const AUDIO_MIME: &[&str] = &[
    "audio/mpeg",
    "audio/wav",
    "audio/ogg",
    "audio/flac",
    "audio/aac",
    "audio/x-m4a",
];
const ARCHIVE_MIME: &[&str] = &[
    "application/zip",
    "application/x-rar-compressed",
    "application/x-7z-compressed",
    "application/x-tar",
    "application/gzip",
];

impl FileCategory {
    fn mime_types(&self) -> &'static [&'static str] {
        match self {
            FileCategory::Image => IMAGE_MIME,
            FileCategory::Video => VIDEO_MIME,
            FileCategory::Document => DOCUMENT_MIME,
            FileCategory::Audio => AUDIO_MIME,
            FileCategory::Archive => ARCHIVE_MIME,
        }
    }

    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            FileCategory::Image => &["jpg", "jpeg", "png", "gif", "webp", "svg", "bmp"],
            FileCategory::Video => &["mp4", "mpeg", "mov", "avi", "flv", "webm", "mkv"],
            FileCategory::Document => &[
                "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "csv",
            ],
            FileCategory::Audio => &["mp3", "wav", "ogg", "flac", "aac", "m4a"],
            FileCategory::Archive => &["zip", "rar", "7z", "tar", "gz"],
        }
    }

    /// Per-category size ceiling in bytes.
    pub fn max_size(&self) -> u64 {
        match self {
            FileCategory::Image => 10 * MB,
            FileCategory::Video => MAX_UPLOAD_BYTES,
            FileCategory::Document => 20 * MB,
            FileCategory::Audio | FileCategory::Archive => 50 * MB,
        }
    }

    fn base_path(&self) -> &'static str {
        match self {
            FileCategory::Image => "public/images",
            FileCategory::Video => "public/videos",
            FileCategory::Document => "public/documents",
            FileCategory::Audio => "public/audios",
            FileCategory::Archive => "public/archives",
        }
    }
}

/// Where an upload will be referenced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadPurpose {
    #[default]
    Post,
    Profile,
}

impl UploadPurpose {
    pub fn parse(value: Option<&str>) -> Result<Self, AppError> {
        match value.map(str::trim) {
            None | Some("") | Some("post") => Ok(UploadPurpose::Post),
            Some("profile") => Ok(UploadPurpose::Profile),
            Some(other) => Err(AppError::BadRequest(format!(
                "Unknown upload purpose: {other}"
            ))),
        }
    }
}

/// Map a `Content-Type` header value to a file category.
pub fn resolve_category(content_type: Option<&str>) -> Result<FileCategory, AppError> {
    let raw = content_type
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .ok_or_else(|| AppError::BadRequest("File content type is missing".into()))?;

    let essence = raw
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    [
        FileCategory::Image,
        FileCategory::Video,
        FileCategory::Document,
        FileCategory::Audio,
        FileCategory::Archive,
    ]
    .into_iter()
    .find(|category| category.mime_types().contains(&essence.as_str()))
    .ok_or_else(|| AppError::BadRequest(format!("Unsupported file type: {essence}")))
}

/// Lowercased extension of a file name, if any.
pub fn extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Validate name, extension, and size of an upload for its category.
pub fn validate(file_name: &str, size: u64, category: FileCategory) -> Result<(), AppError> {
    if size == 0 {
        return Err(AppError::BadRequest("File is empty".into()));
    }

    let name = file_name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("File name is missing".into()));
    }
    if name.chars().count() > MAX_FILE_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "File name is too long (max {MAX_FILE_NAME_LEN} characters)"
        )));
    }
    if name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(AppError::BadRequest(
            "File name contains forbidden characters".into(),
        ));
    }

    let ext = extension(name)
        .ok_or_else(|| AppError::BadRequest("File extension is missing".into()))?;
    if !category.allowed_extensions().contains(&ext.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Extension .{ext} is not allowed for {category} files (allowed: {})",
            category.allowed_extensions().join(", ")
        )));
    }

    let max = category.max_size();
    if size > max {
        return Err(AppError::BadRequest(format!(
            "{category} files are limited to {} MB (got {:.2} MB)",
            max / MB,
            size as f64 / MB as f64
        )));
    }
    Ok(())
}

/// Object key for a new upload: `{base}/{yyyy/MM/dd}/{uuid}.{ext}`.
pub fn storage_key(
    category: FileCategory,
    purpose: UploadPurpose,
    date: DateTime<Utc>,
    id: Uuid,
    ext: &str,
) -> String {
    let base = match (purpose, category) {
        (UploadPurpose::Profile, FileCategory::Image) => "public/users/profile",
        _ => category.base_path(),
    };
    format!("{base}/{}/{id}.{ext}", date.format("%Y/%m/%d"))
}
