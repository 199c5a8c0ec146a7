use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Editorial classification of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Core,
    Architecture,
    Troubleshooting,
    Essay,
}

impl PostType {
    pub const ALL: [PostType; 4] = [
        PostType::Core,
        PostType::Architecture,
        PostType::Troubleshooting,
        PostType::Essay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Core => "core",
            PostType::Architecture => "architecture",
            PostType::Troubleshooting => "troubleshooting",
            PostType::Essay => "essay",
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PostType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "core" => Ok(PostType::Core),
            "architecture" => Ok(PostType::Architecture),
            "troubleshooting" => Ok(PostType::Troubleshooting),
            "essay" => Ok(PostType::Essay),
            _ => Err(AppError::BadRequest(format!("Unknown post type: {s}"))),
        }
    }
}

/// Lifecycle status of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PostStatus {
    Published,
    Deleted,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Published => "PUBLISHED",
            PostStatus::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PUBLISHED" => Ok(PostStatus::Published),
            "DELETED" => Ok(PostStatus::Deleted),
            _ => Err(AppError::BadRequest(format!("Unknown post status: {s}"))),
        }
    }
}

/// Role of a file attached to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFileKind {
    Thumbnail,
    Content,
}

impl PostFileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostFileKind::Thumbnail => "THUMBNAIL",
            PostFileKind::Content => "CONTENT",
        }
    }
}

/// Public face of a post's author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub nickname: String,
    pub profile_image_path: Option<String>,
}

/// A post with its tags and stacks resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub author: Author,
    pub post_type: PostType,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub status: PostStatus,
    pub thumbnail_path: Option<String>,
    /// Free-form tags in author order.
    pub tags: Vec<String>,
    /// Stack names, sorted by name.
    pub stacks: Vec<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn is_deleted(&self) -> bool {
        self.status == PostStatus::Deleted
    }
}

/// Thumbnail reference resolved from an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub file_id: i64,
    pub path: String,
}

/// Input for creating a post. Slug and file ids are resolved by the caller.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: i64,
    pub post_type: PostType,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub tags: Vec<String>,
    pub stack_names: Vec<String>,
    pub thumbnail: Option<Thumbnail>,
    pub content_file_ids: BTreeSet<i64>,
}

/// What to do with a post's thumbnail during an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailChange {
    Keep,
    Remove,
    Replace(Thumbnail),
}

/// Full update of a post's editable fields.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub post_type: PostType,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    /// `None` keeps the current tags.
    pub tags: Option<Vec<String>>,
    /// `None` keeps the current stacks.
    pub stack_names: Option<Vec<String>>,
    pub thumbnail: ThumbnailChange,
    pub content_file_ids: BTreeSet<i64>,
}

/// Search filters shared by the author and public listings.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub post_type: Option<PostType>,
    pub stack: Option<String>,
    pub keyword: Option<String>,
    pub nickname: Option<String>,
}

impl PostFilter {
    /// Trimmed keyword, or `None` when blank.
    pub fn keyword(&self) -> Option<&str> {
        non_blank(self.keyword.as_deref())
    }

    /// Trimmed stack name, or `None` when blank.
    pub fn stack(&self) -> Option<&str> {
        non_blank(self.stack.as_deref())
    }

    pub fn nickname(&self) -> Option<&str> {
        non_blank(self.nickname.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Lightweight search suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSuggestion {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub nickname: String,
}

/// Escape `%`, `_` and `\` so a keyword matches literally inside `LIKE`.
pub fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for ch in keyword.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
