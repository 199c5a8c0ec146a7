use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use folio_core::account::{NewAccount, valid_nickname};
use folio_core::post::PostSuggestion;
use folio_core::traits::FileStorage;
use folio_core::{Page, Post, Stack, StackWithCount, StoredFile, User};

use crate::extract::{not_blank, valid_tags};

fn public_url(storage: &impl FileStorage, key: Option<&str>) -> Option<String> {
    key.map(|k| storage.public_url(k))
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(custom(function = "not_blank"))]
    pub password: String,
}

/// Checked with the [`NewAccount`] rules after trimming.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub nickname: String,
    pub name: Option<String>,
}

impl SignupRequest {
    pub fn to_account(&self) -> NewAccount {
        NewAccount::new(
            &self.email,
            &self.password,
            &self.nickname,
            self.name.as_deref(),
        )
    }
}

impl Validate for SignupRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.to_account().validate()
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub user: MeResponse,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub nickname: String,
    pub position: Option<String>,
    pub about: Option<String>,
    pub role: String,
    pub profile_image_url: Option<String>,
}

impl MeResponse {
    pub fn new(user: User, storage: &impl FileStorage) -> Self {
        Self {
            profile_image_url: public_url(storage, user.profile_image_path.as_deref()),
            id: user.id,
            email: user.email,
            name: user.name,
            nickname: user.nickname,
            position: user.position,
            about: user.about,
            role: user.role.to_string(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PublicUserResponse {
    pub nickname: String,
    pub profile_image_url: Option<String>,
    pub position: Option<String>,
    pub about: Option<String>,
}

impl PublicUserResponse {
    pub fn new(user: User, storage: &impl FileStorage) -> Self {
        Self {
            profile_image_url: public_url(storage, user.profile_image_path.as_deref()),
            nickname: user.nickname,
            position: user.position,
            about: user.about,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(custom(function = "valid_nickname"))]
    pub nickname: Option<String>,
    #[validate(length(max = 50, message = "must be at most 50 characters"))]
    pub position: Option<String>,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub about: Option<String>,
    pub profile_image_file_id: Option<i64>,
    #[serde(default)]
    pub remove_profile_image: bool,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(custom(function = "not_blank"))]
    pub current_password: String,
    #[validate(custom(function = "not_blank"))]
    pub new_password: String,
    #[validate(custom(function = "not_blank"))]
    pub confirm_password: String,
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

/// Body of post create and update. `remove_thumbnail` only applies to updates.
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct PostRequest {
    /// One of `core`, `architecture`, `troubleshooting`, `essay`.
    pub post_type: String,
    #[validate(
        custom(function = "not_blank"),
        length(max = 50, message = "must be at most 50 characters")
    )]
    pub title: String,
    #[validate(
        custom(function = "not_blank"),
        length(max = 200, message = "must be at most 200 characters")
    )]
    pub excerpt: String,
    #[validate(
        custom(function = "not_blank"),
        length(max = 50000, message = "must be at most 50000 characters")
    )]
    pub content: String,
    #[validate(
        length(max = 10, message = "at most 10 tags are allowed"),
        custom(function = "valid_tags")
    )]
    pub tags: Option<Vec<String>>,
    /// Stack names. Unknown names are ignored.
    pub stacks: Option<Vec<String>>,
    pub thumbnail_file_id: Option<i64>,
    #[serde(default)]
    pub remove_thumbnail: bool,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct PostSearchQuery {
    pub post_type: Option<String>,
    pub stack: Option<String>,
    pub keyword: Option<String>,
    pub nickname: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct AutocompleteQuery {
    pub keyword: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthorResponse {
    pub nickname: String,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PostSummaryResponse {
    pub id: i64,
    pub post_type: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub thumbnail_url: Option<String>,
    pub tags: Vec<String>,
    pub stacks: Vec<String>,
    pub author: AuthorResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl PostSummaryResponse {
    pub fn new(post: Post, storage: &impl FileStorage) -> Self {
        Self {
            id: post.id,
            post_type: post.post_type.to_string(),
            title: post.title,
            slug: post.slug,
            excerpt: post.excerpt,
            thumbnail_url: public_url(storage, post.thumbnail_path.as_deref()),
            tags: post.tags,
            stacks: post.stacks,
            author: AuthorResponse {
                profile_image_url: public_url(storage, post.author.profile_image_path.as_deref()),
                nickname: post.author.nickname,
            },
            created_at: post.created_at,
            updated_at: post.updated_at,
            deleted_at: post.deleted_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PostDetailResponse {
    pub id: i64,
    pub post_type: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub status: String,
    pub thumbnail_url: Option<String>,
    pub tags: Vec<String>,
    pub stacks: Vec<String>,
    pub author: AuthorResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub related: Vec<PostSummaryResponse>,
}

impl PostDetailResponse {
    pub fn new(post: Post, related: Vec<Post>, storage: &impl FileStorage) -> Self {
        Self {
            id: post.id,
            post_type: post.post_type.to_string(),
            status: post.status.to_string(),
            thumbnail_url: public_url(storage, post.thumbnail_path.as_deref()),
            author: AuthorResponse {
                profile_image_url: public_url(storage, post.author.profile_image_path.as_deref()),
                nickname: post.author.nickname,
            },
            title: post.title,
            slug: post.slug,
            excerpt: post.excerpt,
            content: post.content,
            tags: post.tags,
            stacks: post.stacks,
            created_at: post.created_at,
            updated_at: post.updated_at,
            deleted_at: post.deleted_at,
            related: related
                .into_iter()
                .map(|p| PostSummaryResponse::new(p, storage))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PostPageResponse {
    pub content: Vec<PostSummaryResponse>,
    pub total_elements: i64,
    pub total_pages: u32,
    pub current_page: u32,
    pub size: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PostPageResponse {
    pub fn new(page: Page<Post>, storage: &impl FileStorage) -> Self {
        let page = page.map(|p| PostSummaryResponse::new(p, storage));
        Self {
            content: page.content,
            total_elements: page.total_elements,
            total_pages: page.total_pages,
            current_page: page.current_page,
            size: page.size,
            has_next: page.has_next,
            has_previous: page.has_previous,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SuggestionResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub nickname: String,
}

impl From<PostSuggestion> for SuggestionResponse {
    fn from(s: PostSuggestion) -> Self {
        Self {
            id: s.id,
            title: s.title,
            slug: s.slug,
            nickname: s.nickname,
        }
    }
}

// ---------------------------------------------------------------------------
// Stacks
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct StackRequest {
    #[validate(
        custom(function = "not_blank"),
        length(max = 50, message = "must be at most 50 characters")
    )]
    pub name: String,
    /// Stack group key; defaults to `etc` on create and keeps the current group on update.
    pub group: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct PopularQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StackResponse {
    pub id: i64,
    pub name: String,
    pub group: String,
}

impl From<Stack> for StackResponse {
    fn from(s: Stack) -> Self {
        Self {
            id: s.id,
            name: s.name,
            group: s.group.to_string(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StackCountResponse {
    pub id: i64,
    pub name: String,
    pub group: String,
    pub post_count: i64,
}

impl From<StackWithCount> for StackCountResponse {
    fn from(s: StackWithCount) -> Self {
        Self {
            id: s.id,
            name: s.name,
            group: s.group.to_string(),
            post_count: s.post_count,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PopularStackResponse {
    pub rank: u32,
    pub id: i64,
    pub name: String,
    pub post_count: i64,
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Multipart form accepted by the upload endpoint. Only used for the OpenAPI document.
#[derive(utoipa::ToSchema)]
pub struct FileUploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// `post` (default) or `profile`.
    pub purpose: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct FileUploadResponse {
    pub id: i64,
    pub original_name: String,
    pub url: String,
    pub file_size: i64,
    pub category: String,
}

impl FileUploadResponse {
    pub fn new(file: StoredFile, storage: &impl FileStorage) -> Self {
        Self {
            url: storage.public_url(&file.storage_key),
            id: file.id,
            original_name: file.original_name,
            file_size: file.size,
            category: file.category.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Field name to message, for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}
