use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use uuid::Uuid;

use folio_core::upload::{self, UploadPurpose};
use folio_core::{AppError, FileCategory, FileStorage, NewStoredFile};

use crate::auth::CurrentUser;
use crate::dto::{FileUploadForm, FileUploadResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// The parts of a multipart upload the handler cares about.
struct UploadForm {
    file_name: String,
    content_type: Option<String>,
    data: Vec<u8>,
    purpose: Option<String>,
}

fn multipart_error(e: MultipartError) -> AppError {
    AppError::BadRequest(format!("Malformed multipart body: {}", e.body_text()))
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut file = None;
    let mut purpose = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some((file_name, content_type, data.to_vec()));
            }
            Some("purpose") => {
                purpose = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let (file_name, content_type, data) =
        file.ok_or_else(|| AppError::field("file", "File is required"))?;
    Ok(UploadForm {
        file_name,
        content_type,
        data,
        purpose,
    })
}

#[utoipa::path(
    post,
    path = "/api/files/upload",
    request_body(content = FileUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File stored", body = FileUploadResponse),
        (status = 400, description = "Unsupported, oversized, or malformed upload", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("cookie" = []), ("bearer" = [])),
    tag = "files"
)]
pub async fn upload(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_form(multipart).await?;
    let purpose = UploadPurpose::parse(form.purpose.as_deref())?;
    let category = upload::resolve_category(form.content_type.as_deref())?;

    if purpose == UploadPurpose::Profile && category != FileCategory::Image {
        return Err(AppError::BadRequest("Profile images must be image files".into()).into());
    }

    let file_name = form.file_name.trim().to_string();
    let size = form.data.len() as u64;
    upload::validate(&file_name, size, category)?;
    let ext = upload::extension(&file_name)
        .ok_or_else(|| AppError::BadRequest("File extension is missing".into()))?;

    let key = upload::storage_key(category, purpose, Utc::now(), Uuid::new_v4(), &ext);
    state.storage.put(&key, form.data).await?;

    let record = NewStoredFile {
        original_name: file_name,
        storage_key: key.clone(),
        content_type: form.content_type.unwrap_or_default(),
        size: size as i64,
        category,
    };
    let stored = match state.db.file_repo().insert(&record).await {
        Ok(stored) => stored,
        Err(e) => {
            if let Err(cleanup) = state.storage.delete(&key).await {
                tracing::warn!(
                    key = %key,
                    error = %cleanup,
                    "Failed to remove object after insert error"
                );
            }
            return Err(e.into());
        }
    };
    tracing::info!(
        user_id = current.id,
        file_id = stored.id,
        category = %category,
        size,
        "File uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(FileUploadResponse::new(stored, &state.storage)),
    ))
}
