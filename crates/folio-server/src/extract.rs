use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors};

use folio_core::AppError;

use crate::error::ApiError;

/// JSON body that has been deserialized and then checked with [`Validate`].
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            AppError::ValidationError {
                errors: BTreeMap::from([("body".to_string(), rejection.body_text())]),
            }
        })?;

        value.validate().map_err(|e| to_app_error(&e))?;
        Ok(Self(value))
    }
}

/// Flatten validator output into one message per field.
pub fn to_app_error(errors: &ValidationErrors) -> AppError {
    let errors = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let message = errs
                .first()
                .and_then(|e| e.message.as_ref())
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("{field} is invalid"));
            (field.to_string(), message)
        })
        .collect();
    AppError::ValidationError { errors }
}

/// Rejects empty and whitespace-only strings.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

/// Every tag must be 1 to 30 characters.
pub fn valid_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.iter().any(|t| t.trim().is_empty() || t.chars().count() > 30) {
        return Err(ValidationError::new("tag_length")
            .with_message("each tag must be 1 to 30 characters".into()));
    }
    Ok(())
}
