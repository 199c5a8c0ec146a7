//! Account fields shared by the signup endpoint and the operator CLI.

use validator::{Validate, ValidationError};

use crate::error::AppError;
use crate::password;
use crate::user::{NewUser, Role};

pub const MIN_NICKNAME_LEN: usize = 2;
pub const MAX_NICKNAME_LEN: usize = 20;

/// A new account with its text fields already trimmed.
#[derive(Debug, Clone, Validate)]
pub struct NewAccount {
    /// Bounded by the `users.email` column.
    #[validate(
        email(message = "must be a valid email address"),
        length(max = 50, message = "must be at most 50 characters")
    )]
    pub email: String,
    #[validate(length(min = 8, max = 20, message = "must be 8 to 20 characters"))]
    pub password: String,
    #[validate(custom(function = "valid_nickname"))]
    pub nickname: String,
    #[validate(length(max = 50, message = "must be at most 50 characters"))]
    pub name: Option<String>,
}

impl NewAccount {
    /// Trim email, nickname, and name. A blank name becomes `None`; the password is kept as typed.
    pub fn new(email: &str, password: &str, nickname: &str, name: Option<&str>) -> Self {
        Self {
            email: email.trim().to_string(),
            password: password.to_string(),
            nickname: nickname.trim().to_string(),
            name: name.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string),
        }
    }

    /// Hash the password and build the row to insert.
    pub fn into_new_user(self, role: Role) -> Result<NewUser, AppError> {
        Ok(NewUser {
            password_hash: password::hash(&self.password)?,
            email: self.email,
            name: self.name,
            nickname: self.nickname,
            role,
        })
    }
}

/// Nickname length is counted after surrounding whitespace is removed.
pub fn valid_nickname(value: &str) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if !(MIN_NICKNAME_LEN..=MAX_NICKNAME_LEN).contains(&len) {
        return Err(ValidationError::new("nickname_length")
            .with_message("must be 2 to 20 characters".into()));
    }
    Ok(())
}
