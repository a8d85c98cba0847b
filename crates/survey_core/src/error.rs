//! Caller-facing error for survey core operations.
//!
//! # Invariants
//! - Each variant maps to exactly one stable status signal via `kind()`.
//! - Visibility narrowing is never reported through this type.

use crate::model::field_error::FieldErrors;
use crate::repo::RepoError;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable status signal for the request layer to bind to transport codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    FieldRequired,
    NotFound,
    Forbidden,
    ValidationFailed,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FieldRequired => "field_required",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::ValidationFailed => "validation_failed",
            Self::Internal => "internal",
        }
    }
}

#[derive(Debug)]
pub enum ServiceError {
    /// Mandatory cross-reference field missing from input.
    FieldRequired { field: &'static str },
    /// Referenced entity does not exist or is not visible to the actor.
    NotFound { entity: &'static str, id: String },
    /// Actor lacks the standing required for the attempted action.
    Forbidden(&'static str),
    /// Input failed field-level validation.
    ValidationFailed(FieldErrors),
    /// Storage failure.
    Repo(RepoError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FieldRequired { .. } => ErrorKind::FieldRequired,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::ValidationFailed(_) => ErrorKind::ValidationFailed,
            Self::Repo(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FieldRequired { field } => write!(f, "{field}: This field is required."),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Forbidden(message) => write!(f, "{message}"),
            Self::ValidationFailed(errors) => write!(f, "validation failed: {errors}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ValidationFailed(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::not_found(entity, id),
            other => Self::Repo(other),
        }
    }
}

impl From<FieldErrors> for ServiceError {
    fn from(value: FieldErrors) -> Self {
        Self::ValidationFailed(value)
    }
}
