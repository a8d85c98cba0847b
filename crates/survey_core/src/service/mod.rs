//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate visibility, access checks and repository calls into the
//!   survey, question, option and response use cases.
//! - Keep transport layers decoupled from storage details.

pub mod option_service;
pub mod question_service;
pub mod response_service;
pub mod stats_service;
pub mod survey_service;

use crate::error::ServiceError;
use uuid::Uuid;

/// Reads a required parent reference from caller input.
///
/// Missing or blank is `FieldRequired`; a value that is not a UUID cannot
/// name an existing row, so it is `NotFound`.
pub(crate) fn parse_parent_ref(
    raw: Option<&str>,
    field: &'static str,
) -> Result<Uuid, ServiceError> {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Err(ServiceError::FieldRequired { field });
    };
    Uuid::parse_str(value).map_err(|_| ServiceError::not_found(field, value))
}
