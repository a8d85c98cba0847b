//! Response listing and ingestion service.
//!
//! # Responsibility
//! - List responses within the actor's visibility.
//! - Ingest anonymous submissions: derive the source address, validate the
//!   payload and persist the response graph atomically.
//!
//! # Invariants
//! - A submission that fails validation persists nothing.
//! - The stored `ip_address` is always the derived source address.
//! - Logs carry ids and counts only, never emails or answer text.

use crate::access::visibility::visible_responses;
use crate::error::ServiceError;
use crate::ingest::source_address::RequestOrigin;
use crate::ingest::submission::{
    check_references, inject_source_address, parse_submission, IngestPolicy,
};
use crate::model::actor::Actor;
use crate::model::field_error::FieldErrors;
use crate::model::response::Response;
use crate::model::survey::SurveyId;
use crate::repo::response_repo::ResponseRepository;
use crate::repo::survey_repo::SurveyRepository;
use log::{info, warn};
use serde_json::Value;
use std::time::Instant;

/// Response service facade.
pub struct ResponseService<S: SurveyRepository, R: ResponseRepository> {
    surveys: S,
    responses: R,
    policy: IngestPolicy,
}

impl<S: SurveyRepository, R: ResponseRepository> ResponseService<S, R> {
    /// Creates service with the default ingest policy.
    pub fn new(surveys: S, responses: R) -> Self {
        Self::with_policy(surveys, responses, IngestPolicy::default())
    }

    pub fn with_policy(surveys: S, responses: R, policy: IngestPolicy) -> Self {
        Self {
            surveys,
            responses,
            policy,
        }
    }

    /// Lists responses visible to `actor`, newest first.
    ///
    /// Returns `NotFound` only when `survey_id` names no survey.
    pub fn list(
        &self,
        actor: &Actor,
        survey_id: Option<SurveyId>,
    ) -> Result<Vec<Response>, ServiceError> {
        visible_responses(&self.surveys, &self.responses, actor, survey_id)
    }

    /// Validates and stores one submission.
    ///
    /// Any client-supplied `ip_address` is replaced before validation.
    pub fn create(
        &self,
        mut payload: Value,
        origin: &RequestOrigin,
    ) -> Result<Response, ServiceError> {
        let started_at = Instant::now();
        let address = origin.source_address(self.policy.trust_forwarded_for);
        inject_source_address(&mut payload, address.as_deref());

        let submission = match parse_submission(&payload) {
            Ok(submission) => submission,
            Err(errors) => return Err(self.reject(errors, started_at)),
        };
        let errors = check_references(&self.surveys, &submission, self.policy)?;
        if !errors.is_empty() {
            return Err(self.reject(errors, started_at));
        }

        let response = self.responses.create_response(&submission)?;
        info!(
            "event=response_ingest module=ingest status=ok survey_id={} response_id={} answers={} duration_ms={}",
            response.survey_id,
            response.id,
            response.answers.len(),
            started_at.elapsed().as_millis()
        );
        Ok(response)
    }

    fn reject(&self, errors: FieldErrors, started_at: Instant) -> ServiceError {
        warn!(
            "event=response_ingest module=ingest status=error error_code=validation_failed fields={} duration_ms={}",
            errors.len(),
            started_at.elapsed().as_millis()
        );
        ServiceError::ValidationFailed(errors)
    }
}
