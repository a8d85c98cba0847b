//! Question option use-case service.
//!
//! # Invariants
//! - Ownership is checked against the survey that owns the parent question.
//! - Creation order: parent reference present, question exists, ownership,
//!   field validation.

use crate::access::action::{Action, EntityKind};
use crate::access::guard::ensure_can_mutate;
use crate::access::visibility::visible_options;
use crate::error::ServiceError;
use crate::model::actor::Actor;
use crate::model::survey::{OptionDraft, QuestionId, QuestionOption};
use crate::repo::survey_repo::SurveyRepository;
use crate::service::parse_parent_ref;
use log::info;

/// Option service facade.
pub struct OptionService<S: SurveyRepository> {
    surveys: S,
}

impl<S: SurveyRepository> OptionService<S> {
    /// Creates service from repository implementation.
    pub fn new(surveys: S) -> Self {
        Self { surveys }
    }

    /// Lists options of one question, or all options when unscoped.
    pub fn list(
        &self,
        question_id: Option<QuestionId>,
    ) -> Result<Vec<QuestionOption>, ServiceError> {
        visible_options(&self.surveys, question_id)
    }

    /// Adds an option to a question whose survey is owned by `actor`.
    pub fn create(
        &self,
        actor: &Actor,
        draft: &OptionDraft,
    ) -> Result<QuestionOption, ServiceError> {
        let question_id = parse_parent_ref(draft.question.as_deref(), "question")?;
        let question = self
            .surveys
            .get_question(question_id)?
            .ok_or_else(|| ServiceError::not_found("question", question_id))?;
        let survey = self
            .surveys
            .get_survey(question.survey_id)?
            .ok_or_else(|| ServiceError::not_found("survey", question.survey_id))?;
        ensure_can_mutate(actor, EntityKind::Option, Action::Create, survey.creator_id)?;
        let new_option = draft.validate()?;

        let option = self.surveys.create_option(question.id, &new_option)?;
        info!(
            "event=option_create module=service status=ok question_id={} option_id={}",
            question.id, option.id
        );
        Ok(option)
    }
}
