//! Question use-case service.
//!
//! # Invariants
//! - Creation checks run in a fixed order: parent reference present, parent
//!   survey exists, actor owns the survey, then field validation.

use crate::access::action::{Action, EntityKind};
use crate::access::guard::ensure_can_mutate;
use crate::access::visibility::visible_questions;
use crate::error::ServiceError;
use crate::model::actor::Actor;
use crate::model::survey::{Question, QuestionDraft, SurveyId};
use crate::repo::survey_repo::SurveyRepository;
use crate::service::parse_parent_ref;
use log::info;

/// Question service facade.
pub struct QuestionService<S: SurveyRepository> {
    surveys: S,
}

impl<S: SurveyRepository> QuestionService<S> {
    /// Creates service from repository implementation.
    pub fn new(surveys: S) -> Self {
        Self { surveys }
    }

    /// Lists questions of one survey, or all questions when unscoped.
    pub fn list(&self, survey_id: Option<SurveyId>) -> Result<Vec<Question>, ServiceError> {
        visible_questions(&self.surveys, survey_id)
    }

    /// Adds a question to a survey owned by `actor`.
    pub fn create(&self, actor: &Actor, draft: &QuestionDraft) -> Result<Question, ServiceError> {
        let survey_id = parse_parent_ref(draft.survey.as_deref(), "survey")?;
        let survey = self
            .surveys
            .get_survey(survey_id)?
            .ok_or_else(|| ServiceError::not_found("survey", survey_id))?;
        ensure_can_mutate(actor, EntityKind::Question, Action::Create, survey.creator_id)?;
        let new_question = draft.validate()?;

        let question = self.surveys.create_question(survey.id, &new_question)?;
        info!(
            "event=question_create module=service status=ok survey_id={} question_id={}",
            survey.id, question.id
        );
        Ok(question)
    }
}
