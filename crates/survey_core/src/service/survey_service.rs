//! Survey use-case service.
//!
//! # Responsibility
//! - List and retrieve surveys within the actor's visibility.
//! - Create surveys owned by the acting user; update, delete and report
//!   statistics for owned surveys.
//!
//! # Invariants
//! - Single-object writes resolve the survey through the visibility scope of
//!   the action first; a survey outside that scope is `NotFound`.
//! - The ownership check runs after the lookup and before any write or
//!   aggregation work.
//! - Deletion cascades to questions, options, responses and answers.

use crate::access::action::{Action, EntityKind};
use crate::access::guard::{ensure_can_mutate, require_standing, AUTHENTICATION_REQUIRED};
use crate::access::visibility::{find_visible_survey, visible_surveys};
use crate::error::ServiceError;
use crate::model::actor::Actor;
use crate::model::survey::{QuestionDetail, Survey, SurveyDetail, SurveyDraft, SurveyId};
use crate::repo::response_repo::ResponseRepository;
use crate::repo::survey_repo::SurveyRepository;
use crate::service::stats_service::{compute_stats, SurveyStats};
use log::info;

/// Survey service facade.
pub struct SurveyService<S: SurveyRepository, R: ResponseRepository> {
    surveys: S,
    responses: R,
}

impl<S: SurveyRepository, R: ResponseRepository> SurveyService<S, R> {
    /// Creates service from repository implementations.
    pub fn new(surveys: S, responses: R) -> Self {
        Self { surveys, responses }
    }

    /// Lists active surveys, newest first.
    pub fn list(&self, actor: &Actor) -> Result<Vec<Survey>, ServiceError> {
        visible_surveys(&self.surveys, actor, Action::List)
    }

    /// Loads one survey with its ordered questions and options.
    pub fn retrieve(&self, actor: &Actor, id: SurveyId) -> Result<SurveyDetail, ServiceError> {
        let survey = find_visible_survey(&self.surveys, actor, Action::Retrieve, id)?
            .ok_or_else(|| ServiceError::not_found("survey", id))?;
        self.load_detail(survey)
    }

    /// Creates a survey owned by the acting user.
    pub fn create(&self, actor: &Actor, draft: &SurveyDraft) -> Result<Survey, ServiceError> {
        require_standing(actor, EntityKind::Survey, Action::Create)?;
        let creator_id = actor
            .id()
            .ok_or(ServiceError::Forbidden(AUTHENTICATION_REQUIRED))?;
        let new_survey = draft.validate_new()?;

        let survey = self.surveys.create_survey(creator_id, &new_survey)?;
        info!(
            "event=survey_create module=service status=ok survey_id={} active={}",
            survey.id, survey.is_active
        );
        Ok(survey)
    }

    /// Replaces title, description and active flag. `title` is required.
    pub fn update(
        &self,
        actor: &Actor,
        id: SurveyId,
        draft: &SurveyDraft,
    ) -> Result<Survey, ServiceError> {
        self.apply_changes(actor, id, draft, Action::Update)
    }

    /// Changes only the fields present in `draft`.
    pub fn partial_update(
        &self,
        actor: &Actor,
        id: SurveyId,
        draft: &SurveyDraft,
    ) -> Result<Survey, ServiceError> {
        self.apply_changes(actor, id, draft, Action::PartialUpdate)
    }

    /// Deletes a survey and everything beneath it.
    pub fn delete(&self, actor: &Actor, id: SurveyId) -> Result<(), ServiceError> {
        let survey = self.resolve_owned(actor, id, Action::Delete)?;
        self.surveys.delete_survey(survey.id)?;
        info!(
            "event=survey_delete module=service status=ok survey_id={}",
            survey.id
        );
        Ok(())
    }

    /// Reports response counts and per-question completion rates.
    pub fn stats(&self, actor: &Actor, id: SurveyId) -> Result<SurveyStats, ServiceError> {
        let survey = self.resolve_owned(actor, id, Action::Stats)?;
        compute_stats(&self.surveys, &self.responses, &survey)
    }

    fn apply_changes(
        &self,
        actor: &Actor,
        id: SurveyId,
        draft: &SurveyDraft,
        action: Action,
    ) -> Result<Survey, ServiceError> {
        let survey = self.resolve_owned(actor, id, action)?;
        let changes = draft.validate_changes(action == Action::PartialUpdate)?;
        let updated = self.surveys.update_survey(survey.id, &changes)?;
        info!(
            "event=survey_update module=service status=ok survey_id={} action={}",
            updated.id,
            action.as_str()
        );
        Ok(updated)
    }

    /// Looks the survey up in the action's creator-only scope, then checks
    /// ownership.
    fn resolve_owned(
        &self,
        actor: &Actor,
        id: SurveyId,
        action: Action,
    ) -> Result<Survey, ServiceError> {
        require_standing(actor, EntityKind::Survey, action)?;
        let survey = find_visible_survey(&self.surveys, actor, action, id)?
            .ok_or_else(|| ServiceError::not_found("survey", id))?;
        ensure_can_mutate(actor, EntityKind::Survey, action, survey.creator_id)?;
        Ok(survey)
    }

    fn load_detail(&self, survey: Survey) -> Result<SurveyDetail, ServiceError> {
        let questions = self
            .surveys
            .list_questions(Some(survey.id))?
            .into_iter()
            .map(|question| -> Result<QuestionDetail, ServiceError> {
                let options = self.surveys.list_options(Some(question.id))?;
                Ok(QuestionDetail { question, options })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SurveyDetail { survey, questions })
    }
}

#[cfg(test)]
mod tests {
    use super::SurveyService;
    use crate::db::open_db_in_memory;
    use crate::error::ErrorKind;
    use crate::model::actor::Actor;
    use crate::model::survey::SurveyDraft;
    use crate::repo::response_repo::SqliteResponseRepository;
    use crate::repo::survey_repo::SqliteSurveyRepository;

    fn draft(title: &str, is_active: bool) -> SurveyDraft {
        SurveyDraft {
            title: Some(title.to_string()),
            description: None,
            is_active: Some(is_active),
        }
    }

    #[test]
    fn create_requires_authentication_and_stamps_creator() {
        let conn = open_db_in_memory().expect("open db");
        let service = SurveyService::new(
            SqliteSurveyRepository::try_new(&conn).expect("survey repo"),
            SqliteResponseRepository::try_new(&conn).expect("response repo"),
        );

        let err = service
            .create(&Actor::anonymous(), &draft("Feedback", true))
            .expect_err("anonymous create");
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let survey = service
            .create(&Actor::user(7), &draft("  Feedback  ", true))
            .expect("create survey");
        assert_eq!(survey.creator_id, 7);
        assert_eq!(survey.title, "Feedback");
    }

    #[test]
    fn partial_update_keeps_absent_fields() {
        let conn = open_db_in_memory().expect("open db");
        let service = SurveyService::new(
            SqliteSurveyRepository::try_new(&conn).expect("survey repo"),
            SqliteResponseRepository::try_new(&conn).expect("response repo"),
        );
        let owner = Actor::user(1);
        let survey = service
            .create(&owner, &draft("Original", true))
            .expect("create survey");

        let changes = SurveyDraft {
            is_active: Some(false),
            ..SurveyDraft::default()
        };
        let updated = service
            .partial_update(&owner, survey.id, &changes)
            .expect("partial update");
        assert_eq!(updated.title, "Original");
        assert!(!updated.is_active);

        let err = service
            .update(&owner, survey.id, &changes)
            .expect_err("full update without title");
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    }

    #[test]
    fn partial_update_with_null_description_clears_it() {
        let conn = open_db_in_memory().expect("open db");
        let service = SurveyService::new(
            SqliteSurveyRepository::try_new(&conn).expect("survey repo"),
            SqliteResponseRepository::try_new(&conn).expect("response repo"),
        );
        let owner = Actor::user(1);
        let created = service
            .create(
                &owner,
                &SurveyDraft {
                    description: Some(Some("About".to_string())),
                    ..draft("Original", true)
                },
            )
            .expect("create survey");
        assert_eq!(created.description.as_deref(), Some("About"));

        let untouched: SurveyDraft =
            serde_json::from_value(serde_json::json!({ "title": "Renamed" })).expect("draft");
        let updated = service
            .partial_update(&owner, created.id, &untouched)
            .expect("rename");
        assert_eq!(updated.description.as_deref(), Some("About"));

        let cleared: SurveyDraft =
            serde_json::from_value(serde_json::json!({ "description": null })).expect("draft");
        let updated = service
            .partial_update(&owner, created.id, &cleared)
            .expect("clear description");
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.description, None);
    }

    #[test]
    fn non_owner_update_and_stats_of_active_survey_are_not_found() {
        let conn = open_db_in_memory().expect("open db");
        let service = SurveyService::new(
            SqliteSurveyRepository::try_new(&conn).expect("survey repo"),
            SqliteResponseRepository::try_new(&conn).expect("response repo"),
        );
        let survey = service
            .create(&Actor::user(1), &draft("Public", true))
            .expect("create survey");

        let err = service
            .update(&Actor::user(2), survey.id, &draft("Hijack", true))
            .expect_err("other user update");
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = service
            .stats(&Actor::user(2), survey.id)
            .expect_err("other user stats");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
