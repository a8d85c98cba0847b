//! Read-scoping for survey core entities.
//!
//! # Responsibility
//! - Decide which rows an actor may see for a given action.
//! - Apply the optional `survey_id` / `question_id` list parameters.
//!
//! # Invariants
//! - Lack of standing narrows the set (possibly to empty); it never errors.
//! - The only error raised here is `NotFound` for an unknown `survey_id`
//!   when listing responses.
//! - Survey and response sets are ordered newest first; question and option
//!   sets are ordered by `order`.

use crate::access::action::{Action, EntityKind};
use crate::error::ServiceError;
use crate::model::actor::Actor;
use crate::model::field_error::FieldErrors;
use crate::model::response::Response;
use crate::model::survey::{Question, QuestionId, QuestionOption, Survey, SurveyId};
use crate::repo::response_repo::{ResponseFilter, ResponseRepository};
use crate::repo::survey_repo::{SurveyFilter, SurveyRepository};
use uuid::Uuid;

pub const SURVEY_ID_PARAM: &str = "survey_id";
pub const QUESTION_ID_PARAM: &str = "question_id";

/// Optional scoping parameters accepted by list actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListParams {
    pub survey_id: Option<SurveyId>,
    pub question_id: Option<QuestionId>,
}

impl ListParams {
    /// Parses raw query pairs. Blank values count as absent; unknown keys are ignored.
    pub fn from_query<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, ServiceError> {
        let mut params = Self::default();
        let mut errors = FieldErrors::new();
        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let slot = match key {
                SURVEY_ID_PARAM => &mut params.survey_id,
                QUESTION_ID_PARAM => &mut params.question_id,
                _ => continue,
            };
            match Uuid::parse_str(value) {
                Ok(id) => *slot = Some(id),
                Err(_) => errors.push(key, format!("\"{value}\" is not a valid UUID.")),
            }
        }
        errors.into_result()?;
        Ok(params)
    }
}

/// A visibility-narrowed, ordered result set.
#[derive(Debug, Clone, PartialEq)]
pub enum Visible {
    Surveys(Vec<Survey>),
    Questions(Vec<Question>),
    Options(Vec<QuestionOption>),
    Responses(Vec<Response>),
}

impl Visible {
    pub fn len(&self) -> usize {
        match self {
            Self::Surveys(items) => items.len(),
            Self::Questions(items) => items.len(),
            Self::Options(items) => items.len(),
            Self::Responses(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Survey predicate for `actor` performing `action`.
pub fn survey_filter(actor: &Actor, action: Action) -> SurveyFilter {
    match (action, actor.id()) {
        (Action::List, _) => SurveyFilter::Active,
        (_, Some(_)) if actor.is_superuser() => SurveyFilter::All,
        (Action::Retrieve, Some(actor_id)) => SurveyFilter::ActiveOrCreatedBy(actor_id),
        (Action::Retrieve, None) => SurveyFilter::Active,
        (_, Some(actor_id)) => SurveyFilter::CreatedBy(actor_id),
        (_, None) => SurveyFilter::Nothing,
    }
}

/// Response predicate for `actor`, given the already resolved `survey_id` target.
pub fn response_filter(actor: &Actor, target: Option<&Survey>) -> ResponseFilter {
    let Some(actor_id) = actor.id() else {
        return ResponseFilter::Nothing;
    };
    match target {
        Some(survey) if actor.is(survey.creator_id) || actor.is_superuser() => {
            ResponseFilter::Survey(survey.id)
        }
        Some(_) => ResponseFilter::Nothing,
        None if actor.is_superuser() => ResponseFilter::All,
        None => ResponseFilter::SurveyCreatedBy(actor_id),
    }
}

/// Lists surveys visible to `actor` for `action`.
pub fn visible_surveys<S: SurveyRepository>(
    surveys: &S,
    actor: &Actor,
    action: Action,
) -> Result<Vec<Survey>, ServiceError> {
    Ok(surveys.list_surveys(survey_filter(actor, action))?)
}

/// Loads one survey if it is visible to `actor` for `action`.
pub fn find_visible_survey<S: SurveyRepository>(
    surveys: &S,
    actor: &Actor,
    action: Action,
    id: SurveyId,
) -> Result<Option<Survey>, ServiceError> {
    Ok(surveys.find_survey(id, survey_filter(actor, action))?)
}

/// Lists questions, scoped to one survey when `survey_id` is given.
pub fn visible_questions<S: SurveyRepository>(
    surveys: &S,
    survey_id: Option<SurveyId>,
) -> Result<Vec<Question>, ServiceError> {
    Ok(surveys.list_questions(survey_id)?)
}

/// Lists options, scoped to one question when `question_id` is given.
pub fn visible_options<S: SurveyRepository>(
    surveys: &S,
    question_id: Option<QuestionId>,
) -> Result<Vec<QuestionOption>, ServiceError> {
    Ok(surveys.list_options(question_id)?)
}

/// Lists responses visible to `actor`.
///
/// Anonymous actors always see nothing. A `survey_id` that does not resolve
/// is `NotFound`, even when the actor would not be allowed to see it.
pub fn visible_responses<S: SurveyRepository, R: ResponseRepository>(
    surveys: &S,
    responses: &R,
    actor: &Actor,
    survey_id: Option<SurveyId>,
) -> Result<Vec<Response>, ServiceError> {
    if !actor.is_authenticated() {
        return Ok(Vec::new());
    }

    let target = match survey_id {
        Some(id) => Some(
            surveys
                .get_survey(id)?
                .ok_or_else(|| ServiceError::not_found("survey", id))?,
        ),
        None => None,
    };

    Ok(responses.list_responses(response_filter(actor, target.as_ref()))?)
}

/// Resolves the set of `kind` entities `actor` may read for `action`.
pub fn resolve_visible<S: SurveyRepository, R: ResponseRepository>(
    surveys: &S,
    responses: &R,
    actor: &Actor,
    action: Action,
    kind: EntityKind,
    params: &ListParams,
) -> Result<Visible, ServiceError> {
    match kind {
        EntityKind::Survey => visible_surveys(surveys, actor, action).map(Visible::Surveys),
        EntityKind::Question => {
            visible_questions(surveys, params.survey_id).map(Visible::Questions)
        }
        EntityKind::Option => visible_options(surveys, params.question_id).map(Visible::Options),
        EntityKind::Response => {
            visible_responses(surveys, responses, actor, params.survey_id).map(Visible::Responses)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{response_filter, survey_filter, ListParams};
    use crate::access::action::Action;
    use crate::model::actor::Actor;
    use crate::model::survey::Survey;
    use crate::repo::response_repo::ResponseFilter;
    use crate::repo::survey_repo::SurveyFilter;
    use uuid::Uuid;

    fn survey_owned_by(creator_id: i64) -> Survey {
        Survey {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            description: None,
            creator_id,
            created_at: 0,
            updated_at: 0,
            is_active: false,
        }
    }

    #[test]
    fn list_always_shows_active_surveys_only() {
        for actor in [Actor::anonymous(), Actor::user(1), Actor::superuser(2)] {
            assert_eq!(survey_filter(&actor, Action::List), SurveyFilter::Active);
        }
    }

    #[test]
    fn retrieve_scope_depends_on_standing() {
        assert_eq!(
            survey_filter(&Actor::anonymous(), Action::Retrieve),
            SurveyFilter::Active
        );
        assert_eq!(
            survey_filter(&Actor::user(4), Action::Retrieve),
            SurveyFilter::ActiveOrCreatedBy(4)
        );
        assert_eq!(
            survey_filter(&Actor::superuser(5), Action::Retrieve),
            SurveyFilter::All
        );
    }

    #[test]
    fn write_scope_is_own_surveys_only() {
        assert_eq!(
            survey_filter(&Actor::user(4), Action::Delete),
            SurveyFilter::CreatedBy(4)
        );
        assert_eq!(
            survey_filter(&Actor::anonymous(), Action::Update),
            SurveyFilter::Nothing
        );
        assert_eq!(
            survey_filter(&Actor::superuser(5), Action::PartialUpdate),
            SurveyFilter::All
        );
    }

    #[test]
    fn response_scope_narrows_for_non_owners() {
        let survey = survey_owned_by(1);
        assert_eq!(
            response_filter(&Actor::anonymous(), Some(&survey)),
            ResponseFilter::Nothing
        );
        assert_eq!(
            response_filter(&Actor::user(2), Some(&survey)),
            ResponseFilter::Nothing
        );
        assert_eq!(
            response_filter(&Actor::user(1), Some(&survey)),
            ResponseFilter::Survey(survey.id)
        );
        assert_eq!(
            response_filter(&Actor::superuser(3), None),
            ResponseFilter::All
        );
        assert_eq!(
            response_filter(&Actor::user(2), None),
            ResponseFilter::SurveyCreatedBy(2)
        );
    }

    #[test]
    fn query_params_ignore_blank_and_reject_malformed_ids() {
        let id = Uuid::new_v4().to_string();
        let params = ListParams::from_query([("survey_id", id.as_str()), ("question_id", " ")])
            .expect("valid params");
        assert_eq!(params.survey_id.map(|value| value.to_string()), Some(id));
        assert_eq!(params.question_id, None);

        let err = ListParams::from_query([("question_id", "abc")]).expect_err("malformed id");
        assert_eq!(err.kind().as_str(), "validation_failed");
    }
}
