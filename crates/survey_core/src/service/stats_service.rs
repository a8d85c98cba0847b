//! Per-survey response statistics.
//!
//! # Invariants
//! - Questions are reported in survey order.
//! - `completion_rate` is a percentage in `[0, 100]` and is `0.0` when the
//!   survey has no responses.
//! - Only answers whose response belongs to the survey are counted.

use crate::error::ServiceError;
use crate::model::survey::{QuestionId, QuestionType, Survey, SurveyId};
use crate::repo::response_repo::ResponseRepository;
use crate::repo::survey_repo::SurveyRepository;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyStats {
    pub survey_id: SurveyId,
    pub total_responses: u64,
    pub questions: Vec<QuestionStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionStats {
    pub id: QuestionId,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub answer_count: u64,
    pub completion_rate: f64,
}

/// Share of responses that answered a question, as a percentage.
pub fn completion_rate(answer_count: u64, total_responses: u64) -> f64 {
    if total_responses == 0 {
        return 0.0;
    }
    answer_count as f64 / total_responses as f64 * 100.0
}

/// Aggregates answer counts for every question of `survey`.
///
/// Access must be checked by the caller before aggregation starts.
pub fn compute_stats<S: SurveyRepository, R: ResponseRepository>(
    surveys: &S,
    responses: &R,
    survey: &Survey,
) -> Result<SurveyStats, ServiceError> {
    let total_responses = responses.count_responses(survey.id)?;
    let questions = surveys
        .list_questions(Some(survey.id))?
        .into_iter()
        .map(|question| -> Result<QuestionStats, ServiceError> {
            let answer_count = responses.count_answers(question.id, survey.id)?;
            Ok(QuestionStats {
                id: question.id,
                text: question.text,
                question_type: question.question_type,
                answer_count,
                completion_rate: completion_rate(answer_count, total_responses),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SurveyStats {
        survey_id: survey.id,
        total_responses,
        questions,
    })
}

#[cfg(test)]
mod tests {
    use super::completion_rate;

    #[test]
    fn completion_rate_is_zero_without_responses() {
        assert_eq!(completion_rate(0, 0), 0.0);
        assert_eq!(completion_rate(3, 0), 0.0);
    }

    #[test]
    fn completion_rate_is_a_percentage() {
        assert_eq!(completion_rate(3, 4), 75.0);
        assert_eq!(completion_rate(4, 4), 100.0);
        assert_eq!(completion_rate(0, 4), 0.0);
    }
}
