//! Survey authoring tree: surveys, questions and options.
//!
//! # Responsibility
//! - Define stored records and nested read models for the authoring tree.
//! - Validate caller drafts into typed inserts.
//!
//! # Invariants
//! - `creator_id` is assigned from the acting user, never from input.
//! - Children sort by `order ASC`; equal orders keep insertion order.

use crate::model::actor::ActorId;
use crate::model::field_error::FieldErrors;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

pub type SurveyId = Uuid;
pub type QuestionId = Uuid;
pub type OptionId = Uuid;

pub const SURVEY_TITLE_MAX_CHARS: usize = 255;
pub const QUESTION_TEXT_MAX_CHARS: usize = 500;
pub const OPTION_TEXT_MAX_CHARS: usize = 255;

/// Kind of input a question collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    ShortText,
    LongText,
    SingleChoice,
    MultipleChoice,
    Rating,
    Date,
}

impl QuestionType {
    pub const ALL: [QuestionType; 6] = [
        Self::ShortText,
        Self::LongText,
        Self::SingleChoice,
        Self::MultipleChoice,
        Self::Rating,
        Self::Date,
    ];

    /// Stable storage and wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ShortText => "short_text",
            Self::LongText => "long_text",
            Self::SingleChoice => "single_choice",
            Self::MultipleChoice => "multiple_choice",
            Self::Rating => "rating",
            Self::Date => "date",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == value)
    }
}

/// Stored survey row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Survey {
    pub id: SurveyId,
    pub title: String,
    pub description: Option<String>,
    pub creator_id: ActorId,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds, refreshed on every update.
    pub updated_at: i64,
    pub is_active: bool,
}

/// Survey with its ordered questions and their options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyDetail {
    #[serde(flatten)]
    pub survey: Survey,
    pub questions: Vec<QuestionDetail>,
}

/// Stored question row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(rename = "survey")]
    pub survey_id: SurveyId,
    pub text: String,
    pub question_type: QuestionType,
    pub required: bool,
    pub order: i64,
}

/// Question with its ordered options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionDetail {
    #[serde(flatten)]
    pub question: Question,
    pub options: Vec<QuestionOption>,
}

/// Stored option row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionOption {
    pub id: OptionId,
    #[serde(rename = "question")]
    pub question_id: QuestionId,
    pub text: String,
    pub order: i64,
}

/// Caller input for creating or updating a survey.
///
/// `description` distinguishes an absent field (`None`) from an explicit
/// `null` (`Some(None)`), which clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SurveyDraft {
    pub title: Option<String>,
    #[serde(deserialize_with = "present_field")]
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
}

fn present_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Validated survey insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSurvey {
    pub title: String,
    pub description: Option<String>,
    pub is_active: bool,
}

/// Validated survey update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurveyChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl SurveyDraft {
    /// Validates a create request. `is_active` defaults to `true`.
    pub fn validate_new(&self) -> Result<NewSurvey, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = match self.title.as_deref() {
            Some(value) => validate_text(&mut errors, "title", value, SURVEY_TITLE_MAX_CHARS),
            None => {
                errors.require("title");
                None
            }
        };
        let Some(title) = title else {
            return Err(errors);
        };

        Ok(NewSurvey {
            title,
            description: normalize_optional_text(
                self.description.as_ref().and_then(Option::as_deref),
            ),
            is_active: self.is_active.unwrap_or(true),
        })
    }

    /// Validates an update request.
    ///
    /// A full update requires `title`; a partial update requires nothing.
    /// Absent fields are left untouched in both modes.
    pub fn validate_changes(&self, partial: bool) -> Result<SurveyChanges, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = match self.title.as_deref() {
            Some(value) => validate_text(&mut errors, "title", value, SURVEY_TITLE_MAX_CHARS),
            None => {
                if !partial {
                    errors.require("title");
                }
                None
            }
        };
        errors.into_result()?;

        Ok(SurveyChanges {
            title,
            description: self
                .description
                .as_ref()
                .map(|value| normalize_optional_text(value.as_deref())),
            is_active: self.is_active,
        })
    }
}

/// Caller input for creating a question.
///
/// `survey` is the raw parent reference as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QuestionDraft {
    pub survey: Option<String>,
    pub text: Option<String>,
    pub question_type: Option<String>,
    pub required: Option<bool>,
    pub order: Option<i64>,
}

/// Validated question fields, parent excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub text: String,
    pub question_type: QuestionType,
    pub required: bool,
    pub order: i64,
}

impl QuestionDraft {
    pub fn validate(&self) -> Result<NewQuestion, FieldErrors> {
        let mut errors = FieldErrors::new();
        let text = match self.text.as_deref() {
            Some(value) => validate_text(&mut errors, "text", value, QUESTION_TEXT_MAX_CHARS),
            None => {
                errors.require("text");
                None
            }
        };
        let question_type = match self.question_type.as_deref() {
            Some(value) => {
                let parsed = QuestionType::parse(value.trim());
                if parsed.is_none() {
                    errors.push(
                        "question_type",
                        format!("\"{value}\" is not a valid choice."),
                    );
                }
                parsed
            }
            None => {
                errors.require("question_type");
                None
            }
        };

        match (text, question_type) {
            (Some(text), Some(question_type)) => Ok(NewQuestion {
                text,
                question_type,
                required: self.required.unwrap_or(false),
                order: self.order.unwrap_or(0),
            }),
            _ => Err(errors),
        }
    }
}

/// Caller input for creating an option.
///
/// `question` is the raw parent reference as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OptionDraft {
    pub question: Option<String>,
    pub text: Option<String>,
    pub order: Option<i64>,
}

/// Validated option fields, parent excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOption {
    pub text: String,
    pub order: i64,
}

impl OptionDraft {
    pub fn validate(&self) -> Result<NewOption, FieldErrors> {
        let mut errors = FieldErrors::new();
        let text = match self.text.as_deref() {
            Some(value) => validate_text(&mut errors, "text", value, OPTION_TEXT_MAX_CHARS),
            None => {
                errors.require("text");
                None
            }
        };
        let Some(text) = text else {
            return Err(errors);
        };

        Ok(NewOption {
            text,
            order: self.order.unwrap_or(0),
        })
    }
}

/// Trims and checks a required text field, recording failures in `errors`.
fn validate_text(
    errors: &mut FieldErrors,
    field: &str,
    value: &str,
    max_chars: usize,
) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(field, "This field may not be blank.");
        return None;
    }
    if trimmed.chars().count() > max_chars {
        errors.push(
            field,
            format!("Ensure this field has no more than {max_chars} characters."),
        );
        return None;
    }
    Some(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
