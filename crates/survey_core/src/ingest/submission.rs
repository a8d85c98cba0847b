//! Raw response payload validation.
//!
//! # Responsibility
//! - Inject the derived source address into the payload.
//! - Validate payload shape and scalar fields (`parse_submission`).
//! - Validate that every referenced survey/question/option exists
//!   (`check_references`).
//!
//! # Invariants
//! - Failures are reported per field path, e.g. `answers[1].question`.
//! - Selected options are deduplicated while parsing.

use crate::model::field_error::FieldErrors;
use crate::model::response::{
    is_valid_email, normalize_ip_address, NewAnswer, NewResponse, RESPONDENT_EMAIL_MAX_CHARS,
};
use crate::repo::survey_repo::SurveyRepository;
use crate::repo::RepoResult;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use uuid::Uuid;

pub const IP_ADDRESS_FIELD: &str = "ip_address";
const NOT_NULL_MESSAGE: &str = "This field may not be null.";
const NOT_A_STRING_MESSAGE: &str = "Not a valid string.";
const INVALID_EMAIL_MESSAGE: &str = "Enter a valid email address.";
const INVALID_IP_MESSAGE: &str = "Enter a valid IPv4 or IPv6 address.";

/// Rules applied while ingesting a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestPolicy {
    /// Take the source address from `X-Forwarded-For` when present.
    pub trust_forwarded_for: bool,
    /// Reject selected options that belong to a different question than the answer.
    pub enforce_option_membership: bool,
}

impl Default for IngestPolicy {
    fn default() -> Self {
        Self {
            trust_forwarded_for: true,
            enforce_option_membership: false,
        }
    }
}

/// Overwrites `ip_address` in an object payload with the derived address.
///
/// Non-object payloads are left untouched; validation rejects them later.
pub fn inject_source_address(payload: &mut Value, address: Option<&str>) {
    if let Value::Object(map) = payload {
        let value = address.map_or(Value::Null, |addr| Value::String(addr.to_string()));
        map.insert(IP_ADDRESS_FIELD.to_string(), value);
    }
}

/// Validates payload structure and scalar fields.
///
/// References are parsed as ids but not looked up; see [`check_references`].
pub fn parse_submission(payload: &Value) -> Result<NewResponse, FieldErrors> {
    let Value::Object(map) = payload else {
        return Err(FieldErrors::single(
            "non_field_errors",
            expected_dictionary(payload),
        ));
    };

    let mut errors = FieldErrors::new();
    let survey_id = parse_required_pk(map, "survey", &mut errors);
    let respondent_email = parse_email(map.get("respondent_email"), &mut errors);
    let ip_address = parse_ip_address(map.get(IP_ADDRESS_FIELD), &mut errors);

    let mut answers = Vec::new();
    match map.get("answers") {
        None => errors.require("answers"),
        Some(Value::Null) => errors.push("answers", NOT_NULL_MESSAGE),
        Some(Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                match parse_answer(item) {
                    Ok(answer) => answers.push(answer),
                    Err(nested) => errors.extend_nested(&format!("answers[{index}]"), nested),
                }
            }
        }
        Some(other) => errors.push("answers", expected_list(other)),
    }

    errors.into_result()?;
    match survey_id {
        Some(survey_id) => Ok(NewResponse {
            survey_id,
            respondent_email,
            ip_address,
            answers,
        }),
        None => Err(FieldErrors::single("survey", NOT_NULL_MESSAGE)),
    }
}

/// Confirms every referenced survey, question and option exists.
///
/// Returns the collected failures; storage errors propagate.
pub fn check_references<S: SurveyRepository>(
    surveys: &S,
    response: &NewResponse,
    policy: IngestPolicy,
) -> RepoResult<FieldErrors> {
    let mut errors = FieldErrors::new();
    if surveys.get_survey(response.survey_id)?.is_none() {
        errors.push("survey", does_not_exist(&response.survey_id.to_string()));
    }

    for (index, answer) in response.answers.iter().enumerate() {
        let question_exists = surveys.get_question(answer.question_id)?.is_some();
        if !question_exists {
            errors.push(
                format!("answers[{index}].question"),
                does_not_exist(&answer.question_id.to_string()),
            );
        }

        for option_id in &answer.selected_options {
            let field = format!("answers[{index}].selected_options");
            match surveys.get_option(*option_id)? {
                None => errors.push(field, does_not_exist(&option_id.to_string())),
                Some(option)
                    if policy.enforce_option_membership
                        && question_exists
                        && option.question_id != answer.question_id =>
                {
                    errors.push(
                        field,
                        format!(
                            "Option \"{option_id}\" does not belong to question \"{}\".",
                            answer.question_id
                        ),
                    );
                }
                Some(_) => {}
            }
        }
    }
    Ok(errors)
}

fn parse_answer(value: &Value) -> Result<NewAnswer, FieldErrors> {
    let Value::Object(map) = value else {
        return Err(FieldErrors::single(
            "non_field_errors",
            expected_dictionary(value),
        ));
    };

    let mut errors = FieldErrors::new();
    let question_id = parse_required_pk(map, "question", &mut errors);

    let text_answer = match map.get("text_answer") {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(_) => {
            errors.push("text_answer", NOT_A_STRING_MESSAGE);
            None
        }
    };

    let mut selected_options = BTreeSet::new();
    match map.get("selected_options") {
        None => {}
        Some(Value::Null) => errors.push("selected_options", NOT_NULL_MESSAGE),
        Some(Value::Array(items)) => {
            for item in items {
                match parse_pk(item) {
                    Ok(option_id) => {
                        selected_options.insert(option_id);
                    }
                    Err(message) => errors.push("selected_options", message),
                }
            }
        }
        Some(other) => errors.push("selected_options", expected_list(other)),
    }

    errors.into_result()?;
    match question_id {
        Some(question_id) => Ok(NewAnswer {
            question_id,
            text_answer,
            selected_options,
        }),
        None => Err(FieldErrors::single("question", NOT_NULL_MESSAGE)),
    }
}

fn parse_required_pk(
    map: &Map<String, Value>,
    field: &'static str,
    errors: &mut FieldErrors,
) -> Option<Uuid> {
    match map.get(field) {
        None => {
            errors.require(field);
            None
        }
        Some(Value::Null) => {
            errors.push(field, NOT_NULL_MESSAGE);
            None
        }
        Some(value) => match parse_pk(value) {
            Ok(id) => Some(id),
            Err(message) => {
                errors.push(field, message);
                None
            }
        },
    }
}

fn parse_pk(value: &Value) -> Result<Uuid, String> {
    match value {
        Value::String(text) => Uuid::parse_str(text.trim()).map_err(|_| does_not_exist(text)),
        other => Err(format!(
            "Incorrect type. Expected pk value, received {}.",
            json_type_name(other)
        )),
    }
}

fn parse_email(value: Option<&Value>, errors: &mut FieldErrors) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else if trimmed.chars().count() > RESPONDENT_EMAIL_MAX_CHARS {
                errors.push(
                    "respondent_email",
                    format!(
                        "Ensure this field has no more than {RESPONDENT_EMAIL_MAX_CHARS} characters."
                    ),
                );
                None
            } else if !is_valid_email(trimmed) {
                errors.push("respondent_email", INVALID_EMAIL_MESSAGE);
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Some(_) => {
            errors.push("respondent_email", NOT_A_STRING_MESSAGE);
            None
        }
    }
}

fn parse_ip_address(value: Option<&Value>, errors: &mut FieldErrors) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) if text.trim().is_empty() => None,
        Some(Value::String(text)) => match normalize_ip_address(text) {
            Some(address) => Some(address),
            None => {
                errors.push(IP_ADDRESS_FIELD, INVALID_IP_MESSAGE);
                None
            }
        },
        Some(_) => {
            errors.push(IP_ADDRESS_FIELD, INVALID_IP_MESSAGE);
            None
        }
    }
}

fn does_not_exist(pk: &str) -> String {
    format!("Invalid pk \"{pk}\" - object does not exist.")
}

fn expected_dictionary(value: &Value) -> String {
    format!(
        "Invalid data. Expected a dictionary, but got {}.",
        json_type_name(value)
    )
}

fn expected_list(value: &Value) -> String {
    format!(
        "Expected a list of items but got type \"{}\".",
        json_type_name(value)
    )
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

#[cfg(test)]
mod tests {
    use super::{inject_source_address, parse_submission};
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn injection_overwrites_client_value() {
        let mut payload = json!({ "ip_address": "1.1.1.1", "answers": [] });
        inject_source_address(&mut payload, Some("10.0.0.9"));
        assert_eq!(payload["ip_address"], "10.0.0.9");

        inject_source_address(&mut payload, None);
        assert!(payload["ip_address"].is_null());
    }

    #[test]
    fn valid_payload_parses_and_dedups_options() {
        let survey = Uuid::new_v4();
        let question = Uuid::new_v4();
        let option = Uuid::new_v4();
        let payload = json!({
            "survey": survey.to_string(),
            "respondent_email": " alice@example.com ",
            "ip_address": "10.0.0.1",
            "answers": [{
                "question": question.to_string(),
                "text_answer": null,
                "selected_options": [option.to_string(), option.to_string()]
            }]
        });

        let parsed = parse_submission(&payload).expect("payload should validate");
        assert_eq!(parsed.survey_id, survey);
        assert_eq!(parsed.respondent_email.as_deref(), Some("alice@example.com"));
        assert_eq!(parsed.answers.len(), 1);
        assert_eq!(parsed.answers[0].selected_options.len(), 1);
    }

    #[test]
    fn errors_are_collected_per_field_path() {
        let payload = json!({
            "respondent_email": "not-an-email",
            "ip_address": "999.1.1.1",
            "answers": [
                { "question": Uuid::new_v4().to_string() },
                { "question": "bogus", "selected_options": "x" }
            ]
        });

        let errors = parse_submission(&payload).expect_err("payload should be rejected");
        assert!(errors.has_field("survey"));
        assert!(errors.has_field("respondent_email"));
        assert!(errors.has_field("ip_address"));
        assert!(errors.has_field("answers[1].question"));
        assert!(errors.has_field("answers[1].selected_options"));
        assert!(!errors.has_field("answers[0].question"));
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let errors = parse_submission(&json!([1, 2])).expect_err("list payload");
        assert!(errors.has_field("non_field_errors"));
    }

    #[test]
    fn missing_answers_list_is_required() {
        let payload = json!({ "survey": Uuid::new_v4().to_string() });
        let errors = parse_submission(&payload).expect_err("answers are required");
        assert!(errors.has_field("answers"));
    }
}
