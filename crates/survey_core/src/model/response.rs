//! Collected responses and their answers.
//!
//! # Invariants
//! - A response is written once, together with all of its answers.
//! - `ip_address` is derived from the transport, never taken from the client.
//! - An answer's selected options form a set: no duplicates, sorted on read.

use crate::model::survey::{OptionId, QuestionId, SurveyId};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::net::IpAddr;
use uuid::Uuid;

pub type ResponseId = Uuid;
pub type AnswerId = Uuid;

pub const RESPONDENT_EMAIL_MAX_CHARS: usize = 254;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$",
    )
    .expect("valid email regex")
});

/// Stored response with its answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub id: ResponseId,
    #[serde(rename = "survey")]
    pub survey_id: SurveyId,
    pub respondent_email: Option<String>,
    pub ip_address: Option<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
    pub answers: Vec<Answer>,
}

/// Stored answer with its selected option ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub id: AnswerId,
    #[serde(rename = "question")]
    pub question_id: QuestionId,
    pub text_answer: Option<String>,
    pub selected_options: Vec<OptionId>,
}

/// Validated response graph ready to be persisted in one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResponse {
    pub survey_id: SurveyId,
    pub respondent_email: Option<String>,
    pub ip_address: Option<String>,
    pub answers: Vec<NewAnswer>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnswer {
    pub question_id: QuestionId,
    pub text_answer: Option<String>,
    pub selected_options: BTreeSet<OptionId>,
}

/// Checks email syntax: dotted local part, `@`, and a domain with a TLD.
pub fn is_valid_email(value: &str) -> bool {
    value.chars().count() <= RESPONDENT_EMAIL_MAX_CHARS && EMAIL_RE.is_match(value)
}

/// Parses an IPv4 or IPv6 address into its canonical text form.
pub fn normalize_ip_address(value: &str) -> Option<String> {
    value
        .trim()
        .parse::<IpAddr>()
        .ok()
        .map(|addr| addr.to_string())
}
