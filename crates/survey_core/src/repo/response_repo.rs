//! Response repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist a response together with its answers and option selections.
//! - Provide the counts the statistics aggregator is built on.
//!
//! # Invariants
//! - `create_response` writes the whole graph in one `IMMEDIATE` transaction;
//!   any failure leaves no row behind.
//! - Response listings are ordered `created_at DESC`, newest insert first on ties.

use crate::model::actor::ActorId;
use crate::model::response::{Answer, NewResponse, Response, ResponseId};
use crate::model::survey::{QuestionId, SurveyId};
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const RESPONSE_SELECT_SQL: &str = "SELECT
    r.id AS id,
    r.survey_id AS survey_id,
    r.respondent_email AS respondent_email,
    r.ip_address AS ip_address,
    r.created_at AS created_at
FROM responses r";

/// Row predicate over `responses`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFilter {
    /// Every response.
    All,
    /// Responses submitted to one survey.
    Survey(SurveyId),
    /// Responses to any survey created by the given user.
    SurveyCreatedBy(ActorId),
    /// Matches no row.
    Nothing,
}

/// Repository interface for responses and answer statistics.
pub trait ResponseRepository {
    /// Persists the response graph atomically and returns it materialized.
    fn create_response(&self, response: &NewResponse) -> RepoResult<Response>;
    fn get_response(&self, id: ResponseId) -> RepoResult<Option<Response>>;
    /// Lists responses matching `filter`, newest first.
    fn list_responses(&self, filter: ResponseFilter) -> RepoResult<Vec<Response>>;
    /// Counts responses submitted to `survey_id`.
    fn count_responses(&self, survey_id: SurveyId) -> RepoResult<u64>;
    /// Counts every stored response.
    fn count_all_responses(&self) -> RepoResult<u64>;
    /// Counts answers to `question_id` whose response belongs to `survey_id`.
    fn count_answers(&self, question_id: QuestionId, survey_id: SurveyId) -> RepoResult<u64>;
}

/// SQLite-backed response repository.
pub struct SqliteResponseRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteResponseRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["responses", "answers", "answer_selected_options"])?;
        Ok(Self { conn })
    }
}

impl ResponseRepository for SqliteResponseRepository<'_> {
    fn create_response(&self, response: &NewResponse) -> RepoResult<Response> {
        let response_id = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO responses (
                id,
                survey_id,
                respondent_email,
                ip_address
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                response_id.to_string(),
                response.survey_id.to_string(),
                response.respondent_email.as_deref(),
                response.ip_address.as_deref(),
            ],
        )?;

        for answer in &response.answers {
            let answer_id = Uuid::new_v4().to_string();
            tx.execute(
                "INSERT INTO answers (
                    id,
                    response_id,
                    question_id,
                    text_answer
                ) VALUES (?1, ?2, ?3, ?4);",
                params![
                    answer_id.as_str(),
                    response_id.to_string(),
                    answer.question_id.to_string(),
                    answer.text_answer.as_deref(),
                ],
            )?;

            for option_id in &answer.selected_options {
                tx.execute(
                    "INSERT OR IGNORE INTO answer_selected_options (answer_id, option_id)
                     VALUES (?1, ?2);",
                    params![answer_id.as_str(), option_id.to_string()],
                )?;
            }
        }

        tx.commit()?;

        self.get_response(response_id)?.ok_or(RepoError::NotFound {
            entity: "response",
            id: response_id,
        })
    }

    fn get_response(&self, id: ResponseId) -> RepoResult<Option<Response>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RESPONSE_SELECT_SQL} WHERE r.id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_response_row(self.conn, row)?));
        }
        Ok(None)
    }

    fn list_responses(&self, filter: ResponseFilter) -> RepoResult<Vec<Response>> {
        let mut bind_values: Vec<Value> = Vec::new();
        let predicate = match filter {
            ResponseFilter::All => "1 = 1",
            ResponseFilter::Survey(survey_id) => {
                bind_values.push(Value::Text(survey_id.to_string()));
                "r.survey_id = ?"
            }
            ResponseFilter::SurveyCreatedBy(actor_id) => {
                bind_values.push(Value::Integer(actor_id));
                "r.survey_id IN (SELECT id FROM surveys WHERE creator_id = ?)"
            }
            ResponseFilter::Nothing => return Ok(Vec::new()),
        };

        let sql = format!(
            "{RESPONSE_SELECT_SQL} WHERE {predicate} ORDER BY r.created_at DESC, r.rowid DESC;"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut responses = Vec::new();
        while let Some(row) = rows.next()? {
            responses.push(parse_response_row(self.conn, row)?);
        }
        Ok(responses)
    }

    fn count_responses(&self, survey_id: SurveyId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM responses WHERE survey_id = ?1;",
            [survey_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn count_all_responses(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM responses;", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn count_answers(&self, question_id: QuestionId, survey_id: SurveyId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM answers a
             INNER JOIN responses r ON r.id = a.response_id
             WHERE a.question_id = ?1
               AND r.survey_id = ?2;",
            params![question_id.to_string(), survey_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

fn parse_response_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Response> {
    let id_text: String = row.get("id")?;
    let survey_text: String = row.get("survey_id")?;
    Ok(Response {
        id: parse_uuid(&id_text, "responses.id")?,
        survey_id: parse_uuid(&survey_text, "responses.survey_id")?,
        respondent_email: row.get("respondent_email")?,
        ip_address: row.get("ip_address")?,
        created_at: row.get("created_at")?,
        answers: load_answers(conn, &id_text)?,
    })
}

fn load_answers(conn: &Connection, response_id: &str) -> RepoResult<Vec<Answer>> {
    let mut stmt = conn.prepare(
        "SELECT id, question_id, text_answer
         FROM answers
         WHERE response_id = ?1
         ORDER BY rowid ASC;",
    )?;
    let mut rows = stmt.query([response_id])?;
    let mut answers = Vec::new();
    while let Some(row) = rows.next()? {
        let id_text: String = row.get("id")?;
        let question_text: String = row.get("question_id")?;
        answers.push(Answer {
            id: parse_uuid(&id_text, "answers.id")?,
            question_id: parse_uuid(&question_text, "answers.question_id")?,
            text_answer: row.get("text_answer")?,
            selected_options: load_selected_options(conn, &id_text)?,
        });
    }
    Ok(answers)
}

fn load_selected_options(conn: &Connection, answer_id: &str) -> RepoResult<Vec<Uuid>> {
    let mut stmt = conn.prepare(
        "SELECT option_id
         FROM answer_selected_options
         WHERE answer_id = ?1
         ORDER BY option_id ASC;",
    )?;
    let mut rows = stmt.query([answer_id])?;
    let mut options = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        options.push(parse_uuid(&value, "answer_selected_options.option_id")?);
    }
    Ok(options)
}
