//! Survey tree repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist surveys, questions and options.
//! - Execute visibility predicates chosen by the access layer.
//!
//! # Invariants
//! - Survey listings are ordered `created_at DESC`, newest insert first on ties.
//! - Question/option listings are ordered `sort_order ASC`, insertion order on ties.
//! - Deleting a survey removes its whole tree through foreign-key cascades.

use crate::model::actor::ActorId;
use crate::model::survey::{
    NewOption, NewQuestion, NewSurvey, OptionId, Question, QuestionId, QuestionOption,
    QuestionType, Survey, SurveyChanges, SurveyId,
};
use crate::repo::{
    bool_to_int, ensure_connection_ready, parse_flag, parse_uuid, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

const SURVEY_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    creator_id,
    created_at,
    updated_at,
    is_active
FROM surveys";

const QUESTION_SELECT_SQL: &str = "SELECT
    id,
    survey_id,
    text,
    question_type,
    required,
    sort_order
FROM questions";

const OPTION_SELECT_SQL: &str = "SELECT
    id,
    question_id,
    text,
    sort_order
FROM question_options";

/// Row predicate over `surveys`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurveyFilter {
    /// Every survey.
    All,
    /// Surveys with `is_active = 1`.
    Active,
    /// Active surveys plus any survey created by the given user.
    ActiveOrCreatedBy(ActorId),
    /// Surveys created by the given user.
    CreatedBy(ActorId),
    /// Matches no row.
    Nothing,
}

impl SurveyFilter {
    fn predicate(self, bind_values: &mut Vec<Value>) -> Option<&'static str> {
        match self {
            Self::All => Some("1 = 1"),
            Self::Active => Some("is_active = 1"),
            Self::ActiveOrCreatedBy(actor_id) => {
                bind_values.push(Value::Integer(actor_id));
                Some("(is_active = 1 OR creator_id = ?)")
            }
            Self::CreatedBy(actor_id) => {
                bind_values.push(Value::Integer(actor_id));
                Some("creator_id = ?")
            }
            Self::Nothing => None,
        }
    }
}

/// Repository interface for the survey authoring tree.
pub trait SurveyRepository {
    /// Inserts a survey owned by `creator_id` and returns the stored row.
    fn create_survey(&self, creator_id: ActorId, survey: &NewSurvey) -> RepoResult<Survey>;
    /// Applies changes and refreshes `updated_at`. The creator is never touched.
    fn update_survey(&self, id: SurveyId, changes: &SurveyChanges) -> RepoResult<Survey>;
    /// Loads one survey regardless of visibility.
    fn get_survey(&self, id: SurveyId) -> RepoResult<Option<Survey>>;
    /// Loads one survey only if it matches `filter`.
    fn find_survey(&self, id: SurveyId, filter: SurveyFilter) -> RepoResult<Option<Survey>>;
    /// Lists surveys matching `filter`, newest first.
    fn list_surveys(&self, filter: SurveyFilter) -> RepoResult<Vec<Survey>>;
    /// Deletes a survey and, by cascade, everything under it.
    fn delete_survey(&self, id: SurveyId) -> RepoResult<()>;
    fn count_surveys(&self) -> RepoResult<u64>;

    fn create_question(&self, survey_id: SurveyId, question: &NewQuestion)
        -> RepoResult<Question>;
    fn get_question(&self, id: QuestionId) -> RepoResult<Option<Question>>;
    /// Lists questions of one survey, or every question when `survey_id` is `None`.
    fn list_questions(&self, survey_id: Option<SurveyId>) -> RepoResult<Vec<Question>>;

    fn create_option(&self, question_id: QuestionId, option: &NewOption)
        -> RepoResult<QuestionOption>;
    fn get_option(&self, id: OptionId) -> RepoResult<Option<QuestionOption>>;
    /// Lists options of one question, or every option when `question_id` is `None`.
    fn list_options(&self, question_id: Option<QuestionId>) -> RepoResult<Vec<QuestionOption>>;
}

/// SQLite-backed survey tree repository.
pub struct SqliteSurveyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSurveyRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["surveys", "questions", "question_options"])?;
        Ok(Self { conn })
    }
}

impl SurveyRepository for SqliteSurveyRepository<'_> {
    fn create_survey(&self, creator_id: ActorId, survey: &NewSurvey) -> RepoResult<Survey> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO surveys (
                id,
                title,
                description,
                creator_id,
                is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id.to_string(),
                survey.title.as_str(),
                survey.description.as_deref(),
                creator_id,
                bool_to_int(survey.is_active),
            ],
        )?;
        load_required_survey(self.conn, id)
    }

    fn update_survey(&self, id: SurveyId, changes: &SurveyChanges) -> RepoResult<Survey> {
        let mut assignments = vec!["updated_at = (strftime('%s', 'now') * 1000)"];
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(title) = changes.title.as_ref() {
            assignments.push("title = ?");
            bind_values.push(Value::Text(title.clone()));
        }
        if let Some(description) = changes.description.as_ref() {
            assignments.push("description = ?");
            bind_values.push(match description {
                Some(value) => Value::Text(value.clone()),
                None => Value::Null,
            });
        }
        if let Some(is_active) = changes.is_active {
            assignments.push("is_active = ?");
            bind_values.push(Value::Integer(bool_to_int(is_active)));
        }
        bind_values.push(Value::Text(id.to_string()));

        let sql = format!(
            "UPDATE surveys SET {} WHERE id = ?;",
            assignments.join(", ")
        );
        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "survey",
                id,
            });
        }

        load_required_survey(self.conn, id)
    }

    fn get_survey(&self, id: SurveyId) -> RepoResult<Option<Survey>> {
        self.find_survey(id, SurveyFilter::All)
    }

    fn find_survey(&self, id: SurveyId, filter: SurveyFilter) -> RepoResult<Option<Survey>> {
        let mut bind_values = vec![Value::Text(id.to_string())];
        let Some(predicate) = filter.predicate(&mut bind_values) else {
            return Ok(None);
        };

        let sql = format!("{SURVEY_SELECT_SQL} WHERE id = ? AND {predicate};");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_survey_row(row)?));
        }
        Ok(None)
    }

    fn list_surveys(&self, filter: SurveyFilter) -> RepoResult<Vec<Survey>> {
        let mut bind_values = Vec::new();
        let Some(predicate) = filter.predicate(&mut bind_values) else {
            return Ok(Vec::new());
        };

        let sql =
            format!("{SURVEY_SELECT_SQL} WHERE {predicate} ORDER BY created_at DESC, rowid DESC;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut surveys = Vec::new();
        while let Some(row) = rows.next()? {
            surveys.push(parse_survey_row(row)?);
        }
        Ok(surveys)
    }

    fn delete_survey(&self, id: SurveyId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM surveys WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "survey",
                id,
            });
        }
        Ok(())
    }

    fn count_surveys(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM surveys;", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn create_question(
        &self,
        survey_id: SurveyId,
        question: &NewQuestion,
    ) -> RepoResult<Question> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO questions (
                id,
                survey_id,
                text,
                question_type,
                required,
                sort_order
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id.to_string(),
                survey_id.to_string(),
                question.text.as_str(),
                question.question_type.as_str(),
                bool_to_int(question.required),
                question.order,
            ],
        )?;
        self.get_question(id)?.ok_or(RepoError::NotFound {
            entity: "question",
            id,
        })
    }

    fn get_question(&self, id: QuestionId) -> RepoResult<Option<Question>> {
        let row = self
            .conn
            .query_row(
                &format!("{QUESTION_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(parse_question_row(row)),
            )
            .optional()?;
        row.transpose()
    }

    fn list_questions(&self, survey_id: Option<SurveyId>) -> RepoResult<Vec<Question>> {
        let mut stmt;
        let mut rows = match survey_id {
            Some(survey_id) => {
                stmt = self.conn.prepare(&format!(
                    "{QUESTION_SELECT_SQL}
                     WHERE survey_id = ?1
                     ORDER BY sort_order ASC, rowid ASC;"
                ))?;
                stmt.query([survey_id.to_string()])?
            }
            None => {
                stmt = self.conn.prepare(&format!(
                    "{QUESTION_SELECT_SQL} ORDER BY sort_order ASC, rowid ASC;"
                ))?;
                stmt.query([])?
            }
        };

        let mut questions = Vec::new();
        while let Some(row) = rows.next()? {
            questions.push(parse_question_row(row)?);
        }
        Ok(questions)
    }

    fn create_option(
        &self,
        question_id: QuestionId,
        option: &NewOption,
    ) -> RepoResult<QuestionOption> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO question_options (
                id,
                question_id,
                text,
                sort_order
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                id.to_string(),
                question_id.to_string(),
                option.text.as_str(),
                option.order,
            ],
        )?;
        self.get_option(id)?.ok_or(RepoError::NotFound {
            entity: "option",
            id,
        })
    }

    fn get_option(&self, id: OptionId) -> RepoResult<Option<QuestionOption>> {
        let row = self
            .conn
            .query_row(
                &format!("{OPTION_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(parse_option_row(row)),
            )
            .optional()?;
        row.transpose()
    }

    fn list_options(&self, question_id: Option<QuestionId>) -> RepoResult<Vec<QuestionOption>> {
        let mut stmt;
        let mut rows = match question_id {
            Some(question_id) => {
                stmt = self.conn.prepare(&format!(
                    "{OPTION_SELECT_SQL}
                     WHERE question_id = ?1
                     ORDER BY sort_order ASC, rowid ASC;"
                ))?;
                stmt.query([question_id.to_string()])?
            }
            None => {
                stmt = self.conn.prepare(&format!(
                    "{OPTION_SELECT_SQL} ORDER BY sort_order ASC, rowid ASC;"
                ))?;
                stmt.query([])?
            }
        };

        let mut options = Vec::new();
        while let Some(row) = rows.next()? {
            options.push(parse_option_row(row)?);
        }
        Ok(options)
    }
}

fn load_required_survey(conn: &Connection, id: SurveyId) -> RepoResult<Survey> {
    let row = conn
        .query_row(
            &format!("{SURVEY_SELECT_SQL} WHERE id = ?1;"),
            [id.to_string()],
            |row| Ok(parse_survey_row(row)),
        )
        .optional()?;
    row.transpose()?.ok_or(RepoError::NotFound {
        entity: "survey",
        id,
    })
}

fn parse_survey_row(row: &Row<'_>) -> RepoResult<Survey> {
    let id_text: String = row.get("id")?;
    Ok(Survey {
        id: parse_uuid(&id_text, "surveys.id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        creator_id: row.get("creator_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        is_active: parse_flag(row.get("is_active")?, "surveys.is_active")?,
    })
}

fn parse_question_row(row: &Row<'_>) -> RepoResult<Question> {
    let id_text: String = row.get("id")?;
    let survey_text: String = row.get("survey_id")?;
    let type_text: String = row.get("question_type")?;
    let question_type = QuestionType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid question type `{type_text}` in questions.question_type"
        ))
    })?;

    Ok(Question {
        id: parse_uuid(&id_text, "questions.id")?,
        survey_id: parse_uuid(&survey_text, "questions.survey_id")?,
        text: row.get("text")?,
        question_type,
        required: parse_flag(row.get("required")?, "questions.required")?,
        order: row.get("sort_order")?,
    })
}

fn parse_option_row(row: &Row<'_>) -> RepoResult<QuestionOption> {
    let id_text: String = row.get("id")?;
    let question_text: String = row.get("question_id")?;
    Ok(QuestionOption {
        id: parse_uuid(&id_text, "question_options.id")?,
        question_id: parse_uuid(&question_text, "question_options.question_id")?,
        text: row.get("text")?,
        order: row.get("sort_order")?,
    })
}
