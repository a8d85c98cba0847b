//! Core domain logic for the survey service.
//! Surveys, their questions and options, and anonymously collected responses.
//! This crate is the single source of truth for visibility and ownership rules.

pub mod access;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use access::action::{capability_for, Action, Capability, EntityKind};
pub use access::guard::can_mutate;
pub use access::visibility::{resolve_visible, ListParams, Visible};
pub use config::{ConfigError, CoreConfig};
pub use error::{ErrorKind, ServiceError};
pub use ingest::{IngestPolicy, RequestOrigin};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::actor::{Actor, ActorId};
pub use model::field_error::{FieldError, FieldErrors};
pub use model::response::{Answer, Response, ResponseId};
pub use model::survey::{
    OptionDraft, OptionId, Question, QuestionDetail, QuestionDraft, QuestionId, QuestionOption,
    QuestionType, Survey, SurveyDetail, SurveyDraft, SurveyId,
};
pub use repo::response_repo::{ResponseRepository, SqliteResponseRepository};
pub use repo::survey_repo::{SqliteSurveyRepository, SurveyRepository};
pub use repo::{RepoError, RepoResult};
pub use service::option_service::OptionService;
pub use service::question_service::QuestionService;
pub use service::response_service::ResponseService;
pub use service::stats_service::{QuestionStats, SurveyStats};
pub use service::survey_service::SurveyService;

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
