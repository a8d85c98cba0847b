//! CLI probe for the survey core.
//!
//! # Responsibility
//! - Verify `survey_core` linkage, configuration and storage bootstrap.
//! - Print deterministic `key=value` lines for quick local sanity checks.

use log::info;
use std::process::ExitCode;
use survey_core::db::migrations::latest_version;
use survey_core::db::{open_db, open_db_in_memory};
use survey_core::{
    init_from_config, CoreConfig, ResponseRepository, SqliteResponseRepository,
    SqliteSurveyRepository, SurveyRepository,
};

fn main() -> ExitCode {
    println!("survey_core ping={}", survey_core::ping());
    println!("survey_core version={}", survey_core::core_version());

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("survey_cli error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = CoreConfig::from_env()?;
    let logging = init_from_config(&config)?;
    println!("logging enabled={logging} level={}", config.log_level);

    let conn = match config.db_path.as_ref() {
        Some(path) => {
            println!("db mode=file path={}", path.display());
            open_db(path)?
        }
        None => {
            println!("db mode=memory");
            open_db_in_memory()?
        }
    };

    let surveys = SqliteSurveyRepository::try_new(&conn)?;
    let responses = SqliteResponseRepository::try_new(&conn)?;
    let survey_count = surveys.count_surveys()?;
    let response_count = responses.count_all_responses()?;

    println!("db schema_version={}", latest_version());
    println!("db surveys={survey_count} responses={response_count}");
    info!(
        "event=cli_probe module=cli status=ok surveys={survey_count} responses={response_count}"
    );
    Ok(())
}
