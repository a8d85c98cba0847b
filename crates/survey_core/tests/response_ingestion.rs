use rusqlite::Connection;
use serde_json::json;
use survey_core::db::open_db_in_memory;
use survey_core::{
    Actor, ErrorKind, IngestPolicy, OptionDraft, OptionService, Question, QuestionDraft,
    QuestionOption, QuestionService, RequestOrigin, ResponseService, ServiceError,
    SqliteResponseRepository, SqliteSurveyRepository, Survey, SurveyDraft, SurveyId,
    SurveyService,
};
use uuid::Uuid;

struct Fixture {
    survey: Survey,
    question: Question,
    other_question: Question,
    options: Vec<QuestionOption>,
}

fn seed(conn: &Connection) -> Fixture {
    let owner = Actor::user(1);
    let survey = SurveyService::new(
        SqliteSurveyRepository::try_new(conn).unwrap(),
        SqliteResponseRepository::try_new(conn).unwrap(),
    )
    .create(
        &owner,
        &SurveyDraft {
            title: Some("Team lunch".to_string()),
            ..SurveyDraft::default()
        },
    )
    .unwrap();

    let questions = QuestionService::new(SqliteSurveyRepository::try_new(conn).unwrap());
    let mut created = Vec::new();
    for text in ["Cuisine?", "Comments?"] {
        created.push(
            questions
                .create(
                    &owner,
                    &QuestionDraft {
                        survey: Some(survey.id.to_string()),
                        text: Some(text.to_string()),
                        question_type: Some("multiple_choice".to_string()),
                        ..QuestionDraft::default()
                    },
                )
                .unwrap(),
        );
    }
    let other_question = created.pop().unwrap();
    let question = created.pop().unwrap();

    let option_service = OptionService::new(SqliteSurveyRepository::try_new(conn).unwrap());
    let options = ["Thai", "Pizza"]
        .into_iter()
        .map(|text| {
            option_service
                .create(
                    &owner,
                    &OptionDraft {
                        question: Some(question.id.to_string()),
                        text: Some(text.to_string()),
                        order: None,
                    },
                )
                .unwrap()
        })
        .collect();

    Fixture {
        survey,
        question,
        other_question,
        options,
    }
}

fn response_service(
    conn: &Connection,
) -> ResponseService<SqliteSurveyRepository<'_>, SqliteResponseRepository<'_>> {
    ResponseService::new(
        SqliteSurveyRepository::try_new(conn).unwrap(),
        SqliteResponseRepository::try_new(conn).unwrap(),
    )
}

fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn answered(fixture: &Fixture) -> serde_json::Value {
    json!({
        "survey": fixture.survey.id.to_string(),
        "respondent_email": "guest@example.com",
        "answers": [
            {
                "question": fixture.question.id.to_string(),
                "selected_options": [fixture.options[0].id.to_string()]
            },
            {
                "question": fixture.other_question.id.to_string(),
                "text_answer": "More spice"
            }
        ]
    })
}

#[test]
fn ingest_overwrites_client_ip_with_forwarded_address() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let mut payload = answered(&fixture);
    payload["ip_address"] = json!("6.6.6.6");

    let origin = RequestOrigin::from_headers(
        [("X-Forwarded-For", "203.0.113.9, 10.0.0.1")],
        Some("10.0.0.1:40000"),
    );
    let response = response_service(&conn).create(payload, &origin).unwrap();

    assert_eq!(response.ip_address.as_deref(), Some("203.0.113.9"));
    assert_eq!(response.survey_id, fixture.survey.id);
    assert_eq!(response.respondent_email.as_deref(), Some("guest@example.com"));
    assert_eq!(response.answers.len(), 2);
    assert_eq!(response.answers[0].selected_options, vec![fixture.options[0].id]);
    assert_eq!(response.answers[1].text_answer.as_deref(), Some("More spice"));
}

#[test]
fn ingest_uses_peer_address_without_forwarded_header() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);

    let response = response_service(&conn)
        .create(answered(&fixture), &RequestOrigin::peer("192.0.2.44:5000"))
        .unwrap();
    assert_eq!(response.ip_address.as_deref(), Some("192.0.2.44"));
}

#[test]
fn one_invalid_answer_rejects_the_whole_response() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let payload = json!({
        "survey": fixture.survey.id.to_string(),
        "answers": [
            { "question": fixture.question.id.to_string(), "text_answer": "ok" },
            { "question": Uuid::new_v4().to_string(), "text_answer": "ghost" }
        ]
    });

    let err = response_service(&conn)
        .create(payload, &RequestOrigin::peer("127.0.0.1"))
        .unwrap_err();
    match err {
        ServiceError::ValidationFailed(errors) => {
            assert!(errors.has_field("answers[1].question"));
            assert!(!errors.has_field("answers[0].question"));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(row_count(&conn, "responses"), 0);
    assert_eq!(row_count(&conn, "answers"), 0);
    assert_eq!(row_count(&conn, "answer_selected_options"), 0);
}

#[test]
fn unknown_survey_and_option_are_reported_per_field() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let payload = json!({
        "survey": Uuid::new_v4().to_string(),
        "answers": [{
            "question": fixture.question.id.to_string(),
            "selected_options": [Uuid::new_v4().to_string()]
        }]
    });

    let err = response_service(&conn)
        .create(payload, &RequestOrigin::peer("127.0.0.1"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    match err {
        ServiceError::ValidationFailed(errors) => {
            assert!(errors.has_field("survey"));
            assert!(errors.has_field("answers[0].selected_options"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(row_count(&conn, "responses"), 0);
}

#[test]
fn duplicate_selected_options_are_stored_once() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let option_id = fixture.options[1].id.to_string();
    let payload = json!({
        "survey": fixture.survey.id.to_string(),
        "answers": [{
            "question": fixture.question.id.to_string(),
            "selected_options": [option_id, option_id]
        }]
    });

    let response = response_service(&conn)
        .create(payload, &RequestOrigin::peer("127.0.0.1"))
        .unwrap();
    assert_eq!(response.answers[0].selected_options.len(), 1);
    assert_eq!(row_count(&conn, "answer_selected_options"), 1);
}

#[test]
fn option_membership_is_permissive_unless_enforced() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let payload = json!({
        "survey": fixture.survey.id.to_string(),
        "answers": [{
            "question": fixture.other_question.id.to_string(),
            "selected_options": [fixture.options[0].id.to_string()]
        }]
    });

    response_service(&conn)
        .create(payload.clone(), &RequestOrigin::peer("127.0.0.1"))
        .unwrap();

    let strict = ResponseService::with_policy(
        SqliteSurveyRepository::try_new(&conn).unwrap(),
        SqliteResponseRepository::try_new(&conn).unwrap(),
        IngestPolicy {
            enforce_option_membership: true,
            ..IngestPolicy::default()
        },
    );
    let err = strict
        .create(payload, &RequestOrigin::peer("127.0.0.1"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    assert_eq!(row_count(&conn, "responses"), 1);
}

#[test]
fn response_listing_is_scoped_to_survey_owners() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let service = response_service(&conn);
    let origin = RequestOrigin::peer("127.0.0.1");
    let first = service.create(answered(&fixture), &origin).unwrap();
    let second = service.create(answered(&fixture), &origin).unwrap();

    assert!(service.list(&Actor::anonymous(), None).unwrap().is_empty());
    assert!(service
        .list(&Actor::anonymous(), Some(fixture.survey.id))
        .unwrap()
        .is_empty());
    assert!(service.list(&Actor::user(2), None).unwrap().is_empty());
    assert!(service
        .list(&Actor::user(2), Some(fixture.survey.id))
        .unwrap()
        .is_empty());

    let owned: Vec<_> = service
        .list(&Actor::user(1), Some(fixture.survey.id))
        .unwrap()
        .into_iter()
        .map(|response| response.id)
        .collect();
    assert_eq!(owned, vec![second.id, first.id]);
    assert_eq!(service.list(&Actor::superuser(9), None).unwrap().len(), 2);

    let missing: SurveyId = Uuid::new_v4();
    let err = service.list(&Actor::user(1), Some(missing)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
