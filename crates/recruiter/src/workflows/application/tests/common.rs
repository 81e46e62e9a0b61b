use std::sync::Arc;

use axum::http::header::SET_COOKIE;
use axum::response::Response;
use axum::Router;
use chrono::NaiveDate;
use serde_json::Value;

use crate::config::WizardConfig;
use crate::workflows::application::{
    application_router, Candidate, Language, MemoryStorage, RepositoryError, SessionStore,
    Skills, Step, StepOutcome, Storage, StorageTx, Submission, WizardService, WizardSession,
};

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn today() -> NaiveDate {
    date(2024, 6, 15)
}

pub(super) fn candidate() -> Candidate {
    Candidate {
        id: None,
        title: "Dr.".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        street: "Hauptstrasse 1".to_string(),
        zip_code: "10115".to_string(),
        city: "Berlin".to_string(),
        email: "ada@example.org".to_string(),
        phone: "+49 30 1234567".to_string(),
    }
}

pub(super) fn skills() -> Skills {
    Skills {
        id: None,
        candidate_id: None,
        start_date_education: Some(date(2015, 9, 1)),
        end_date_education: Some(date(2018, 7, 1)),
        prospective_end: false,
        start_date_experience: Some(date(2018, 9, 1)),
        end_date_experience: Some(date(2023, 12, 1)),
        has_no_experience: false,
        current_position: false,
        position: "Backend developer".to_string(),
    }
}

pub(super) fn build_service() -> (WizardService<MemoryStorage>, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::with_journal());
    let service = WizardService::new(storage.clone(), Language::German);
    (service, storage)
}

/// Saves `candidate()` straight into storage, bypassing the wizard.
pub(super) fn persisted_candidate(storage: &MemoryStorage) -> Candidate {
    storage
        .transaction(|tx| tx.save_candidate(candidate()))
        .expect("candidate saved")
}

/// Walks a fresh session through the agreement and candidate steps.
pub(super) fn session_on_skills(service: &WizardService<MemoryStorage>) -> WizardSession {
    let session = advance(
        service,
        WizardSession::new(),
        Step::Agreement,
        "accept",
        Submission::Empty,
    );
    advance(
        service,
        session,
        Step::Candidate,
        "forward",
        Submission::Candidate(candidate()),
    )
}

/// Submits and asserts the wizard moved on.
pub(super) fn advance(
    service: &WizardService<MemoryStorage>,
    session: WizardSession,
    step: Step,
    token: &str,
    submission: Submission,
) -> WizardSession {
    let (session, outcome) = service
        .submit(session, step, token, submission, today())
        .expect("submission handled");
    assert!(
        matches!(outcome, StepOutcome::Advance(_)),
        "expected {token} on {step:?} to advance, got {outcome:?}"
    );
    session
}

pub(super) struct UnavailableStorage;

impl Storage for UnavailableStorage {
    fn transaction<T, E, F>(&self, _work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StorageTx) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        Err(E::from(RepositoryError::Unavailable(
            "database offline".to_string(),
        )))
    }
}

pub(super) fn router_with_service<S>(service: WizardService<S>) -> Router
where
    S: Storage + 'static,
{
    application_router(
        Arc::new(service),
        Arc::new(SessionStore::new()),
        &WizardConfig::default(),
    )
}

/// `name=value` pair of the session cookie set by a response.
pub(super) fn session_cookie(response: &Response) -> String {
    let header = response
        .headers()
        .get(SET_COOKIE)
        .expect("session cookie set")
        .to_str()
        .expect("ascii cookie");
    header
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
