use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Form, Multipart, State},
    http::{header::CONTENT_DISPOSITION, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post, MethodRouter},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Local;
use serde_json::json;
use tracing::{error, warn};

use super::documents::{file_name_from_content_disposition, DocumentError};
use super::forms::{ActionForm, CandidateForm, DocumentsForm, LetterForm, SkillsForm};
use super::repository::Storage;
use super::service::{StepOutcome, Submission, WizardError, WizardService};
use super::session::{SessionId, SessionStore};
use super::state::Step;
use crate::config::WizardConfig;

/// Shared handler state: the wizard service, live sessions, and the cookie naming them.
pub struct WizardState<S> {
    pub service: Arc<WizardService<S>>,
    pub sessions: Arc<SessionStore>,
    pub cookie_name: Arc<str>,
}

impl<S> Clone for WizardState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            sessions: self.sessions.clone(),
            cookie_name: self.cookie_name.clone(),
        }
    }
}

impl<S> WizardState<S> {
    /// Session named by the request cookie, or a new one with its cookie added to the jar.
    fn session(&self, jar: CookieJar) -> (CookieJar, SessionId) {
        let requested = jar
            .get(&self.cookie_name)
            .and_then(|cookie| cookie.value().parse::<SessionId>().ok());
        let (id, created) = self.sessions.resolve(requested);
        if !created {
            return (jar, id);
        }

        let cookie = Cookie::build((self.cookie_name.to_string(), id.to_string()))
            .path("/")
            .http_only(true)
            .build();
        (jar.add(cookie), id)
    }
}

/// Router builder exposing one GET and one POST per wizard page plus the upload endpoint.
pub fn application_router<S>(
    service: Arc<WizardService<S>>,
    sessions: Arc<SessionStore>,
    config: &WizardConfig,
) -> Router
where
    S: Storage + 'static,
{
    let state = WizardState {
        service,
        sessions,
        cookie_name: Arc::from(config.session_cookie.as_str()),
    };

    Router::new()
        .route(
            Step::Agreement.path(),
            page::<S>(Step::Agreement).post(agreement_handler::<S>),
        )
        .route(
            Step::Candidate.path(),
            page::<S>(Step::Candidate).post(candidate_handler::<S>),
        )
        .route(
            Step::Skills.path(),
            page::<S>(Step::Skills).post(skills_handler::<S>),
        )
        .route(
            Step::Documents.path(),
            page::<S>(Step::Documents).post(documents_handler::<S>),
        )
        .route(
            Step::LetterOfMotivation.path(),
            page::<S>(Step::LetterOfMotivation).post(letter_handler::<S>),
        )
        .route(
            Step::SubmitApplication.path(),
            page::<S>(Step::SubmitApplication).post(review_handler::<S>),
        )
        .route(Step::ThankYou.path(), page::<S>(Step::ThankYou))
        .route(
            Step::ConfirmCancellation.path(),
            page::<S>(Step::ConfirmCancellation).post(cancellation_handler::<S>),
        )
        .route("/upload", post(upload_handler::<S>))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(state)
}

fn page<S>(step: Step) -> MethodRouter<WizardState<S>>
where
    S: Storage + 'static,
{
    get(move |State(state): State<WizardState<S>>, jar: CookieJar| {
        enter_handler(state, jar, step)
    })
}

pub(crate) async fn enter_handler<S>(state: WizardState<S>, jar: CookieJar, step: Step) -> Response
where
    S: Storage + 'static,
{
    let (jar, id) = state.session(jar);
    let today = Local::now().date_naive();
    let result = state
        .sessions
        .update(id, |session| state.service.enter(session, step, today));

    match result {
        Ok(view) => (jar, Json(view)).into_response(),
        Err(err) => (jar, error_response(err)).into_response(),
    }
}

pub(crate) async fn agreement_handler<S>(
    State(state): State<WizardState<S>>,
    jar: CookieJar,
    Form(form): Form<ActionForm>,
) -> Response
where
    S: Storage + 'static,
{
    let (action, submission) = form.into_parts();
    submit(state, jar, Step::Agreement, action, submission)
}

pub(crate) async fn candidate_handler<S>(
    State(state): State<WizardState<S>>,
    jar: CookieJar,
    Form(form): Form<CandidateForm>,
) -> Response
where
    S: Storage + 'static,
{
    let (action, submission) = form.into_parts();
    submit(state, jar, Step::Candidate, action, submission)
}

pub(crate) async fn skills_handler<S>(
    State(state): State<WizardState<S>>,
    jar: CookieJar,
    Form(form): Form<SkillsForm>,
) -> Response
where
    S: Storage + 'static,
{
    let (action, submission) = form.into_parts();
    submit(state, jar, Step::Skills, action, submission)
}

pub(crate) async fn documents_handler<S>(
    State(state): State<WizardState<S>>,
    jar: CookieJar,
    Form(form): Form<DocumentsForm>,
) -> Response
where
    S: Storage + 'static,
{
    let (action, submission) = form.into_parts();
    submit(state, jar, Step::Documents, action, submission)
}

pub(crate) async fn letter_handler<S>(
    State(state): State<WizardState<S>>,
    jar: CookieJar,
    Form(form): Form<LetterForm>,
) -> Response
where
    S: Storage + 'static,
{
    let (action, submission) = form.into_parts();
    submit(state, jar, Step::LetterOfMotivation, action, submission)
}

pub(crate) async fn review_handler<S>(
    State(state): State<WizardState<S>>,
    jar: CookieJar,
    Form(form): Form<ActionForm>,
) -> Response
where
    S: Storage + 'static,
{
    let (action, submission) = form.into_parts();
    submit(state, jar, Step::SubmitApplication, action, submission)
}

pub(crate) async fn cancellation_handler<S>(
    State(state): State<WizardState<S>>,
    jar: CookieJar,
    Form(form): Form<ActionForm>,
) -> Response
where
    S: Storage + 'static,
{
    let (action, submission) = form.into_parts();
    submit(state, jar, Step::ConfirmCancellation, action, submission)
}

/// Accepts a multipart body whose `file` part becomes a new document.
pub(crate) async fn upload_handler<S>(
    State(state): State<WizardState<S>>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Response
where
    S: Storage + 'static,
{
    let (jar, id) = state.session(jar);

    let mut upload = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "failed to read upload");
                let payload = json!({ "error": err.body_text() });
                return (jar, (err.status(), Json(payload))).into_response();
            }
        };
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(file_name_from_content_disposition)
            .or_else(|| field.file_name().map(str::to_string));
        match field.bytes().await {
            Ok(bytes) => upload = Some((file_name, bytes.to_vec())),
            Err(err) => {
                warn!(error = %err, "failed to read upload");
                let payload = json!({ "error": err.body_text() });
                return (jar, (err.status(), Json(payload))).into_response();
            }
        }
        break;
    }

    let Some((Some(file_name), content)) = upload else {
        let err = WizardError::Documents(DocumentError::MissingFileName);
        return (jar, error_response(err)).into_response();
    };

    let result = state.sessions.update(id, |session| {
        let summary = state.service.upload(&session, &file_name, content)?;
        Ok::<_, WizardError>((session, summary))
    });

    match result {
        Ok(summary) => (jar, (StatusCode::CREATED, Json(summary))).into_response(),
        Err(err) => (jar, error_response(err)).into_response(),
    }
}

fn submit<S>(
    state: WizardState<S>,
    jar: CookieJar,
    step: Step,
    action: String,
    submission: Submission,
) -> Response
where
    S: Storage + 'static,
{
    let (jar, id) = state.session(jar);
    let today = Local::now().date_naive();
    let result = state.sessions.update(id, |session| {
        state
            .service
            .submit(session, step, &action, submission, today)
    });

    match result {
        Ok(outcome) => (jar, outcome_response(outcome)).into_response(),
        Err(err) => (jar, error_response(err)).into_response(),
    }
}

fn outcome_response(outcome: StepOutcome) -> Response {
    match outcome {
        StepOutcome::Advance(next) => Redirect::to(next.path()).into_response(),
        StepOutcome::Rejected(view) => {
            (StatusCode::UNPROCESSABLE_ENTITY, Json(view)).into_response()
        }
        StepOutcome::UnexpectedAction { step, token } => {
            let payload = json!({
                "error": "unexpected_action",
                "step": step,
                "action": token,
            });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        }
    }
}

fn error_response(err: WizardError) -> Response {
    let status = StatusCode::from(&err);
    if status.is_server_error() {
        error!(error = %err, "wizard storage failure");
    }

    let payload = json!({
        "error": err.to_string(),
    });
    (status, Json(payload)).into_response()
}
