use std::sync::Arc;

use axum::http::StatusCode;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::cancellation::{CancellationCascade, CancellationReport};
use super::documents::{DocumentError, DocumentManager};
use super::domain::{Candidate, DocumentSummary, Language, Skills};
use super::reconcile::reconcile;
use super::repository::{RepositoryError, Storage};
use super::session::WizardSession;
use super::state::{transition, Action, Effect, Step, Transition};
use super::validation::{self, ValidationReport};
use super::views::{PageModel, StepView};

/// Step-specific fields posted alongside the action token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Empty,
    Candidate(Candidate),
    Skills(Skills),
    /// Comma separated ids of the documents ticked for deletion.
    DocumentSelection(Option<String>),
    Letter(Option<String>),
}

/// Result of posting to a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The transition succeeded; continue on `Step`.
    Advance(Step),
    /// Validation failed; the same step is shown again with the submitted data and errors.
    Rejected(StepView),
    /// The step does not offer the posted action. Nothing was changed.
    UnexpectedAction { step: Step, token: String },
}

/// Error raised by the wizard service.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("candidate must be saved before {0} can be stored")]
    CandidateNotPersisted(&'static str),
    #[error(transparent)]
    Documents(#[from] DocumentError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<&WizardError> for StatusCode {
    fn from(err: &WizardError) -> Self {
        match err {
            WizardError::Documents(
                DocumentError::MalformedId { .. }
                | DocumentError::UnknownDocument(_)
                | DocumentError::MissingFileName,
            ) => StatusCode::BAD_REQUEST,
            WizardError::CandidateNotPersisted(_)
            | WizardError::Documents(DocumentError::CandidateNotPersisted) => StatusCode::CONFLICT,
            WizardError::Repository(_) | WizardError::Documents(DocumentError::Repository(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

enum Applied {
    Done,
    Rejected(StepView),
    MissingPayload,
}

/// Drives the application wizard: resolves `(step, action)` through the transition
/// table, validates, reconciles, and persists.
pub struct WizardService<S> {
    storage: Arc<S>,
    documents: DocumentManager<S>,
    cancellation: CancellationCascade<S>,
    default_language: Language,
}

impl<S> WizardService<S>
where
    S: Storage + 'static,
{
    pub fn new(storage: Arc<S>, default_language: Language) -> Self {
        Self {
            documents: DocumentManager::new(storage.clone()),
            cancellation: CancellationCascade::new(storage.clone()),
            storage,
            default_language,
        }
    }

    pub fn default_language(&self) -> Language {
        self.default_language
    }

    pub fn documents(&self) -> &DocumentManager<S> {
        &self.documents
    }

    /// Build the view of `step` from the session's working data without changing anything.
    pub fn render(
        &self,
        session: &WizardSession,
        step: Step,
        today: NaiveDate,
    ) -> Result<StepView, WizardError> {
        let candidate = session.candidate.as_ref();
        let model = match step {
            Step::Agreement => PageModel::Agreement,
            Step::Candidate => PageModel::Candidate {
                candidate: session.candidate_or_default(),
            },
            Step::Skills => PageModel::Skills {
                skills: session.skills_or_default(),
            },
            Step::Documents => PageModel::Documents {
                documents: self.documents.uploads(candidate)?,
            },
            Step::LetterOfMotivation => PageModel::LetterOfMotivation {
                letter: self.documents.letter_text(candidate)?,
            },
            Step::SubmitApplication => PageModel::SubmitApplication {
                candidate: session.candidate_or_default(),
                skills: session.skills_or_default(),
                documents: self.documents.review_documents(candidate)?,
            },
            Step::ThankYou => PageModel::ThankYou,
            Step::ConfirmCancellation => PageModel::ConfirmCancellation,
        };

        Ok(StepView::new(step, self.language(session), today, model))
    }

    /// Handle a page visit. Reaching the thank-you page releases the session's
    /// application; the cancellation page first removes it from storage.
    ///
    /// If that removal fails the error is returned and the caller keeps the old
    /// session, so the ids needed for another attempt are not lost.
    pub fn enter(
        &self,
        mut session: WizardSession,
        step: Step,
        today: NaiveDate,
    ) -> Result<(WizardSession, StepView), WizardError> {
        match step {
            Step::ThankYou => {
                session.clear_application();
                session.step = step;
            }
            Step::ConfirmCancellation => {
                self.cancel(&session)?;
                session.clear_application();
                session.step = step;
            }
            _ => {}
        }

        let view = self.render(&session, step, today)?;
        Ok((session, view))
    }

    /// Remove everything the session's candidate owns from storage.
    pub fn cancel(&self, session: &WizardSession) -> Result<CancellationReport, WizardError> {
        Ok(self.cancellation.cancel(session)?)
    }

    /// Post an action token and step fields to `step`.
    pub fn submit(
        &self,
        mut session: WizardSession,
        step: Step,
        token: &str,
        submission: Submission,
        today: NaiveDate,
    ) -> Result<(WizardSession, StepOutcome), WizardError> {
        let resolved = Action::parse(token).and_then(|action| transition(step, action));
        let Some(Transition { next, effect }) = resolved else {
            warn!(step = step.label(), token, "unexpected action");
            return Ok((session, unexpected(step, token)));
        };

        match self.apply(&mut session, step, effect, submission, today)? {
            Applied::Done => {
                session.step = next;
                debug!(from = step.label(), to = next.label(), "wizard advanced");
                Ok((session, StepOutcome::Advance(next)))
            }
            Applied::Rejected(view) => {
                debug!(
                    step = step.label(),
                    errors = view.errors.errors().len(),
                    "submission rejected"
                );
                Ok((session, StepOutcome::Rejected(view)))
            }
            Applied::MissingPayload => {
                warn!(step = step.label(), token, "action posted without its fields");
                Ok((session, unexpected(step, token)))
            }
        }
    }

    /// Store an uploaded file for the session's candidate.
    pub fn upload(
        &self,
        session: &WizardSession,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<DocumentSummary, WizardError> {
        let document = self
            .documents
            .upload(session.candidate.as_ref(), file_name, content)?;
        Ok(document.summary())
    }

    fn apply(
        &self,
        session: &mut WizardSession,
        step: Step,
        effect: Effect,
        submission: Submission,
        today: NaiveDate,
    ) -> Result<Applied, WizardError> {
        match (effect, submission) {
            (Effect::None, _) => {}
            (Effect::ChooseLanguage(language), _) => session.language = Some(language),
            (Effect::ConfirmLanguage, _) => session.language = Some(self.language(session)),
            (Effect::PersistCandidate, Submission::Candidate(submitted)) => {
                return self.persist_candidate(session, submitted, today);
            }
            (Effect::StashCandidate, Submission::Candidate(submitted)) => {
                session.candidate = Some(reconcile(&session.candidate_or_default(), submitted));
            }
            (Effect::PersistSkills, Submission::Skills(submitted)) => {
                return self.persist_skills(session, submitted, today);
            }
            (Effect::StashSkills, Submission::Skills(submitted)) => {
                let mut merged = reconcile(&session.skills_or_default(), submitted);
                merged.candidate_id = session.candidate.as_ref().and_then(|c| c.id);
                session.skills = Some(merged);
            }
            (Effect::DeleteDocuments, Submission::DocumentSelection(selection)) => {
                let selection = selection.filter(|csv| !csv.trim().is_empty());
                if let Some(csv) = selection {
                    self.documents
                        .delete_many(session.candidate.as_ref(), &csv)?;
                }
            }
            (Effect::SaveLetter, Submission::Letter(text)) => {
                let text = text.unwrap_or_default();
                self.documents
                    .save_letter(session.candidate.as_ref(), &text)?;
            }
            (effect, submission) => {
                debug!(step = step.label(), ?effect, ?submission, "payload does not fit effect");
                return Ok(Applied::MissingPayload);
            }
        }
        Ok(Applied::Done)
    }

    fn persist_candidate(
        &self,
        session: &mut WizardSession,
        submitted: Candidate,
        today: NaiveDate,
    ) -> Result<Applied, WizardError> {
        let merged = reconcile(&session.candidate_or_default(), submitted);

        let report = validation::structural(&merged);
        if !report.is_empty() {
            let model = PageModel::Candidate { candidate: merged };
            return Ok(self.rejected(session, Step::Candidate, model, report, today));
        }

        let saved = self
            .storage
            .transaction(|tx| tx.save_candidate(merged))?;
        info!(candidate_id = ?saved.id, "candidate saved");
        session.candidate = Some(saved);
        Ok(Applied::Done)
    }

    fn persist_skills(
        &self,
        session: &mut WizardSession,
        submitted: Skills,
        today: NaiveDate,
    ) -> Result<Applied, WizardError> {
        let mut merged = reconcile(&session.skills_or_default(), submitted);

        let report = validation::skills_report(&merged, today);
        if !report.is_empty() {
            let model = PageModel::Skills { skills: merged };
            return Ok(self.rejected(session, Step::Skills, model, report, today));
        }

        let owner = session
            .candidate
            .as_ref()
            .and_then(|candidate| candidate.id)
            .ok_or(WizardError::CandidateNotPersisted("skills"))?;
        merged.candidate_id = Some(owner);

        let saved = self.storage.transaction(|tx| tx.save_skills(merged))?;
        info!(candidate_id = %owner, skills_id = ?saved.id, "skills saved");
        session.skills = Some(saved);
        Ok(Applied::Done)
    }

    fn rejected(
        &self,
        session: &WizardSession,
        step: Step,
        model: PageModel,
        report: ValidationReport,
        today: NaiveDate,
    ) -> Applied {
        let view = StepView::new(step, self.language(session), today, model).with_errors(report);
        Applied::Rejected(view)
    }

    fn language(&self, session: &WizardSession) -> Language {
        session.language_or(self.default_language)
    }
}

fn unexpected(step: Step, token: &str) -> StepOutcome {
    StepOutcome::UnexpectedAction {
        step,
        token: token.to_string(),
    }
}
