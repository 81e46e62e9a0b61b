//! Recruiter application wizard.
//!
//! A candidate walks through agreement, contact data, skills, documents, and a
//! motivation letter before submitting. Working data lives in a per-browser session and
//! is saved step by step; cancelling removes everything that was saved.

pub mod cancellation;
pub mod documents;
pub mod domain;
pub(crate) mod forms;
pub mod memory;
pub mod reconcile;
pub mod repository;
pub mod router;
pub mod service;
pub mod session;
pub mod state;
pub mod validation;
pub mod views;

#[cfg(test)]
mod tests;

pub use cancellation::{CancellationCascade, CancellationReport};
pub use documents::{
    file_name_from_content_disposition, parse_document_ids, DocumentError, DocumentManager,
    LetterChange,
};
pub use domain::{
    Candidate, CandidateId, Document, DocumentId, DocumentKind, DocumentSummary, Language,
    Skills, SkillsId, MOTIVATION_LETTER_LABEL_KEY, MOTIVATION_LETTER_NAME,
};
pub use memory::{MemoryStorage, StorageCounts, StorageEvent, StoredRecord};
pub use reconcile::{reconcile, Identified};
pub use repository::{RepositoryError, Storage, StorageTx};
pub use router::{application_router, WizardState};
pub use service::{StepOutcome, Submission, WizardError, WizardService};
pub use session::{SessionId, SessionStore, WizardSession};
pub use state::{transition, Action, Effect, Step, Transition};
pub use validation::{FieldError, ValidationReport};
pub use views::{PageModel, ReferenceData, SelectOption, StepView};
