use std::sync::Arc;

use tracing::info;

use super::domain::{CandidateId, SkillsId};
use super::repository::{RepositoryError, Storage};
use super::session::WizardSession;

/// Rows removed by a cancellation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancellationReport {
    pub candidate: Option<CandidateId>,
    pub skills: Option<SkillsId>,
    pub documents: usize,
}

impl CancellationReport {
    pub fn deleted_anything(&self) -> bool {
        self.candidate.is_some() || self.skills.is_some() || self.documents > 0
    }
}

/// Removes every durable record of the session's candidate, children before parent.
pub struct CancellationCascade<S> {
    storage: Arc<S>,
}

impl<S> CancellationCascade<S>
where
    S: Storage + 'static,
{
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Delete documents, then skills, then the candidate, in one transaction.
    ///
    /// A session whose candidate was never saved has nothing to delete. The session
    /// itself is not modified; clearing it is the caller's job.
    pub fn cancel(&self, session: &WizardSession) -> Result<CancellationReport, RepositoryError> {
        let Some(candidate_id) = session.candidate.as_ref().and_then(|candidate| candidate.id)
        else {
            return Ok(CancellationReport::default());
        };
        let skills_id = session.skills.as_ref().and_then(|skills| skills.id);

        let report = self.storage.transaction(|tx| {
            let documents = tx.documents_for_candidate(candidate_id)?;
            for document in &documents {
                if let Some(id) = document.id {
                    tx.delete_document(id)?;
                }
            }

            if let Some(id) = skills_id {
                tx.delete_skills(id)?;
            }

            tx.delete_candidate(candidate_id)?;

            Ok::<_, RepositoryError>(CancellationReport {
                candidate: Some(candidate_id),
                skills: skills_id,
                documents: documents.len(),
            })
        })?;

        info!(
            candidate_id = %candidate_id,
            documents = report.documents,
            skills = report.skills.is_some(),
            "application cancelled and removed"
        );
        Ok(report)
    }
}
