use super::domain::{Candidate, CandidateId, Document, DocumentId, Skills, SkillsId};

/// Storage abstraction so the wizard can be exercised against any backing store.
///
/// Every logical operation runs inside `transaction`; implementations must discard all
/// writes made by `work` when it returns an error.
pub trait Storage: Send + Sync {
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StorageTx) -> Result<T, E>,
        E: From<RepositoryError>;
}

/// Save/find/delete-by-id operations available inside a transaction.
///
/// `save_*` inserts when the record has no id (returning it with the assigned id) and
/// updates the existing row otherwise.
pub trait StorageTx {
    fn save_candidate(&mut self, candidate: Candidate) -> Result<Candidate, RepositoryError>;
    fn find_candidate(&self, id: CandidateId) -> Result<Option<Candidate>, RepositoryError>;
    fn delete_candidate(&mut self, id: CandidateId) -> Result<(), RepositoryError>;

    fn save_skills(&mut self, skills: Skills) -> Result<Skills, RepositoryError>;
    fn find_skills(&self, id: SkillsId) -> Result<Option<Skills>, RepositoryError>;
    fn delete_skills(&mut self, id: SkillsId) -> Result<(), RepositoryError>;

    fn save_document(&mut self, document: Document) -> Result<Document, RepositoryError>;
    fn find_document(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError>;
    fn documents_for_candidate(
        &self,
        candidate_id: CandidateId,
    ) -> Result<Vec<Document>, RepositoryError>;
    fn delete_document(&mut self, id: DocumentId) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record has no owning candidate")]
    Unowned,
    #[error("candidate {0} does not exist")]
    MissingOwner(CandidateId),
    #[error("candidate {candidate_id} is still referenced by {referenced_by}")]
    StillReferenced {
        candidate_id: CandidateId,
        referenced_by: &'static str,
    },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
