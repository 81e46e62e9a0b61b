use super::domain::{Candidate, CandidateId, Document, DocumentId, Skills, SkillsId};

/// Records whose primary key is assigned by storage.
///
/// The identity is only reachable through this trait so merges cannot overwrite it by
/// accident: `reconcile` copies every attribute from the submitted value and the id
/// from the value already held in the session.
pub trait Identified {
    type Id: Copy + PartialEq;

    fn identity(&self) -> Option<Self::Id>;

    fn with_identity(self, id: Option<Self::Id>) -> Self;
}

/// Merge a submission into the session's working copy, keeping the working copy's id.
pub fn reconcile<E: Identified>(current: &E, submitted: E) -> E {
    submitted.with_identity(current.identity())
}

impl Identified for Candidate {
    type Id = CandidateId;

    fn identity(&self) -> Option<CandidateId> {
        self.id
    }

    fn with_identity(self, id: Option<CandidateId>) -> Self {
        Self { id, ..self }
    }
}

impl Identified for Skills {
    type Id = SkillsId;

    fn identity(&self) -> Option<SkillsId> {
        self.id
    }

    fn with_identity(self, id: Option<SkillsId>) -> Self {
        Self { id, ..self }
    }
}

impl Identified for Document {
    type Id = DocumentId;

    fn identity(&self) -> Option<DocumentId> {
        self.id
    }

    fn with_identity(self, id: Option<DocumentId>) -> Self {
        Self { id, ..self }
    }
}
