use std::sync::Arc;

use tracing::{debug, info};

use super::domain::{
    Candidate, CandidateId, Document, DocumentId, DocumentSummary, MOTIVATION_LETTER_LABEL_KEY,
};
use super::reconcile::reconcile;
use super::repository::{RepositoryError, Storage, StorageTx};

/// Failures raised while managing a candidate's documents.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("'{token}' is not a document id")]
    MalformedId { token: String },
    #[error("document {0} does not exist")]
    UnknownDocument(DocumentId),
    #[error("upload carries no file name")]
    MissingFileName,
    #[error("candidate must be saved before documents can be stored")]
    CandidateNotPersisted,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// What a motivation-letter submission did to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LetterChange {
    Unchanged,
    Created(DocumentId),
    Updated(DocumentId),
    Removed(DocumentId),
}

/// Extract the file name from a `Content-Disposition` header value.
///
/// `form-data; name="file"; filename="cv.pdf"` yields `cv.pdf`.
pub fn file_name_from_content_disposition(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find(|segment| segment.starts_with("filename"))
        .and_then(|segment| segment.split_once('='))
        .map(|(_, value)| value.trim().replace('"', ""))
        .filter(|name| !name.is_empty())
}

/// Parse a comma separated list of decimal document ids. Any bad token fails the list.
pub fn parse_document_ids(csv: &str) -> Result<Vec<DocumentId>, DocumentError> {
    csv.split(',')
        .map(|token| {
            token
                .trim()
                .parse::<i64>()
                .map(DocumentId)
                .map_err(|_| DocumentError::MalformedId {
                    token: token.to_string(),
                })
        })
        .collect()
}

/// Keeps a candidate's file set, including the motivation letter stored as a document.
pub struct DocumentManager<S> {
    storage: Arc<S>,
}

impl<S> DocumentManager<S>
where
    S: Storage + 'static,
{
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Store an uploaded file as a new document. Same-named uploads are kept side by side.
    pub fn upload(
        &self,
        candidate: Option<&Candidate>,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<Document, DocumentError> {
        let owner = persisted_owner(candidate)?;
        if file_name.trim().is_empty() {
            return Err(DocumentError::MissingFileName);
        }

        let stored = self.storage.transaction(|tx| {
            tx.save_document(Document::uploaded(owner, file_name, content))
                .map_err(DocumentError::from)
        })?;

        info!(
            candidate_id = %owner,
            document_id = ?stored.id,
            size = stored.content.len(),
            "document uploaded"
        );
        Ok(stored)
    }

    /// Create, overwrite, or remove the motivation letter so storage mirrors `text`.
    pub fn save_letter(
        &self,
        candidate: Option<&Candidate>,
        text: &str,
    ) -> Result<LetterChange, DocumentError> {
        let owner = match candidate.and_then(|candidate| candidate.id) {
            Some(owner) => owner,
            None if text.is_empty() => return Ok(LetterChange::Unchanged),
            None => return Err(DocumentError::CandidateNotPersisted),
        };

        let change = self.storage.transaction(|tx| -> Result<_, DocumentError> {
            let existing = find_letter(tx, owner)?;
            let change = match (existing, text.is_empty()) {
                (None, true) => LetterChange::Unchanged,
                (None, false) => {
                    let stored = tx.save_document(Document::motivation_letter(owner, text))?;
                    LetterChange::Created(stored.id.ok_or(RepositoryError::NotFound)?)
                }
                (Some(letter), true) => {
                    let id = letter.id.ok_or(RepositoryError::NotFound)?;
                    tx.delete_document(id)?;
                    LetterChange::Removed(id)
                }
                (Some(letter), false) => {
                    let revised = reconcile(&letter, Document::motivation_letter(owner, text));
                    let stored = tx.save_document(revised)?;
                    LetterChange::Updated(stored.id.ok_or(RepositoryError::NotFound)?)
                }
            };
            Ok(change)
        })?;

        debug!(candidate_id = %owner, ?change, "motivation letter saved");
        Ok(change)
    }

    /// Text of the stored letter, or an empty string when there is none.
    pub fn letter_text(&self, candidate: Option<&Candidate>) -> Result<String, DocumentError> {
        let Some(owner) = candidate.and_then(|candidate| candidate.id) else {
            return Ok(String::new());
        };

        let letter = self
            .storage
            .transaction(|tx| find_letter(tx, owner).map_err(DocumentError::from))?;
        Ok(letter
            .map(|letter| String::from_utf8_lossy(&letter.content).into_owned())
            .unwrap_or_default())
    }

    /// Uploaded files for the documents page; the letter is edited on its own page.
    pub fn uploads(
        &self,
        candidate: Option<&Candidate>,
    ) -> Result<Vec<DocumentSummary>, DocumentError> {
        Ok(self
            .documents(candidate)?
            .iter()
            .filter(|document| !document.is_motivation_letter())
            .map(Document::summary)
            .collect())
    }

    /// Every document for the review page, with the letter shown under its label key.
    pub fn review_documents(
        &self,
        candidate: Option<&Candidate>,
    ) -> Result<Vec<DocumentSummary>, DocumentError> {
        Ok(self
            .documents(candidate)?
            .iter()
            .map(|document| {
                let mut summary = document.summary();
                if document.is_motivation_letter() {
                    summary.name = MOTIVATION_LETTER_LABEL_KEY.to_string();
                }
                summary
            })
            .collect())
    }

    /// Delete the listed documents of the candidate in one transaction.
    ///
    /// The whole request fails, with nothing deleted, when a token is not a number or an
    /// id does not name one of the candidate's documents.
    pub fn delete_many(
        &self,
        candidate: Option<&Candidate>,
        csv: &str,
    ) -> Result<usize, DocumentError> {
        let ids = parse_document_ids(csv)?;
        let owner = persisted_owner(candidate)?;

        let deleted = self.storage.transaction(|tx| -> Result<_, DocumentError> {
            for id in &ids {
                match tx.find_document(*id)? {
                    Some(document) if document.candidate_id == owner => {}
                    _ => return Err(DocumentError::UnknownDocument(*id)),
                }
                tx.delete_document(*id).map_err(|err| match err {
                    RepositoryError::NotFound => DocumentError::UnknownDocument(*id),
                    other => DocumentError::Repository(other),
                })?;
            }
            Ok(ids.len())
        })?;

        info!(candidate_id = %owner, deleted, "documents deleted");
        Ok(deleted)
    }

    fn documents(&self, candidate: Option<&Candidate>) -> Result<Vec<Document>, DocumentError> {
        match candidate.and_then(|candidate| candidate.id) {
            Some(owner) => self.storage.transaction(|tx| {
                tx.documents_for_candidate(owner)
                    .map_err(DocumentError::from)
            }),
            None => Ok(Vec::new()),
        }
    }
}

fn persisted_owner(candidate: Option<&Candidate>) -> Result<CandidateId, DocumentError> {
    candidate
        .and_then(|candidate| candidate.id)
        .ok_or(DocumentError::CandidateNotPersisted)
}

fn find_letter(
    tx: &mut dyn StorageTx,
    owner: CandidateId,
) -> Result<Option<Document>, RepositoryError> {
    Ok(tx
        .documents_for_candidate(owner)?
        .into_iter()
        .find(Document::is_motivation_letter))
}
