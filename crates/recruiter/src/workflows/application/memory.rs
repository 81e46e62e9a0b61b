use std::collections::BTreeMap;
use std::sync::Mutex;

use super::domain::{Candidate, CandidateId, Document, DocumentId, Skills, SkillsId};
use super::repository::{RepositoryError, Storage, StorageTx};

/// Row reference recorded in the storage journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredRecord {
    Candidate(CandidateId),
    Skills(SkillsId),
    Document(DocumentId),
}

/// Committed write, in commit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageEvent {
    Inserted(StoredRecord),
    Updated(StoredRecord),
    Deleted(StoredRecord),
}

impl StorageEvent {
    pub fn is_delete(&self) -> bool {
        matches!(self, StorageEvent::Deleted(_))
    }
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageCounts {
    pub candidates: usize,
    pub skills: usize,
    pub documents: usize,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    last_id: i64,
    candidates: BTreeMap<CandidateId, Candidate>,
    skills: BTreeMap<SkillsId, Skills>,
    documents: BTreeMap<DocumentId, Document>,
    journaling: bool,
    journal: Vec<StorageEvent>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn record(&mut self, event: StorageEvent) {
        if self.journaling {
            self.journal.push(event);
        }
    }

    fn require_owner(&self, candidate_id: CandidateId) -> Result<(), RepositoryError> {
        if self.candidates.contains_key(&candidate_id) {
            Ok(())
        } else {
            Err(RepositoryError::MissingOwner(candidate_id))
        }
    }
}

/// In-process store enforcing the same key constraints as the relational schema:
/// skills and documents need an existing candidate, a candidate holds at most one
/// skills row, and a candidate cannot be deleted while rows still reference it.
///
/// Transactions run against a copy of the tables that replaces the committed state only
/// when the work succeeds. Committed writes are journaled only when built with
/// [`MemoryStorage::with_journal`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: Mutex<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that also records every committed write, for asserting on write order.
    pub fn with_journal() -> Self {
        Self {
            tables: Mutex::new(Tables {
                journaling: true,
                ..Tables::default()
            }),
        }
    }

    pub fn counts(&self) -> StorageCounts {
        self.read(|tables| StorageCounts {
            candidates: tables.candidates.len(),
            skills: tables.skills.len(),
            documents: tables.documents.len(),
        })
    }

    /// Committed writes in order; always empty unless journaling was requested.
    pub fn journal(&self) -> Vec<StorageEvent> {
        self.read(|tables| tables.journal.clone())
    }

    fn read<T>(&self, view: impl FnOnce(&Tables) -> T) -> T {
        let guard = self
            .tables
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        view(&guard)
    }
}

impl Storage for MemoryStorage {
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StorageTx) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut committed = self.tables.lock().map_err(|_| {
            E::from(RepositoryError::Unavailable(
                "memory storage lock poisoned".to_string(),
            ))
        })?;

        let mut working = committed.clone();
        let value = work(&mut working)?;
        *committed = working;
        Ok(value)
    }
}

impl StorageTx for Tables {
    fn save_candidate(&mut self, mut candidate: Candidate) -> Result<Candidate, RepositoryError> {
        match candidate.id {
            None => {
                let id = CandidateId(self.next_id());
                candidate.id = Some(id);
                self.candidates.insert(id, candidate.clone());
                self.record(StorageEvent::Inserted(StoredRecord::Candidate(id)));
            }
            Some(id) => {
                let row = self
                    .candidates
                    .get_mut(&id)
                    .ok_or(RepositoryError::NotFound)?;
                *row = candidate.clone();
                self.record(StorageEvent::Updated(StoredRecord::Candidate(id)));
            }
        }
        Ok(candidate)
    }

    fn find_candidate(&self, id: CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        Ok(self.candidates.get(&id).cloned())
    }

    fn delete_candidate(&mut self, id: CandidateId) -> Result<(), RepositoryError> {
        if !self.candidates.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        if self.skills.values().any(|row| row.candidate_id == Some(id)) {
            return Err(RepositoryError::StillReferenced {
                candidate_id: id,
                referenced_by: "skills",
            });
        }
        if self.documents.values().any(|row| row.candidate_id == id) {
            return Err(RepositoryError::StillReferenced {
                candidate_id: id,
                referenced_by: "documents",
            });
        }

        self.candidates.remove(&id);
        self.record(StorageEvent::Deleted(StoredRecord::Candidate(id)));
        Ok(())
    }

    fn save_skills(&mut self, mut skills: Skills) -> Result<Skills, RepositoryError> {
        let owner = skills.candidate_id.ok_or(RepositoryError::Unowned)?;
        self.require_owner(owner)?;

        let duplicate = self
            .skills
            .values()
            .any(|row| row.candidate_id == Some(owner) && row.id != skills.id);
        if duplicate {
            return Err(RepositoryError::Conflict);
        }

        match skills.id {
            None => {
                let id = SkillsId(self.next_id());
                skills.id = Some(id);
                self.skills.insert(id, skills.clone());
                self.record(StorageEvent::Inserted(StoredRecord::Skills(id)));
            }
            Some(id) => {
                let row = self.skills.get_mut(&id).ok_or(RepositoryError::NotFound)?;
                *row = skills.clone();
                self.record(StorageEvent::Updated(StoredRecord::Skills(id)));
            }
        }
        Ok(skills)
    }

    fn find_skills(&self, id: SkillsId) -> Result<Option<Skills>, RepositoryError> {
        Ok(self.skills.get(&id).cloned())
    }

    fn delete_skills(&mut self, id: SkillsId) -> Result<(), RepositoryError> {
        self.skills.remove(&id).ok_or(RepositoryError::NotFound)?;
        self.record(StorageEvent::Deleted(StoredRecord::Skills(id)));
        Ok(())
    }

    fn save_document(&mut self, mut document: Document) -> Result<Document, RepositoryError> {
        self.require_owner(document.candidate_id)?;

        match document.id {
            None => {
                let id = DocumentId(self.next_id());
                document.id = Some(id);
                self.documents.insert(id, document.clone());
                self.record(StorageEvent::Inserted(StoredRecord::Document(id)));
            }
            Some(id) => {
                let row = self
                    .documents
                    .get_mut(&id)
                    .ok_or(RepositoryError::NotFound)?;
                *row = document.clone();
                self.record(StorageEvent::Updated(StoredRecord::Document(id)));
            }
        }
        Ok(document)
    }

    fn find_document(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError> {
        Ok(self.documents.get(&id).cloned())
    }

    fn documents_for_candidate(
        &self,
        candidate_id: CandidateId,
    ) -> Result<Vec<Document>, RepositoryError> {
        Ok(self
            .documents
            .values()
            .filter(|row| row.candidate_id == candidate_id)
            .cloned()
            .collect())
    }

    fn delete_document(&mut self, id: DocumentId) -> Result<(), RepositoryError> {
        self.documents.remove(&id).ok_or(RepositoryError::NotFound)?;
        self.record(StorageEvent::Deleted(StoredRecord::Document(id)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> Candidate {
        Candidate {
            first_name: "Grace".to_string(),
            ..Candidate::default()
        }
    }

    #[test]
    fn journal_is_opt_in() {
        let plain = MemoryStorage::new();
        plain
            .transaction(|tx| tx.save_candidate(candidate()))
            .expect("candidate saved");
        assert!(plain.journal().is_empty());
        assert_eq!(plain.counts().candidates, 1);

        let journaled = MemoryStorage::with_journal();
        let saved = journaled
            .transaction(|tx| tx.save_candidate(candidate()))
            .expect("candidate saved");
        let id = saved.id.expect("id assigned");
        assert_eq!(
            journaled.journal(),
            vec![StorageEvent::Inserted(StoredRecord::Candidate(id))]
        );
    }
}
