use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::domain::{Candidate, Language, Skills};
use super::state::Step;

/// Per-user working set threaded through every wizard transition.
///
/// Documents are not cached here; they are read from storage through the candidate id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardSession {
    pub step: Step,
    pub candidate: Option<Candidate>,
    pub skills: Option<Skills>,
    pub language: Option<Language>,
}

impl WizardSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Working candidate, or an empty one when the slot is vacant.
    pub fn candidate_or_default(&self) -> Candidate {
        self.candidate.clone().unwrap_or_default()
    }

    pub fn skills_or_default(&self) -> Skills {
        self.skills.clone().unwrap_or_default()
    }

    pub fn language_or(&self, default: Language) -> Language {
        self.language.unwrap_or(default)
    }

    /// Drop the application slots. Storage is left untouched and the language survives.
    pub fn clear_application(&mut self) {
        self.candidate = None;
        self.skills = None;
    }

    pub fn has_application(&self) -> bool {
        self.candidate.is_some() || self.skills.is_some()
    }
}

/// Opaque key of a browser session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(raw.trim()).map(Self)
    }
}

type SessionSlot = Arc<Mutex<WizardSession>>;

const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug)]
struct Entry {
    slot: SessionSlot,
    last_seen: Instant,
}

impl Entry {
    fn fresh(now: Instant) -> Self {
        Self {
            slot: Arc::new(Mutex::new(WizardSession::new())),
            last_seen: now,
        }
    }
}

/// Process-local session store.
///
/// Each session sits behind its own mutex and `update` holds it for the whole
/// transition, so two submissions from one browser are applied one after the other:
/// the second observes the identity assigned by the first instead of inserting again.
///
/// Sessions idle for longer than the timeout are dropped on the next `resolve`.
#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionId, Entry>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Return the id of a live session, creating a fresh one for unknown, expired,
    /// or missing ids.
    pub fn resolve(&self, requested: Option<SessionId>) -> (SessionId, bool) {
        self.resolve_at(requested, Instant::now())
    }

    pub(crate) fn resolve_at(
        &self,
        requested: Option<SessionId>,
        now: Instant,
    ) -> (SessionId, bool) {
        let mut sessions = self.lock_index();
        let idle_timeout = self.idle_timeout;
        let before = sessions.len();
        sessions.retain(|_, entry| now.saturating_duration_since(entry.last_seen) < idle_timeout);
        let expired = before - sessions.len();
        if expired > 0 {
            debug!(expired, live = sessions.len(), "dropped idle sessions");
        }

        if let Some(id) = requested {
            if let Some(entry) = sessions.get_mut(&id) {
                entry.last_seen = now;
                return (id, false);
            }
        }

        let id = SessionId::generate();
        sessions.insert(id, Entry::fresh(now));
        (id, true)
    }

    /// Copy of the current session value.
    pub fn snapshot(&self, id: SessionId) -> WizardSession {
        let slot = self.slot(id);
        let session = slot.lock().unwrap_or_else(PoisonError::into_inner);
        session.clone()
    }

    /// Run `work` inside the session's critical section and store the session it
    /// returns. On error the stored session is left as it was.
    pub fn update<T, E, F>(&self, id: SessionId, work: F) -> Result<T, E>
    where
        F: FnOnce(WizardSession) -> Result<(WizardSession, T), E>,
    {
        let slot = self.slot(id);
        let mut current = slot.lock().unwrap_or_else(PoisonError::into_inner);
        let (next, value) = work(current.clone())?;
        *current = next;
        Ok(value)
    }

    /// Forget a session before its idle timeout.
    pub fn discard(&self, id: SessionId) -> bool {
        self.lock_index().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock_index().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, id: SessionId) -> SessionSlot {
        let now = Instant::now();
        let mut sessions = self.lock_index();
        let entry = sessions.entry(id).or_insert_with(|| Entry::fresh(now));
        entry.last_seen = now;
        entry.slot.clone()
    }

    fn lock_index(&self) -> MutexGuard<'_, HashMap<SessionId, Entry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
