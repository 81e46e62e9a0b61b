use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Name under which the motivation letter is stored alongside uploaded files.
pub const MOTIVATION_LETTER_NAME: &str = "Motivationsschreiben";

/// Translation key shown instead of the stored letter name on the review page.
pub const MOTIVATION_LETTER_LABEL_KEY: &str = "translateMotivationsschreiben";

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Storage-assigned identifier of a candidate row.
    CandidateId
);
record_id!(
    /// Storage-assigned identifier of a skills row.
    SkillsId
);
record_id!(
    /// Storage-assigned identifier of a document row.
    DocumentId
);

/// Contact data collected on the candidate step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Candidate {
    pub id: Option<CandidateId>,
    pub title: String,
    #[validate(length(min = 1, message = "required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "required"))]
    pub last_name: String,
    #[validate(length(min = 1, message = "required"))]
    pub street: String,
    #[validate(length(min = 1, max = 10, message = "invalid zip code"))]
    pub zip_code: String,
    #[validate(length(min = 1, message = "required"))]
    pub city: String,
    #[validate(email(message = "invalid e-mail address"))]
    pub email: String,
    pub phone: String,
}

/// Education and work experience collected on the skills step.
///
/// Dates are the first day of the month picked in the form. They stay optional so a
/// half-filled draft can be carried back to an earlier step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Skills {
    pub id: Option<SkillsId>,
    pub candidate_id: Option<CandidateId>,
    #[validate(required(message = "required"))]
    pub start_date_education: Option<NaiveDate>,
    #[validate(required(message = "required"))]
    pub end_date_education: Option<NaiveDate>,
    pub prospective_end: bool,
    pub start_date_experience: Option<NaiveDate>,
    pub end_date_experience: Option<NaiveDate>,
    pub has_no_experience: bool,
    pub current_position: bool,
    #[validate(length(max = 255, message = "too long"))]
    pub position: String,
}

/// Distinguishes the free-text motivation letter from uploaded files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Uploaded,
    MotivationLetter,
}

/// Binary document owned by a persisted candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: Option<DocumentId>,
    pub candidate_id: CandidateId,
    pub name: String,
    pub kind: DocumentKind,
    pub content: Vec<u8>,
}

impl Document {
    pub fn uploaded(candidate_id: CandidateId, name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            id: None,
            candidate_id,
            name: name.into(),
            kind: DocumentKind::Uploaded,
            content,
        }
    }

    pub fn motivation_letter(candidate_id: CandidateId, text: &str) -> Self {
        Self {
            id: None,
            candidate_id,
            name: MOTIVATION_LETTER_NAME.to_string(),
            kind: DocumentKind::MotivationLetter,
            content: text.as_bytes().to_vec(),
        }
    }

    pub fn is_motivation_letter(&self) -> bool {
        self.kind == DocumentKind::MotivationLetter
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            size: self.content.len(),
        }
    }
}

/// Content-free projection of a document handed to the views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub id: Option<DocumentId>,
    pub name: String,
    pub kind: DocumentKind,
    pub size: usize,
}

/// Interface languages offered on the agreement page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "de")]
    German,
    #[serde(rename = "en")]
    English,
}

impl Language {
    pub const fn ordered() -> [Self; 2] {
        [Self::German, Self::English]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::German => "de",
            Self::English => "en",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::German => "Deutsch",
            Self::English => "English",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|language| language.code().eq_ignore_ascii_case(code.trim()))
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::German
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
