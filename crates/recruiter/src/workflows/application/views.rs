use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::domain::{Candidate, DocumentSummary, Language, Skills};
use super::state::Step;
use super::validation::ValidationReport;

const FIRST_LISTED_YEAR: i32 = 1970;
const END_YEAR_HORIZON: i32 = 8;

const MONTH_KEYS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// One entry of an ordered dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Dropdown contents shared by every page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceData {
    pub year_list_start: Vec<SelectOption>,
    pub year_list_end: Vec<SelectOption>,
    pub month_list: Vec<SelectOption>,
    pub language_list: Vec<SelectOption>,
}

impl ReferenceData {
    pub fn for_date(today: NaiveDate) -> Self {
        let current_year = today.year();
        Self {
            year_list_start: year_options(current_year),
            year_list_end: year_options(current_year + END_YEAR_HORIZON),
            month_list: month_options(),
            language_list: language_options(),
        }
    }
}

/// Years from 1970 up to and including `last_year`.
pub fn year_options(last_year: i32) -> Vec<SelectOption> {
    (FIRST_LISTED_YEAR..=last_year)
        .map(|year| SelectOption::new(year.to_string(), year.to_string()))
        .collect()
}

/// Zero-based month ordinals mapped to their translation keys.
pub fn month_options() -> Vec<SelectOption> {
    MONTH_KEYS
        .iter()
        .enumerate()
        .map(|(ordinal, key)| SelectOption::new(ordinal.to_string(), *key))
        .collect()
}

pub fn language_options() -> Vec<SelectOption> {
    Language::ordered()
        .into_iter()
        .map(|language| SelectOption::new(language.code(), language.label()))
        .collect()
}

/// Page-specific model handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum PageModel {
    Agreement,
    Candidate {
        candidate: Candidate,
    },
    Skills {
        skills: Skills,
    },
    Documents {
        documents: Vec<DocumentSummary>,
    },
    LetterOfMotivation {
        letter: String,
    },
    SubmitApplication {
        candidate: Candidate,
        skills: Skills,
        documents: Vec<DocumentSummary>,
    },
    ThankYou,
    ConfirmCancellation,
}

/// Everything a page needs to render, including field errors after a rejected submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepView {
    pub step: Step,
    pub selected_language: Language,
    pub reference: ReferenceData,
    pub model: PageModel,
    #[serde(skip_serializing_if = "ValidationReport::is_empty")]
    pub errors: ValidationReport,
}

impl StepView {
    pub fn new(
        step: Step,
        selected_language: Language,
        today: NaiveDate,
        model: PageModel,
    ) -> Self {
        Self {
            step,
            selected_language,
            reference: ReferenceData::for_date(today),
            model,
            errors: ValidationReport::default(),
        }
    }

    pub fn with_errors(mut self, errors: ValidationReport) -> Self {
        self.errors = errors;
        self
    }
}
