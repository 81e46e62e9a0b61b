use chrono::NaiveDate;
use serde::Deserialize;

use super::domain::{Candidate, Skills};
use super::service::Submission;

/// Form posted by pages that carry nothing but the pressed button.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ActionForm {
    #[serde(default)]
    pub(crate) action: String,
}

impl ActionForm {
    pub(crate) fn into_parts(self) -> (String, Submission) {
        (self.action, Submission::Empty)
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CandidateForm {
    #[serde(default)]
    pub(crate) action: String,
    #[serde(default)]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) first_name: String,
    #[serde(default)]
    pub(crate) last_name: String,
    #[serde(default)]
    pub(crate) street: String,
    #[serde(default)]
    pub(crate) zip_code: String,
    #[serde(default)]
    pub(crate) city: String,
    #[serde(default)]
    pub(crate) email: String,
    #[serde(default)]
    pub(crate) phone: String,
}

impl CandidateForm {
    pub(crate) fn into_parts(self) -> (String, Submission) {
        let candidate = Candidate {
            id: None,
            title: self.title.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            street: self.street.trim().to_string(),
            zip_code: self.zip_code.trim().to_string(),
            city: self.city.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
        };
        (self.action, Submission::Candidate(candidate))
    }
}

/// Skills page fields. Each date is posted as a year and a zero-based month.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SkillsForm {
    #[serde(default)]
    pub(crate) action: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) start_date_education_year: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) start_date_education_month: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) end_date_education_year: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) end_date_education_month: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) prospective_end: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) start_date_experience_year: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) start_date_experience_month: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) end_date_experience_year: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) end_date_experience_month: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) has_no_experience: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) current_position: Option<String>,
    #[serde(default)]
    pub(crate) position: String,
}

impl SkillsForm {
    pub(crate) fn into_parts(self) -> (String, Submission) {
        let skills = Skills {
            id: None,
            candidate_id: None,
            start_date_education: month_start(
                self.start_date_education_year.as_deref(),
                self.start_date_education_month.as_deref(),
            ),
            end_date_education: month_start(
                self.end_date_education_year.as_deref(),
                self.end_date_education_month.as_deref(),
            ),
            prospective_end: checked(self.prospective_end.as_deref()),
            start_date_experience: month_start(
                self.start_date_experience_year.as_deref(),
                self.start_date_experience_month.as_deref(),
            ),
            end_date_experience: month_start(
                self.end_date_experience_year.as_deref(),
                self.end_date_experience_month.as_deref(),
            ),
            has_no_experience: checked(self.has_no_experience.as_deref()),
            current_position: checked(self.current_position.as_deref()),
            position: self.position.trim().to_string(),
        };
        (self.action, Submission::Skills(skills))
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DocumentsForm {
    #[serde(default)]
    pub(crate) action: String,
    /// Comma separated ids of the ticked documents.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) documents: Option<String>,
}

impl DocumentsForm {
    pub(crate) fn into_parts(self) -> (String, Submission) {
        (self.action, Submission::DocumentSelection(self.documents))
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LetterForm {
    #[serde(default)]
    pub(crate) action: String,
    #[serde(default)]
    pub(crate) letter: Option<String>,
}

impl LetterForm {
    pub(crate) fn into_parts(self) -> (String, Submission) {
        (self.action, Submission::Letter(self.letter))
    }
}

/// First day of the picked month. Months are zero-based, as in the dropdown.
pub(crate) fn month_start(year: Option<&str>, month: Option<&str>) -> Option<NaiveDate> {
    let year = year?.trim().parse::<i32>().ok()?;
    let month = month?.trim().parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month.checked_add(1)?, 1)
}

pub(crate) fn checked(value: Option<&str>) -> bool {
    matches!(
        value.map(|raw| raw.trim().to_ascii_lowercase()).as_deref(),
        Some("on" | "true" | "1" | "yes")
    )
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
