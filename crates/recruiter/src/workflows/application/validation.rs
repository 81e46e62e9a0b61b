use chrono::NaiveDate;
use serde::Serialize;
use validator::{Validate, ValidationErrors};

use super::domain::Skills;

/// Field-level error reported back to the step that rejected a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FieldError {
    pub fn new(field: &str, code: &str) -> Self {
        Self {
            field: field.to_string(),
            code: code.to_string(),
            message: None,
        }
    }
}

/// Collected errors for one submission. Empty means the submission may proceed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationReport {
    errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn has_error_on(&self, field: &str) -> bool {
        self.errors.iter().any(|error| error.field == field)
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    fn absorb(&mut self, errors: ValidationErrors) {
        let mut collected: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, list)| {
                let field = field.to_string();
                list.iter().map(move |error| FieldError {
                    field: field.clone(),
                    code: error.code.to_string(),
                    message: error.message.as_ref().map(|message| message.to_string()),
                })
            })
            .collect();
        // field_errors() is a hash map; keep the report stable for clients and tests.
        collected.sort_by(|left, right| left.field.cmp(&right.field));
        self.errors.extend(collected);
    }
}

/// Per-field checks declared on the domain types.
pub fn structural<T: Validate>(entity: &T) -> ValidationReport {
    let mut report = ValidationReport::default();
    if let Err(errors) = entity.validate() {
        report.absorb(errors);
    }
    report
}

pub const REQUIRED: &str = "required";
pub const ENDS_BEFORE_START: &str = "ends_before_start";
pub const EITHER_CHECK_BOX_OR_POSITION: &str = "either_check_box_or_position_field";
pub const PROSPECTIVE_MEANS_FUTURE: &str = "prospective_means_future";
pub const CURRENT_HAS_NOT_ENDED_YET: &str = "current_has_not_ended_yet";

/// Cross-field rules for the skills step. Every rule is evaluated; none short-circuits.
///
/// Dates carry no time of day, so a date is "in the future" only when it lies after
/// `today`.
pub fn skills_rules(skills: &Skills, today: NaiveDate) -> ValidationReport {
    let mut report = ValidationReport::default();
    let has_experience = !skills.has_no_experience;

    if ends_before_start(skills.start_date_education, skills.end_date_education) {
        report.push(FieldError::new("end_date_education", ENDS_BEFORE_START));
    }

    if has_experience
        && ends_before_start(skills.start_date_experience, skills.end_date_experience)
    {
        report.push(FieldError::new("end_date_experience", ENDS_BEFORE_START));
    }

    if has_experience && skills.position.trim().is_empty() {
        report.push(FieldError::new(
            "has_no_experience",
            EITHER_CHECK_BOX_OR_POSITION,
        ));
    }

    if skills.prospective_end && !is_future(skills.end_date_education, today) {
        report.push(FieldError::new("prospective_end", PROSPECTIVE_MEANS_FUTURE));
    }

    if has_experience && skills.current_position && !is_future(skills.end_date_experience, today)
    {
        report.push(FieldError::new(
            "current_position",
            CURRENT_HAS_NOT_ENDED_YET,
        ));
    }

    report
}

/// Structural checks followed by the business rules, as run on the skills Forward.
pub fn skills_report(skills: &Skills, today: NaiveDate) -> ValidationReport {
    let mut report = structural(skills);
    report.errors.extend(experience_dates(skills).errors);
    report.errors.extend(skills_rules(skills, today).errors);
    report
}

/// Both experience dates are required unless the candidate has none.
fn experience_dates(skills: &Skills) -> ValidationReport {
    let mut report = ValidationReport::default();
    if skills.has_no_experience {
        return report;
    }

    for (field, value) in [
        ("start_date_experience", skills.start_date_experience),
        ("end_date_experience", skills.end_date_experience),
    ] {
        if value.is_none() {
            report.push(FieldError {
                message: Some(REQUIRED.to_string()),
                ..FieldError::new(field, REQUIRED)
            });
        }
    }
    report
}

fn ends_before_start(start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    matches!((start, end), (Some(start), Some(end)) if start > end)
}

fn is_future(date: Option<NaiveDate>, today: NaiveDate) -> bool {
    date.map_or(false, |date| date > today)
}
