use crate::infra::{parse_date, parse_language};
use chrono::{Local, NaiveDate};
use clap::Args;
use recruiter::error::AppError;
use recruiter::workflows::application::{
    Candidate, DocumentSummary, Language, MemoryStorage, PageModel, SessionId, SessionStore,
    Skills, Step, StepOutcome, StorageCounts, Submission, WizardError, WizardService,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date the wizard treats as today (YYYY-MM-DD). Defaults to the local date.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Interface language picked on the agreement page.
    #[arg(long, value_parser = parse_language)]
    pub(crate) language: Option<Language>,
    /// Files to upload on the documents page. Two sample files are used when omitted.
    #[arg(long = "document")]
    pub(crate) documents: Vec<PathBuf>,
    /// Motivation letter text.
    #[arg(long, default_value = "I would like to help your team ship reliable software.")]
    pub(crate) letter: String,
}

/// Trace of one scripted run, printed by `run_demo`.
#[derive(Debug)]
pub(crate) struct DemoTranscript {
    pub(crate) lines: Vec<String>,
    pub(crate) review_documents: Vec<DocumentSummary>,
    pub(crate) storage: StorageCounts,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let transcript = run_scenario(args)?;

    println!("Recruiter application wizard demo");
    for line in &transcript.lines {
        println!("  {line}");
    }

    println!("\nReview page documents:");
    for document in &transcript.review_documents {
        println!("  - {} ({} bytes)", document.name, document.size);
    }

    println!(
        "\nRows kept after submission: {} candidate(s), {} skills row(s), {} document(s)",
        transcript.storage.candidates, transcript.storage.skills, transcript.storage.documents
    );
    Ok(())
}

pub(crate) fn run_scenario(args: DemoArgs) -> Result<DemoTranscript, AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let storage = Arc::new(MemoryStorage::new());
    let service = WizardService::new(storage.clone(), Language::default());
    let sessions = SessionStore::new();
    let (id, _) = sessions.resolve(None);
    let mut wizard = Walk {
        service: &service,
        sessions: &sessions,
        id,
        today,
        lines: Vec::new(),
    };

    if let Some(language) = args.language {
        wizard.post(Step::Agreement, language.code(), Submission::Empty)?;
    }
    wizard.post(Step::Agreement, "accept", Submission::Empty)?;
    wizard.post(Step::Candidate, "forward", Submission::Candidate(sample_candidate()))?;

    let mut skills = sample_skills();
    let (start, end) = (skills.start_date_experience, skills.end_date_experience);
    skills.start_date_experience = end;
    skills.end_date_experience = start;
    wizard.post(Step::Skills, "forward", Submission::Skills(skills))?;
    wizard.post(Step::Skills, "forward", Submission::Skills(sample_skills()))?;

    let uploads = load_documents(&args.documents)?;
    let mut stored = Vec::new();
    for (name, content) in uploads {
        let session = sessions.snapshot(id);
        let summary = service.upload(&session, &name, content)?;
        wizard.note(format!(
            "uploaded {} as document {}",
            summary.name,
            display_id(&summary)
        ));
        stored.push(summary);
    }
    if args.documents.is_empty() {
        if let Some(first) = stored.first().and_then(|summary| summary.id) {
            wizard.post(
                Step::Documents,
                "delete",
                Submission::DocumentSelection(Some(first.to_string())),
            )?;
        }
    }

    wizard.post(Step::Documents, "forward", Submission::Empty)?;
    wizard.post(
        Step::LetterOfMotivation,
        "forward",
        Submission::Letter(Some(args.letter)),
    )?;

    let review = service.render(&sessions.snapshot(id), Step::SubmitApplication, today)?;
    let review_documents = match review.model {
        PageModel::SubmitApplication { documents, .. } => documents,
        _ => Vec::new(),
    };

    wizard.post(Step::SubmitApplication, "submit", Submission::Empty)?;
    sessions.update(id, |session| service.enter(session, Step::ThankYou, today))?;
    let cleared = !sessions.snapshot(id).has_application();
    wizard.note(format!("session released after thank-you page: {cleared}"));

    Ok(DemoTranscript {
        lines: wizard.lines,
        review_documents,
        storage: storage.counts(),
    })
}

struct Walk<'a> {
    service: &'a WizardService<MemoryStorage>,
    sessions: &'a SessionStore,
    id: SessionId,
    today: NaiveDate,
    lines: Vec<String>,
}

impl Walk<'_> {
    fn post(&mut self, step: Step, token: &str, submission: Submission) -> Result<(), WizardError> {
        let outcome = self.sessions.update(self.id, |session| {
            self.service
                .submit(session, step, token, submission, self.today)
        })?;

        let line = match outcome {
            StepOutcome::Advance(next) => {
                format!("{} --{token}--> {}", step.label(), next.label())
            }
            StepOutcome::Rejected(view) => {
                let fields: Vec<&str> = view
                    .errors
                    .errors()
                    .iter()
                    .map(|error| error.field.as_str())
                    .collect();
                format!("{} --{token}--> rejected ({})", step.label(), fields.join(", "))
            }
            StepOutcome::UnexpectedAction { step, token } => {
                format!("{} does not offer '{token}'", step.label())
            }
        };
        self.lines.push(line);
        Ok(())
    }

    fn note(&mut self, line: String) {
        self.lines.push(line);
    }
}

fn load_documents(paths: &[PathBuf]) -> Result<Vec<(String, Vec<u8>)>, AppError> {
    if paths.is_empty() {
        return Ok(vec![
            ("curriculum-vitae.pdf".to_string(), b"%PDF-1.7 sample cv".to_vec()),
            ("certificate.pdf".to_string(), b"%PDF-1.7 sample certificate".to_vec()),
        ]);
    }

    paths
        .iter()
        .map(|path| -> Result<(String, Vec<u8>), AppError> {
            let content = std::fs::read(path)?;
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok((name, content))
        })
        .collect()
}

fn display_id(summary: &DocumentSummary) -> String {
    summary
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn sample_candidate() -> Candidate {
    Candidate {
        id: None,
        title: String::new(),
        first_name: "Alex".to_string(),
        last_name: "Muster".to_string(),
        street: "Bahnhofstrasse 12".to_string(),
        zip_code: "50667".to_string(),
        city: "Cologne".to_string(),
        email: "alex.muster@example.org".to_string(),
        phone: "+49 221 000000".to_string(),
    }
}

fn sample_skills() -> Skills {
    let month = |year: i32, month: u32| NaiveDate::from_ymd_opt(year, month, 1);
    Skills {
        id: None,
        candidate_id: None,
        start_date_education: month(2012, 10),
        end_date_education: month(2016, 9),
        prospective_end: false,
        start_date_experience: month(2016, 11),
        end_date_experience: month(2020, 6),
        has_no_experience: false,
        current_position: false,
        position: "Software developer".to_string(),
    }
}
