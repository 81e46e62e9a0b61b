use std::sync::Arc;

use super::common::*;

use crate::workflows::application::{
    CandidateId, DocumentKind, Language, PageModel, RepositoryError, Step, StepOutcome,
    Submission, WizardError, WizardService, WizardSession, MOTIVATION_LETTER_LABEL_KEY,
};

#[test]
fn language_choice_survives_accept() {
    let (service, _) = build_service();

    let (session, outcome) = service
        .submit(WizardSession::new(), Step::Agreement, "en", Submission::Empty, today())
        .expect("language chosen");
    assert_eq!(outcome, StepOutcome::Advance(Step::Agreement));
    assert_eq!(session.language, Some(Language::English));

    let session = advance(&service, session, Step::Agreement, "accept", Submission::Empty);
    assert_eq!(session.step, Step::Candidate);
    assert_eq!(session.language, Some(Language::English));
}

#[test]
fn accept_without_choice_stores_default_language() {
    let (service, _) = build_service();
    let session = advance(
        &service,
        WizardSession::new(),
        Step::Agreement,
        "accept",
        Submission::Empty,
    );
    assert_eq!(session.language, Some(Language::German));
}

#[test]
fn decline_leads_to_confirmation() {
    let (service, _) = build_service();
    let (_, outcome) = service
        .submit(WizardSession::new(), Step::Agreement, "decline", Submission::Empty, today())
        .expect("declined");
    assert_eq!(outcome, StepOutcome::Advance(Step::ConfirmCancellation));
}

#[test]
fn invalid_candidate_is_rejected_without_storage_writes() {
    let (service, storage) = build_service();
    let mut submitted = candidate();
    submitted.email = "not-an-address".to_string();
    submitted.first_name.clear();

    let session = WizardSession::new();
    let (after, outcome) = service
        .submit(
            session.clone(),
            Step::Candidate,
            "forward",
            Submission::Candidate(submitted),
            today(),
        )
        .expect("handled");

    let StepOutcome::Rejected(view) = outcome else {
        panic!("expected rejection, got {outcome:?}");
    };
    assert_eq!(view.step, Step::Candidate);
    assert!(view.errors.has_error_on("email"));
    assert!(view.errors.has_error_on("first_name"));
    assert!(matches!(view.model, PageModel::Candidate { .. }));
    assert_eq!(after, session);
    assert!(storage.journal().is_empty());
}

#[test]
fn forged_candidate_id_is_replaced_by_storage_identity() {
    let (service, storage) = build_service();
    let mut forged = candidate();
    forged.id = Some(CandidateId(999));

    let session = advance(
        &service,
        WizardSession::new(),
        Step::Candidate,
        "forward",
        Submission::Candidate(forged),
    );

    let id = session.candidate.as_ref().and_then(|c| c.id).expect("saved");
    assert_ne!(id, CandidateId(999));
    assert_eq!(storage.counts().candidates, 1);
}

#[test]
fn candidate_back_keeps_edits_in_session_only() {
    let (service, storage) = build_service();
    let mut draft = candidate();
    draft.first_name.clear();

    let session = advance(
        &service,
        WizardSession::new(),
        Step::Candidate,
        "back",
        Submission::Candidate(draft),
    );

    assert_eq!(session.step, Step::Agreement);
    assert_eq!(
        session.candidate.as_ref().map(|c| c.first_name.as_str()),
        Some("")
    );
    assert_eq!(storage.counts().candidates, 0);
}

#[test]
fn skills_dates_out_of_order_are_rejected_without_storage_writes() {
    let (service, storage) = build_service();
    let session = session_on_skills(&service);
    let events_before = storage.journal().len();

    let mut submitted = skills();
    submitted.start_date_education = Some(date(2019, 1, 1));
    submitted.end_date_education = Some(date(2016, 1, 1));

    let (after, outcome) = service
        .submit(
            session.clone(),
            Step::Skills,
            "forward",
            Submission::Skills(submitted),
            today(),
        )
        .expect("handled");

    let StepOutcome::Rejected(view) = outcome else {
        panic!("expected rejection, got {outcome:?}");
    };
    assert!(view.errors.has_error_on("end_date_education"));
    assert_eq!(after, session);
    assert_eq!(storage.counts().skills, 0);
    assert_eq!(storage.journal().len(), events_before);
}

#[test]
fn claimed_experience_without_dates_is_not_saved() {
    let (service, storage) = build_service();
    let session = session_on_skills(&service);

    let mut submitted = skills();
    submitted.start_date_experience = None;
    submitted.end_date_experience = None;

    let (after, outcome) = service
        .submit(
            session.clone(),
            Step::Skills,
            "forward",
            Submission::Skills(submitted),
            today(),
        )
        .expect("handled");

    let StepOutcome::Rejected(view) = outcome else {
        panic!("expected rejection, got {outcome:?}");
    };
    assert!(view.errors.has_error_on("start_date_experience"));
    assert!(view.errors.has_error_on("end_date_experience"));
    assert_eq!(after, session);
    assert_eq!(storage.counts().skills, 0);
}

#[test]
fn skills_rules_are_all_reported() {
    let (service, _) = build_service();
    let session = session_on_skills(&service);

    let mut submitted = skills();
    submitted.start_date_experience = Some(date(2022, 1, 1));
    submitted.end_date_experience = Some(date(2020, 1, 1));
    submitted.position.clear();
    submitted.prospective_end = true;

    let (_, outcome) = service
        .submit(session, Step::Skills, "forward", Submission::Skills(submitted), today())
        .expect("handled");

    let StepOutcome::Rejected(view) = outcome else {
        panic!("expected rejection, got {outcome:?}");
    };
    assert!(view.errors.has_error_on("end_date_experience"));
    assert!(view.errors.has_error_on("has_no_experience"));
    assert!(view.errors.has_error_on("prospective_end"));
}

#[test]
fn skills_are_saved_once_and_updated_afterwards() {
    let (service, storage) = build_service();
    let session = session_on_skills(&service);
    let owner = session.candidate.as_ref().and_then(|c| c.id);

    let session = advance(
        &service,
        session,
        Step::Skills,
        "forward",
        Submission::Skills(skills()),
    );
    let first = session.skills.clone().expect("skills saved");
    assert_eq!(first.candidate_id, owner);
    assert!(first.id.is_some());

    let session = advance(
        &service,
        session,
        Step::Documents,
        "back",
        Submission::DocumentSelection(None),
    );
    let mut revised = skills();
    revised.position = "Team lead".to_string();
    let session = advance(
        &service,
        session,
        Step::Skills,
        "forward",
        Submission::Skills(revised),
    );

    let second = session.skills.expect("skills saved");
    assert_eq!(second.id, first.id);
    assert_eq!(second.position, "Team lead");
    assert_eq!(storage.counts().skills, 1);
}

#[test]
fn skills_need_a_saved_candidate() {
    let (service, storage) = build_service();

    let result = service.submit(
        WizardSession::new(),
        Step::Skills,
        "forward",
        Submission::Skills(skills()),
        today(),
    );

    assert!(matches!(result, Err(WizardError::CandidateNotPersisted(_))));
    assert_eq!(storage.counts().skills, 0);
}

#[test]
fn unexpected_actions_change_nothing() {
    let (service, storage) = build_service();
    let session = session_on_skills(&service);
    let events_before = storage.journal().len();

    for (step, token) in [
        (Step::Documents, "accept"),
        (Step::ThankYou, "forward"),
        (Step::Skills, "explode"),
        (Step::Agreement, ""),
    ] {
        let (after, outcome) = service
            .submit(session.clone(), step, token, Submission::Empty, today())
            .expect("handled");
        assert_eq!(
            outcome,
            StepOutcome::UnexpectedAction {
                step,
                token: token.to_string()
            }
        );
        assert_eq!(after, session);
    }
    assert_eq!(storage.journal().len(), events_before);
}

#[test]
fn forward_without_fields_is_unexpected() {
    let (service, storage) = build_service();
    let (_, outcome) = service
        .submit(WizardSession::new(), Step::Candidate, "forward", Submission::Empty, today())
        .expect("handled");
    assert!(matches!(outcome, StepOutcome::UnexpectedAction { .. }));
    assert_eq!(storage.counts().candidates, 0);
}

#[test]
fn blank_delete_selection_is_a_no_op() {
    let (service, storage) = build_service();
    let session = session_on_skills(&service);
    service
        .upload(&session, "cv.pdf", b"%PDF".to_vec())
        .expect("upload");

    let session = advance(
        &service,
        session,
        Step::Documents,
        "delete",
        Submission::DocumentSelection(Some("  ".to_string())),
    );

    assert_eq!(session.step, Step::Documents);
    assert_eq!(storage.counts().documents, 1);
}

#[test]
fn review_lists_uploads_and_relabelled_letter() {
    let (service, _) = build_service();
    let session = session_on_skills(&service);
    let session = advance(
        &service,
        session,
        Step::Skills,
        "forward",
        Submission::Skills(skills()),
    );
    service
        .upload(&session, "cv.pdf", b"%PDF".to_vec())
        .expect("upload");
    let session = advance(
        &service,
        session,
        Step::LetterOfMotivation,
        "forward",
        Submission::Letter(Some("Dear team".to_string())),
    );

    let view = service
        .render(&session, Step::SubmitApplication, today())
        .expect("review page");
    let PageModel::SubmitApplication { documents, .. } = view.model else {
        panic!("expected review model");
    };
    assert_eq!(documents.len(), 2);
    assert!(documents.iter().any(|summary| {
        summary.kind == DocumentKind::MotivationLetter
            && summary.name == MOTIVATION_LETTER_LABEL_KEY
    }));

    let letter = service
        .render(&session, Step::LetterOfMotivation, today())
        .expect("letter page");
    assert_eq!(
        letter.model,
        PageModel::LetterOfMotivation {
            letter: "Dear team".to_string()
        }
    );
}

#[test]
fn thank_you_releases_the_session_but_keeps_rows() {
    let (service, storage) = build_service();
    let session = session_on_skills(&service);
    let session = advance(
        &service,
        session,
        Step::Skills,
        "forward",
        Submission::Skills(skills()),
    );
    let session = advance(
        &service,
        session,
        Step::SubmitApplication,
        "submit",
        Submission::Empty,
    );

    let (session, view) = service
        .enter(session, Step::ThankYou, today())
        .expect("thank you page");

    assert_eq!(view.model, PageModel::ThankYou);
    assert!(!session.has_application());
    assert_eq!(storage.counts().candidates, 1);
    assert_eq!(storage.counts().skills, 1);
}

#[test]
fn views_carry_reference_data_and_language() {
    let (service, _) = build_service();
    let session = WizardSession {
        language: Some(Language::English),
        ..WizardSession::new()
    };

    let view = service
        .render(&session, Step::Skills, today())
        .expect("skills page");

    assert_eq!(view.selected_language, Language::English);
    assert_eq!(view.reference.month_list.len(), 12);
    assert_eq!(
        view.reference.year_list_end.last().map(|o| o.value.as_str()),
        Some("2032")
    );
    assert!(view.errors.is_empty());
}

#[test]
fn storage_failures_surface_as_repository_errors() {
    let service = WizardService::new(Arc::new(UnavailableStorage), Language::German);

    let result = service.submit(
        WizardSession::new(),
        Step::Candidate,
        "forward",
        Submission::Candidate(candidate()),
        today(),
    );

    assert!(matches!(
        result,
        Err(WizardError::Repository(RepositoryError::Unavailable(_)))
    ));
}
