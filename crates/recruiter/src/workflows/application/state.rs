use serde::{Deserialize, Serialize};

use super::domain::Language;

/// Pages of the application wizard, in navigation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Agreement,
    Candidate,
    Skills,
    Documents,
    LetterOfMotivation,
    SubmitApplication,
    ThankYou,
    ConfirmCancellation,
}

impl Step {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::Agreement,
            Self::Candidate,
            Self::Skills,
            Self::Documents,
            Self::LetterOfMotivation,
            Self::SubmitApplication,
            Self::ThankYou,
            Self::ConfirmCancellation,
        ]
    }

    pub const fn path(self) -> &'static str {
        match self {
            Self::Agreement => "/",
            Self::Candidate => "/candidate",
            Self::Skills => "/skills",
            Self::Documents => "/documents",
            Self::LetterOfMotivation => "/letterOfMotivation",
            Self::SubmitApplication => "/submitApplication",
            Self::ThankYou => "/thankYou",
            Self::ConfirmCancellation => "/confirmCancellation",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Agreement => "agreement",
            Self::Candidate => "candidate",
            Self::Skills => "skills",
            Self::Documents => "documents",
            Self::LetterOfMotivation => "letter_of_motivation",
            Self::SubmitApplication => "submit_application",
            Self::ThankYou => "thank_you",
            Self::ConfirmCancellation => "confirm_cancellation",
        }
    }
}

impl Default for Step {
    fn default() -> Self {
        Self::Agreement
    }
}

/// Closed set of buttons a wizard page can post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Accept,
    Decline,
    SelectLanguage(Language),
    Forward,
    Back,
    Cancel,
    Delete,
    Submit,
    BackToStart,
}

impl Action {
    /// Resolve a posted action token. Unknown tokens yield `None`.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        let action = match token {
            "accept" => Self::Accept,
            "decline" => Self::Decline,
            "forward" => Self::Forward,
            "back" => Self::Back,
            "cancel" => Self::Cancel,
            "delete" => Self::Delete,
            "submit" => Self::Submit,
            "back_to_start" => Self::BackToStart,
            other => Self::SelectLanguage(Language::from_code(other)?),
        };
        Some(action)
    }
}

/// Side effect the state machine applies before moving to the next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    ChooseLanguage(Language),
    ConfirmLanguage,
    /// Validate, reconcile, and save the candidate.
    PersistCandidate,
    /// Reconcile the candidate into the session without validating or saving.
    StashCandidate,
    PersistSkills,
    StashSkills,
    DeleteDocuments,
    SaveLetter,
}

/// Outcome of the transition table for a `(step, action)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: Step,
    pub effect: Effect,
}

const fn go(next: Step, effect: Effect) -> Option<Transition> {
    Some(Transition { next, effect })
}

/// The wizard's transition table. `None` marks an action the step does not offer.
pub fn transition(step: Step, action: Action) -> Option<Transition> {
    use Action as A;
    use Step as S;

    match (step, action) {
        (S::Agreement, A::SelectLanguage(language)) => {
            go(S::Agreement, Effect::ChooseLanguage(language))
        }
        (S::Agreement, A::Accept) => go(S::Candidate, Effect::ConfirmLanguage),
        (S::Agreement, A::Decline) => go(S::ConfirmCancellation, Effect::None),

        (S::Candidate, A::Forward) => go(S::Skills, Effect::PersistCandidate),
        (S::Candidate, A::Back) => go(S::Agreement, Effect::StashCandidate),

        (S::Skills, A::Forward) => go(S::Documents, Effect::PersistSkills),
        (S::Skills, A::Back) => go(S::Candidate, Effect::StashSkills),

        (S::Documents, A::Forward) => go(S::LetterOfMotivation, Effect::None),
        (S::Documents, A::Back) => go(S::Skills, Effect::None),
        (S::Documents, A::Delete) => go(S::Documents, Effect::DeleteDocuments),

        (S::LetterOfMotivation, A::Forward) => go(S::SubmitApplication, Effect::SaveLetter),
        (S::LetterOfMotivation, A::Back) => go(S::Documents, Effect::SaveLetter),

        (S::SubmitApplication, A::Submit) => go(S::ThankYou, Effect::None),
        (S::SubmitApplication, A::Back) => go(S::LetterOfMotivation, Effect::None),

        (
            S::Candidate | S::Skills | S::Documents | S::LetterOfMotivation | S::SubmitApplication,
            A::Cancel,
        ) => go(S::ConfirmCancellation, Effect::None),

        (S::ConfirmCancellation, A::BackToStart) => go(S::Agreement, Effect::None),

        (
            S::Agreement
            | S::Candidate
            | S::Skills
            | S::Documents
            | S::LetterOfMotivation
            | S::SubmitApplication
            | S::ThankYou
            | S::ConfirmCancellation,
            _,
        ) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_tokens_and_language_codes() {
        assert_eq!(Action::parse("forward"), Some(Action::Forward));
        assert_eq!(Action::parse(" back_to_start "), Some(Action::BackToStart));
        assert_eq!(
            Action::parse("en"),
            Some(Action::SelectLanguage(Language::English))
        );
        assert_eq!(Action::parse("contactData_Forward"), None);
        assert_eq!(Action::parse(""), None);
    }

    #[test]
    fn forward_walks_the_happy_path() {
        let mut step = Step::Candidate;
        let mut visited = vec![step];
        while let Some(next) = transition(step, Action::Forward) {
            step = next.next;
            visited.push(step);
        }

        assert_eq!(
            visited,
            vec![
                Step::Candidate,
                Step::Skills,
                Step::Documents,
                Step::LetterOfMotivation,
                Step::SubmitApplication,
            ]
        );
        assert_eq!(
            transition(Step::SubmitApplication, Action::Submit).map(|t| t.next),
            Some(Step::ThankYou)
        );
    }

    #[test]
    fn cancel_is_offered_on_every_form_step() {
        for step in [
            Step::Candidate,
            Step::Skills,
            Step::Documents,
            Step::LetterOfMotivation,
            Step::SubmitApplication,
        ] {
            let cancel = transition(step, Action::Cancel).expect("cancel offered");
            assert_eq!(cancel.next, Step::ConfirmCancellation);
            assert_eq!(cancel.effect, Effect::None);
        }
        assert_eq!(transition(Step::ThankYou, Action::Cancel), None);
    }

    #[test]
    fn back_only_stashes_entities() {
        assert_eq!(
            transition(Step::Candidate, Action::Back).map(|t| t.effect),
            Some(Effect::StashCandidate)
        );
        assert_eq!(
            transition(Step::Skills, Action::Back).map(|t| t.effect),
            Some(Effect::StashSkills)
        );
    }

    #[test]
    fn foreign_actions_are_rejected() {
        assert_eq!(transition(Step::Candidate, Action::Accept), None);
        assert_eq!(transition(Step::Agreement, Action::Forward), None);
        assert_eq!(transition(Step::Documents, Action::Submit), None);
        assert_eq!(
            transition(Step::Skills, Action::SelectLanguage(Language::English)),
            None
        );
        assert_eq!(transition(Step::ThankYou, Action::Back), None);
    }

    #[test]
    fn paths_are_unique() {
        let mut paths: Vec<&str> = Step::ordered().iter().map(|step| step.path()).collect();
        paths.sort_unstable();
        paths.dedup();
        assert_eq!(paths.len(), Step::ordered().len());
    }
}
