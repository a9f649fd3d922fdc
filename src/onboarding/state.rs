//! Onboarding state machine — step ordering and reachability.
//!
//! The two per-path order tables below are the single source of truth for
//! step sequencing; everything else (entry resolution, deep-link guards,
//! advance/retreat) derives from them.

use serde::{Deserialize, Serialize};

use crate::users::{CareerPath, User};

use super::model::OnboardingProgress;

/// A named stage in the onboarding sequence.
///
/// Both career paths walk CareerPath → Survey → Recommendations → Profile →
/// Tour → Completed; they differ in the gate required to leave
/// Recommendations (`viewed_recommendations` for short-course,
/// `accepted_curriculum` for degree-program).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    CareerPath,
    Survey,
    Recommendations,
    Profile,
    Tour,
    Completed,
}

impl Default for Step {
    fn default() -> Self {
        Self::CareerPath
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CareerPath => "career_path",
            Self::Survey => "survey",
            Self::Recommendations => "recommendations",
            Self::Profile => "profile",
            Self::Tour => "tour",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "career_path" => Ok(Self::CareerPath),
            "survey" => Ok(Self::Survey),
            "recommendations" => Ok(Self::Recommendations),
            "profile" => Ok(Self::Profile),
            "tour" => Ok(Self::Tour),
            "completed" => Ok(Self::Completed),
            other => Err(format!("Unknown onboarding step: {other}")),
        }
    }
}

const SHORT_COURSE_ORDER: [Step; 6] = [
    Step::CareerPath,
    Step::Survey,
    Step::Recommendations,
    Step::Profile,
    Step::Tour,
    Step::Completed,
];

const DEGREE_PROGRAM_ORDER: [Step; 6] = [
    Step::CareerPath,
    Step::Survey,
    Step::Recommendations,
    Step::Profile,
    Step::Tour,
    Step::Completed,
];

/// The ordered step table for a career path.
pub fn step_order(path: CareerPath) -> &'static [Step] {
    match path {
        CareerPath::ShortCourse => &SHORT_COURSE_ORDER,
        CareerPath::DegreeProgram => &DEGREE_PROGRAM_ORDER,
    }
}

/// The step after `step` in `path`'s order, if any.
pub fn next_step(path: CareerPath, step: Step) -> Option<Step> {
    let order = step_order(path);
    let idx = order.iter().position(|s| *s == step)?;
    order.get(idx + 1).copied()
}

/// The step before `step` in `path`'s order, if any.
pub fn previous_step(path: CareerPath, step: Step) -> Option<Step> {
    let order = step_order(path);
    let idx = order.iter().position(|s| *s == step)?;
    idx.checked_sub(1).map(|i| order[i])
}

/// Whether `step`'s required data is populated on the progress record —
/// i.e. the step has effectively been completed.
pub fn step_data_present(step: Step, path: CareerPath, progress: &OnboardingProgress) -> bool {
    match step {
        Step::CareerPath => progress.responses.career_path.is_some(),
        Step::Survey => progress.responses.survey.is_some(),
        Step::Recommendations => match path {
            CareerPath::ShortCourse => progress.viewed_recommendations == Some(true),
            CareerPath::DegreeProgram => progress.accepted_curriculum == Some(true),
        },
        Step::Profile => progress.responses.profile.is_some(),
        Step::Tour => progress.responses.tour.is_some(),
        Step::Completed => progress.completed,
    }
}

/// Whether the user may enter `step`: true iff every step strictly before
/// it in the path's order has its required data populated. Guards against
/// deep-linking to a later step.
pub fn can_enter(step: Step, path: CareerPath, progress: &OnboardingProgress) -> bool {
    let order = step_order(path);
    let Some(idx) = order.iter().position(|s| *s == step) else {
        return false;
    };
    order[..idx]
        .iter()
        .all(|prior| step_data_present(*prior, path, progress))
}

/// Resolve where a user should land in the flow.
///
/// Completed users resolve to [`Step::Completed`] (the caller redirects to
/// the dashboard). Users without a chosen career path or progress record
/// start at [`Step::CareerPath`]. Otherwise a forward scan returns the
/// first step whose prerequisite data is missing.
pub fn resolve_entry_step(user: &User, progress: Option<&OnboardingProgress>) -> Step {
    if user.has_completed_onboarding {
        return Step::Completed;
    }
    let Some(path) = user.career_path else {
        return Step::CareerPath;
    };
    let Some(progress) = progress else {
        return Step::CareerPath;
    };
    for step in step_order(path) {
        if !step_data_present(*step, path, progress) {
            return *step;
        }
    }
    Step::Completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::model::{
        CareerPathResponse, ProfileResponse, SurveyResponse, TourResponse,
    };
    use crate::users::CareerPath;

    fn empty_progress() -> OnboardingProgress {
        OnboardingProgress::new(uuid::Uuid::new_v4())
    }

    /// Progress with data populated through `upto` (exclusive) for a path.
    fn progress_through(path: CareerPath, upto: Step) -> OnboardingProgress {
        let mut p = empty_progress();
        for step in step_order(path) {
            if *step == upto {
                break;
            }
            match step {
                Step::CareerPath => {
                    p.responses.career_path = Some(CareerPathResponse { career_path: path });
                }
                Step::Survey => {
                    p.responses.survey = Some(SurveyResponse::sample());
                }
                Step::Recommendations => match path {
                    CareerPath::ShortCourse => p.viewed_recommendations = Some(true),
                    CareerPath::DegreeProgram => p.accepted_curriculum = Some(true),
                },
                Step::Profile => {
                    p.responses.profile = Some(ProfileResponse {
                        display_name: "Alice".to_string(),
                        bio: None,
                        portfolio_url: None,
                    });
                }
                Step::Tour => {
                    p.responses.tour = Some(TourResponse {
                        tour_acknowledged: true,
                    });
                }
                Step::Completed => p.completed = true,
            }
            p.current_step = upto;
        }
        p
    }

    #[test]
    fn order_tables_start_and_end_the_same() {
        for path in [CareerPath::ShortCourse, CareerPath::DegreeProgram] {
            let order = step_order(path);
            assert_eq!(order.first(), Some(&Step::CareerPath));
            assert_eq!(order.last(), Some(&Step::Completed));
            assert_eq!(order.len(), 6);
        }
    }

    #[test]
    fn next_walks_all_steps() {
        for path in [CareerPath::ShortCourse, CareerPath::DegreeProgram] {
            let mut current = Step::CareerPath;
            let expected = [
                Step::Survey,
                Step::Recommendations,
                Step::Profile,
                Step::Tour,
                Step::Completed,
            ];
            for want in expected {
                let next = next_step(path, current).unwrap();
                assert_eq!(next, want);
                current = next;
            }
            assert!(next_step(path, current).is_none());
        }
    }

    #[test]
    fn previous_is_inverse_of_next() {
        for path in [CareerPath::ShortCourse, CareerPath::DegreeProgram] {
            for step in step_order(path) {
                if let Some(next) = next_step(path, *step) {
                    assert_eq!(previous_step(path, next), Some(*step));
                }
            }
            assert!(previous_step(path, Step::CareerPath).is_none());
        }
    }

    #[test]
    fn can_enter_requires_all_prior_data() {
        for path in [CareerPath::ShortCourse, CareerPath::DegreeProgram] {
            let order = step_order(path);
            for (i, target) in order.iter().enumerate() {
                let p = progress_through(path, *target);
                assert!(
                    can_enter(*target, path, &p),
                    "{path}: should enter {target} with all prior data"
                );
                // Any later step must be blocked
                for later in &order[i + 1..] {
                    assert!(
                        !can_enter(*later, path, &p),
                        "{path}: must not deep-link to {later} from {target}"
                    );
                }
            }
        }
    }

    #[test]
    fn can_enter_first_step_on_empty_progress() {
        let p = empty_progress();
        for path in [CareerPath::ShortCourse, CareerPath::DegreeProgram] {
            assert!(can_enter(Step::CareerPath, path, &p));
            assert!(!can_enter(Step::Survey, path, &p));
            assert!(!can_enter(Step::Completed, path, &p));
        }
    }

    #[test]
    fn recommendations_gate_differs_by_path() {
        // Short-course gates on viewed_recommendations
        let mut p = progress_through(CareerPath::ShortCourse, Step::Recommendations);
        assert!(!can_enter(Step::Profile, CareerPath::ShortCourse, &p));
        p.viewed_recommendations = Some(true);
        assert!(can_enter(Step::Profile, CareerPath::ShortCourse, &p));

        // Degree-program gates on accepted_curriculum; viewing alone is
        // not enough.
        let mut p = progress_through(CareerPath::DegreeProgram, Step::Recommendations);
        p.viewed_recommendations = Some(true);
        assert!(!can_enter(Step::Profile, CareerPath::DegreeProgram, &p));
        p.accepted_curriculum = Some(true);
        assert!(can_enter(Step::Profile, CareerPath::DegreeProgram, &p));
    }

    #[test]
    fn entry_step_for_fresh_user() {
        let user = User::new("a@b.com", "hash", "Alice");
        assert_eq!(resolve_entry_step(&user, None), Step::CareerPath);
    }

    #[test]
    fn entry_step_for_completed_user_is_terminal() {
        let mut user = User::new("a@b.com", "hash", "Alice");
        user.has_completed_onboarding = true;
        // Even with a stale progress record, completion wins.
        let p = empty_progress();
        assert_eq!(resolve_entry_step(&user, Some(&p)), Step::Completed);
    }

    #[test]
    fn entry_step_scans_forward_to_first_gap() {
        let mut user = User::new("a@b.com", "hash", "Alice");
        user.career_path = Some(CareerPath::ShortCourse);
        for target in step_order(CareerPath::ShortCourse) {
            let p = progress_through(CareerPath::ShortCourse, *target);
            assert_eq!(resolve_entry_step(&user, Some(&p)), *target);
        }
    }

    #[test]
    fn entry_step_without_career_path_ignores_progress() {
        let user = User::new("a@b.com", "hash", "Alice");
        let p = progress_through(CareerPath::ShortCourse, Step::Profile);
        assert_eq!(resolve_entry_step(&user, Some(&p)), Step::CareerPath);
    }

    #[test]
    fn display_matches_serde() {
        let steps = [
            Step::CareerPath,
            Step::Survey,
            Step::Recommendations,
            Step::Profile,
            Step::Tour,
            Step::Completed,
        ];
        for step in steps {
            let display = format!("{step}");
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(format!("\"{display}\""), json);
            let parsed: Step = display.parse().unwrap();
            assert_eq!(parsed, step);
        }
    }
}
