//! Pure payload validation for each onboarding step.
//!
//! No I/O: given a step, the user's career path, and a raw JSON payload,
//! either produce the typed payload or a list of field errors. This is the
//! only place the step schemas live.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::catalog::CourseLevel;
use crate::error::FieldError;
use crate::users::CareerPath;

use super::model::{
    CareerPathResponse, ProfileResponse, RecommendationsResponse, StepPayload, SurveyResponse,
    TourResponse,
};
use super::state::Step;

/// Inclusive bounds on stated weekly availability.
pub const MIN_WEEKLY_HOURS: u32 = 1;
pub const MAX_WEEKLY_HOURS: u32 = 40;

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("static regex"))
}

/// Whether a string looks like a well-formed http(s) URL.
fn is_valid_url(s: &str) -> bool {
    url_regex().is_match(s)
}

/// Validate a raw payload against the schema for `step`.
///
/// Collects every field error rather than stopping at the first.
pub fn validate_step(
    step: Step,
    path: CareerPath,
    payload: &Value,
) -> Result<StepPayload, Vec<FieldError>> {
    match step {
        Step::CareerPath => validate_career_path(payload),
        Step::Survey => validate_survey(path, payload),
        Step::Recommendations => validate_recommendations(path, payload),
        Step::Profile => validate_profile(payload),
        Step::Tour => validate_tour(payload),
        Step::Completed => Err(vec![FieldError::new(
            "step",
            "The completed step accepts no payload",
        )]),
    }
}

fn validate_career_path(payload: &Value) -> Result<StepPayload, Vec<FieldError>> {
    match payload.get("career_path").and_then(Value::as_str) {
        Some(s) => match s.parse() {
            Ok(career_path) => Ok(StepPayload::CareerPath(CareerPathResponse { career_path })),
            Err(_) => Err(vec![FieldError::new(
                "career_path",
                "Must be short_course or degree_program",
            )]),
        },
        None => Err(vec![FieldError::new("career_path", "Required")]),
    }
}

fn validate_survey(path: CareerPath, payload: &Value) -> Result<StepPayload, Vec<FieldError>> {
    let mut errors = Vec::new();

    let experience_level = match payload.get("experience_level").and_then(Value::as_str) {
        Some(s) => match s.parse::<CourseLevel>() {
            Ok(level) => Some(level),
            Err(_) => {
                errors.push(FieldError::new(
                    "experience_level",
                    "Must be beginner, intermediate, or advanced",
                ));
                None
            }
        },
        None => {
            errors.push(FieldError::new("experience_level", "Required"));
            None
        }
    };

    let interests = non_empty_string_list(payload, "interests", &mut errors);

    let weekly_hours = match payload.get("weekly_hours").and_then(Value::as_u64) {
        Some(h) if (u64::from(MIN_WEEKLY_HOURS)..=u64::from(MAX_WEEKLY_HOURS)).contains(&h) => {
            Some(h as u32)
        }
        Some(_) => {
            errors.push(FieldError::new(
                "weekly_hours",
                format!("Must be between {MIN_WEEKLY_HOURS} and {MAX_WEEKLY_HOURS}"),
            ));
            None
        }
        None => {
            errors.push(FieldError::new(
                "weekly_hours",
                "Required, must be a whole number",
            ));
            None
        }
    };

    let goals = non_empty_string_list(payload, "goals", &mut errors);

    // Degree-program variant carries extra required fields.
    let (specialization, career_goals) = if path == CareerPath::DegreeProgram {
        let specialization = match payload.get("specialization").and_then(Value::as_str) {
            Some(s) if !s.trim().is_empty() => Some(s.to_string()),
            _ => {
                errors.push(FieldError::new("specialization", "Required"));
                None
            }
        };
        let career_goals = non_empty_string_list(payload, "career_goals", &mut errors);
        (specialization, career_goals)
    } else {
        (None, None)
    };

    let portfolio_url = optional_url(payload, "portfolio_url", &mut errors);

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(StepPayload::Survey(SurveyResponse {
        experience_level: experience_level.expect("validated"),
        interests: interests.expect("validated"),
        weekly_hours: weekly_hours.expect("validated"),
        goals: goals.expect("validated"),
        specialization,
        career_goals,
        portfolio_url,
    }))
}

fn validate_recommendations(
    path: CareerPath,
    payload: &Value,
) -> Result<StepPayload, Vec<FieldError>> {
    let mut errors = Vec::new();
    let mut response = RecommendationsResponse::default();

    match path {
        CareerPath::ShortCourse => {
            if payload.get("viewed_recommendations").and_then(Value::as_bool) == Some(true) {
                response.viewed_recommendations = Some(true);
            } else {
                errors.push(FieldError::new(
                    "viewed_recommendations",
                    "Must be true to continue",
                ));
            }
            if let Some(raw) = payload.get("selected_course") {
                match raw.as_str().and_then(|s| s.parse().ok()) {
                    Some(id) => response.selected_course = Some(id),
                    None => {
                        errors.push(FieldError::new("selected_course", "Must be a course id"));
                    }
                }
            }
        }
        CareerPath::DegreeProgram => {
            if payload.get("accepted_curriculum").and_then(Value::as_bool) == Some(true) {
                response.accepted_curriculum = Some(true);
            } else {
                errors.push(FieldError::new(
                    "accepted_curriculum",
                    "The curriculum must be accepted to continue",
                ));
            }
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(StepPayload::Recommendations(response))
}

fn validate_profile(payload: &Value) -> Result<StepPayload, Vec<FieldError>> {
    let mut errors = Vec::new();

    let display_name = match payload.get("display_name").and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => {
            errors.push(FieldError::new("display_name", "Required"));
            None
        }
    };

    let bio = payload
        .get("bio")
        .and_then(Value::as_str)
        .map(str::to_string);

    let portfolio_url = optional_url(payload, "portfolio_url", &mut errors);

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(StepPayload::Profile(ProfileResponse {
        display_name: display_name.expect("validated"),
        bio,
        portfolio_url,
    }))
}

fn validate_tour(payload: &Value) -> Result<StepPayload, Vec<FieldError>> {
    if payload.get("tour_acknowledged").and_then(Value::as_bool) == Some(true) {
        Ok(StepPayload::Tour(TourResponse {
            tour_acknowledged: true,
        }))
    } else {
        Err(vec![FieldError::new(
            "tour_acknowledged",
            "Must be true to finish onboarding",
        )])
    }
}

/// Extract a required non-empty list of non-empty strings.
fn non_empty_string_list(
    payload: &Value,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<Vec<String>> {
    match payload.get(field).and_then(Value::as_array) {
        Some(items) if !items.is_empty() => {
            let strings: Vec<String> = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if strings.len() == items.len() {
                Some(strings)
            } else {
                errors.push(FieldError::new(field, "Entries must be non-empty strings"));
                None
            }
        }
        Some(_) => {
            errors.push(FieldError::new(field, "Must not be empty"));
            None
        }
        None => {
            errors.push(FieldError::new(field, "Required, must be a list"));
            None
        }
    }
}

/// Extract an optional field that, when present, must be a well-formed URL.
fn optional_url(payload: &Value, field: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    match payload.get(field) {
        None | Some(Value::Null) => None,
        Some(raw) => match raw.as_str() {
            Some(s) if is_valid_url(s) => Some(s.to_string()),
            _ => {
                errors.push(FieldError::new(field, "Must be a valid http(s) URL"));
                None
            }
        },
    }
}
