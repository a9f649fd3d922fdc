//! Course recommendation scoring.

pub mod scorer;

pub use scorer::{MatchFactor, ScoredCourse, rank, score_course, DEFAULT_LIMIT, DEGREE_LIMIT};
