//! Course catalog and enrollments.

pub mod model;
pub mod routes;

pub use model::{Course, CourseLevel, Enrollment, EnrollmentStatus};
