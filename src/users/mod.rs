//! User identity and role records.

pub mod model;

pub use model::{CareerPath, Role, User};
