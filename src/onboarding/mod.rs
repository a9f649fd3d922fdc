//! Onboarding flow — state machine, validation, and REST surface.

pub mod manager;
pub mod model;
pub mod routes;
pub mod state;
pub mod validate;

pub use manager::OnboardingManager;
pub use model::OnboardingProgress;
pub use state::Step;
