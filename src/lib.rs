//! VFX Academy — onboarding and recommendation core.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod onboarding;
pub mod ratelimit;
pub mod recommend;
pub mod store;
pub mod users;
