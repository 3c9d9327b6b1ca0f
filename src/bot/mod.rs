//! Moderation bot: watches moderated communities and replies with sources

pub mod image_url;
pub mod runner;

pub use image_url::extract_image_url;
pub use runner::{SauceBot, SubmissionOutcome, build_multireddits};
