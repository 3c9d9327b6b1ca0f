//! SauceNAO provider adapter

pub mod classify;
pub mod client;
pub mod models;

pub use classify::{SiteCategory, board_field};
pub use client::SauceNaoClient;
pub use models::SearchResponse;
