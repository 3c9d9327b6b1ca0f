pub mod bot;
pub mod cache;
pub mod config;
pub mod errors;
pub mod forum;
pub mod models;
pub mod services;
pub mod sources;
pub mod utils;
