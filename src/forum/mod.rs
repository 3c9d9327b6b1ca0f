//! Forum platform access

pub mod models;
pub mod reddit;
pub mod traits;

pub use reddit::RedditClient;
pub use traits::ForumClient;
