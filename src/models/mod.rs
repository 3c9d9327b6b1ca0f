pub mod sauce;
pub mod submission;

pub use sauce::{ErrorKind, SauceField, SauceRecord};
pub use submission::{InboxMessage, Submission};
