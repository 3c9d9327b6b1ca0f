use async_trait::async_trait;

use crate::errors::ForumResult;
use crate::models::{InboxMessage, Submission};

/// The forum operations the bot relies on
///
/// Identifiers passed to write operations are fullnames (`t3_abc`, `t1_def`).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ForumClient: Send + Sync {
    /// Name of the logged-in account
    async fn username(&self) -> ForumResult<String>;

    /// Display names of every community the account moderates
    async fn moderated_subreddits(&self) -> ForumResult<Vec<String>>;

    /// Newest posts first from a `+`-joined multireddit
    async fn new_submissions(&self, multireddit: &str, limit: u32) -> ForumResult<Vec<Submission>>;

    /// Reply to a post; returns the new comment's fullname
    async fn reply(&self, parent: &str, text: &str) -> ForumResult<String>;

    async fn remove(&self, fullname: &str) -> ForumResult<()>;

    /// Distinguish a comment as a moderator and pin it
    async fn distinguish_sticky(&self, comment: &str) -> ForumResult<()>;

    async fn save(&self, fullname: &str) -> ForumResult<()>;

    async fn message_user(&self, username: &str, subject: &str, body: &str) -> ForumResult<()>;

    async fn unread_messages(&self) -> ForumResult<Vec<InboxMessage>>;

    async fn accept_mod_invite(&self, subreddit: &str) -> ForumResult<()>;

    async fn mark_read(&self, fullname: &str) -> ForumResult<()>;
}
