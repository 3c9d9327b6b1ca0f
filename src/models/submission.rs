use serde::{Deserialize, Serialize};

/// A forum post the bot may reply to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Short id (`abc123`)
    pub id: String,
    /// Fullname used by write endpoints (`t3_abc123`)
    pub fullname: String,
    pub subreddit: String,
    pub url: String,
    pub permalink: String,
    /// `None` when the account was deleted
    pub author: Option<String>,
    pub title: String,
    /// Saved posts have already been processed
    pub saved: bool,
}

/// An inbox message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxMessage {
    pub id: String,
    pub fullname: String,
    pub subject: String,
    pub subreddit: Option<String>,
    pub author: Option<String>,
}

impl InboxMessage {
    /// Subreddit name of a moderator invitation, if this is one
    pub fn mod_invite_subreddit(&self) -> Option<&str> {
        if self.subject.contains("invitation to moderate /r/") {
            self.subreddit.as_deref()
        } else {
            None
        }
    }

    pub fn is_mod_removal(&self) -> bool {
        self.subject.contains("has been removed as a moderator from")
    }
}
