//! Reddit JSON shapes (`raw_json=1`)

use serde::Deserialize;

use crate::models::{InboxMessage, Submission};

#[derive(Debug, Clone, Deserialize)]
pub struct Listing<T> {
    pub data: ListingData<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingData<T> {
    #[serde(default = "Vec::new")]
    pub children: Vec<Thing<T>>,
    #[serde(default)]
    pub after: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thing<T> {
    #[serde(default)]
    pub kind: String,
    pub data: T,
}

impl<T> Listing<T> {
    pub fn into_items(self) -> impl Iterator<Item = T> {
        self.data.children.into_iter().map(|thing| thing.data)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    /// Seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubredditData {
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkData {
    pub id: String,
    pub name: String,
    pub subreddit: String,
    #[serde(default)]
    pub url: String,
    pub permalink: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub saved: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub subreddit: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

/// `{"json": {"errors": [...], "data": {...}}}` returned with `api_type=json`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope {
    pub json: ApiBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiBody {
    #[serde(default)]
    pub errors: Vec<Vec<serde_json::Value>>,
    #[serde(default)]
    pub data: Option<ApiData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiData {
    #[serde(default)]
    pub things: Vec<Thing<CreatedThing>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedThing {
    pub name: String,
}

impl ApiBody {
    /// Joined error messages, if any were reported
    pub fn error_message(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        let messages: Vec<String> = self
            .errors
            .iter()
            .map(|error| {
                error
                    .iter()
                    .filter_map(|part| part.as_str())
                    .collect::<Vec<_>>()
                    .join(": ")
            })
            .collect();
        Some(messages.join("; "))
    }
}

/// Deleted accounts are reported as `[deleted]`
fn account_name(author: Option<String>) -> Option<String> {
    author.filter(|name| !name.is_empty() && name != "[deleted]")
}

impl LinkData {
    /// `web_url` is prefixed to the relative permalink
    pub fn into_submission(self, web_url: &str) -> Submission {
        Submission {
            permalink: format!("{}{}", web_url.trim_end_matches('/'), self.permalink),
            id: self.id,
            fullname: self.name,
            subreddit: self.subreddit,
            url: self.url,
            author: account_name(self.author),
            title: self.title,
            saved: self.saved,
        }
    }
}

impl From<MessageData> for InboxMessage {
    fn from(data: MessageData) -> Self {
        InboxMessage {
            id: data.id,
            fullname: data.name,
            subject: data.subject,
            subreddit: data.subreddit.filter(|name| !name.is_empty()),
            author: account_name(data.author),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_listing_to_submissions() {
        let json = r#"{
            "kind": "Listing",
            "data": {
                "after": "t3_b",
                "children": [
                    {"kind": "t3", "data": {
                        "id": "a", "name": "t3_a", "subreddit": "art",
                        "url": "https://i.redd.it/a.png",
                        "permalink": "/r/art/comments/a/title/",
                        "author": "poster", "title": "title", "saved": true
                    }},
                    {"kind": "t3", "data": {
                        "id": "b", "name": "t3_b", "subreddit": "pics",
                        "url": "https://imgur.com/b",
                        "permalink": "/r/pics/comments/b/x/",
                        "author": "[deleted]", "title": "x"
                    }}
                ]
            }
        }"#;
        let listing: Listing<LinkData> = serde_json::from_str(json).unwrap();
        assert_eq!(listing.data.after.as_deref(), Some("t3_b"));

        let submissions: Vec<Submission> = listing
            .into_items()
            .map(|link| link.into_submission("https://www.reddit.com/"))
            .collect();
        assert_eq!(submissions.len(), 2);
        assert_eq!(
            submissions[0].permalink,
            "https://www.reddit.com/r/art/comments/a/title/"
        );
        assert!(submissions[0].saved);
        assert_eq!(submissions[0].author.as_deref(), Some("poster"));
        assert_eq!(submissions[1].author, None);
        assert!(!submissions[1].saved);
    }

    #[test]
    fn test_message_conversion() {
        let data: MessageData = serde_json::from_str(
            r#"{"id": "m", "name": "t4_m", "subject": "invitation to moderate /r/art", "subreddit": "art", "author": null}"#,
        )
        .unwrap();
        let message = InboxMessage::from(data);
        assert_eq!(message.fullname, "t4_m");
        assert_eq!(message.mod_invite_subreddit(), Some("art"));
        assert_eq!(message.author, None);
    }

    #[test]
    fn test_api_envelope_errors() {
        let ok: ApiEnvelope = serde_json::from_str(
            r#"{"json": {"errors": [], "data": {"things": [{"kind": "t1", "data": {"name": "t1_c"}}]}}}"#,
        )
        .unwrap();
        assert_eq!(ok.json.error_message(), None);
        assert_eq!(ok.json.data.unwrap().things[0].data.name, "t1_c");

        let failed: ApiEnvelope = serde_json::from_str(
            r#"{"json": {"errors": [["RATELIMIT", "you are doing that too much", "ratelimit"]]}}"#,
        )
        .unwrap();
        assert_eq!(
            failed.json.error_message().as_deref(),
            Some("RATELIMIT: you are doing that too much: ratelimit")
        );
    }
}
