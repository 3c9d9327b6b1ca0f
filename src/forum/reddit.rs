//! Reddit OAuth API client for a script application
//!
//! Authenticates with the password grant. The bearer token is fetched on
//! first use and refreshed shortly before it expires, or after the API
//! rejects it.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::models::{Account, ApiEnvelope, LinkData, Listing, MessageData, SubredditData, TokenResponse};
use super::traits::ForumClient;
use crate::config::RedditConfig;
use crate::errors::{AppResult, ForumError, ForumResult};
use crate::models::{InboxMessage, Submission};

/// Refresh this long before the reported expiry
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);
/// Used when the token response carries no `expires_in`
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);
/// Largest page the listing endpoints accept
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }
}

pub struct RedditClient {
    client: Client,
    config: RedditConfig,
    token: Mutex<Option<AccessToken>>,
}

impl RedditClient {
    pub fn new(config: RedditConfig) -> AppResult<Self> {
        let client = Client::builder().user_agent(config.user_agent.clone()).build()?;
        Ok(Self {
            client,
            config,
            token: Mutex::new(None),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    fn web_url(&self) -> &str {
        &self.config.auth_url
    }

    async fn access_token(&self) -> ForumResult<String> {
        let mut token = self.token.lock().await;
        if let Some(current) = token.as_ref().filter(|t| t.is_fresh()) {
            return Ok(current.value.clone());
        }

        let fresh = self.fetch_token().await?;
        let value = fresh.value.clone();
        *token = Some(fresh);
        Ok(value)
    }

    async fn fetch_token(&self) -> ForumResult<AccessToken> {
        debug!("Requesting Reddit access token for u/{}", self.config.username);
        let url = format!(
            "{}/api/v1/access_token",
            self.config.auth_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ForumError::auth_failed(format!(
                "token endpoint answered {}",
                status.as_u16()
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ForumError::auth_failed(format!("unreadable token response: {e}")))?;
        match (parsed.access_token, parsed.error) {
            (Some(value), None) => {
                let lifetime = parsed
                    .expires_in
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_TOKEN_LIFETIME);
                Ok(AccessToken {
                    value,
                    expires_at: Instant::now() + lifetime,
                })
            }
            (_, Some(error)) => Err(ForumError::auth_failed(error)),
            (None, None) => Err(ForumError::auth_failed("token response without access_token")),
        }
    }

    async fn request(&self, method: Method, path: &str) -> ForumResult<RequestBuilder> {
        let token = self.access_token().await?;
        Ok(self
            .client
            .request(method, self.api_url(path))
            .bearer_auth(token))
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> ForumResult<T> {
        let status = response.status();
        let body = response.text().await?;
        if status == StatusCode::UNAUTHORIZED {
            self.token.lock().await.take();
            return Err(ForumError::auth_failed("access token rejected"));
        }
        if !status.is_success() {
            return Err(ForumError::Http {
                status: status.as_u16(),
                message: body,
            });
        }
        serde_json::from_str(&body).map_err(|e| ForumError::Api {
            message: format!("unexpected response: {e}"),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> ForumResult<T> {
        let response = self
            .request(Method::GET, path)
            .await?
            .query(&[("raw_json", "1")])
            .query(query)
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, form: &[(&str, &str)]) -> ForumResult<T> {
        let response = self.request(Method::POST, path).await?.form(form).send().await?;
        self.handle_response(response).await
    }

    /// POST with `api_type=json` and fail on reported errors
    async fn post_api(&self, path: &str, form: &[(&str, &str)]) -> ForumResult<ApiEnvelope> {
        let mut fields = vec![("api_type", "json")];
        fields.extend_from_slice(form);
        let envelope: ApiEnvelope = self.post(path, &fields).await?;
        match envelope.json.error_message() {
            Some(message) => Err(ForumError::Api { message }),
            None => Ok(envelope),
        }
    }
}

#[async_trait]
impl ForumClient for RedditClient {
    async fn username(&self) -> ForumResult<String> {
        let account: Account = self.get("/api/v1/me", &[]).await?;
        Ok(account.name)
    }

    async fn moderated_subreddits(&self) -> ForumResult<Vec<String>> {
        let limit = MAX_PAGE_SIZE.to_string();
        let mut names = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut query = vec![("limit", limit.as_str())];
            if let Some(cursor) = after.as_deref() {
                query.push(("after", cursor));
            }
            let listing: Listing<SubredditData> = self.get("/subreddits/mine/moderator", &query).await?;
            let next = listing.data.after.clone();
            names.extend(listing.into_items().map(|subreddit| subreddit.display_name));

            match next {
                Some(cursor) => after = Some(cursor),
                None => break,
            }
        }

        Ok(names)
    }

    async fn new_submissions(&self, multireddit: &str, limit: u32) -> ForumResult<Vec<Submission>> {
        let limit = limit.min(MAX_PAGE_SIZE).to_string();
        let listing: Listing<LinkData> = self
            .get(&format!("/r/{multireddit}/new"), &[("limit", limit.as_str())])
            .await?;
        let web_url = self.web_url();
        Ok(listing
            .into_items()
            .map(|link| link.into_submission(web_url))
            .collect())
    }

    async fn reply(&self, parent: &str, text: &str) -> ForumResult<String> {
        let envelope = self
            .post_api("/api/comment", &[("thing_id", parent), ("text", text)])
            .await?;
        envelope
            .json
            .data
            .and_then(|data| data.things.into_iter().next())
            .map(|thing| thing.data.name)
            .ok_or_else(|| ForumError::Api {
                message: format!("reply to {parent} returned no comment"),
            })
    }

    async fn remove(&self, fullname: &str) -> ForumResult<()> {
        let _: serde_json::Value = self
            .post("/api/remove", &[("id", fullname), ("spam", "false")])
            .await?;
        Ok(())
    }

    async fn distinguish_sticky(&self, comment: &str) -> ForumResult<()> {
        self.post_api(
            "/api/distinguish",
            &[("id", comment), ("how", "yes"), ("sticky", "true")],
        )
        .await?;
        Ok(())
    }

    async fn save(&self, fullname: &str) -> ForumResult<()> {
        let _: serde_json::Value = self.post("/api/save", &[("id", fullname)]).await?;
        Ok(())
    }

    async fn message_user(&self, username: &str, subject: &str, body: &str) -> ForumResult<()> {
        self.post_api(
            "/api/compose",
            &[("to", username), ("subject", subject), ("text", body)],
        )
        .await?;
        Ok(())
    }

    async fn unread_messages(&self) -> ForumResult<Vec<InboxMessage>> {
        let limit = MAX_PAGE_SIZE.to_string();
        let listing: Listing<MessageData> = self
            .get("/message/unread", &[("limit", limit.as_str())])
            .await?;
        Ok(listing.into_items().map(InboxMessage::from).collect())
    }

    async fn accept_mod_invite(&self, subreddit: &str) -> ForumResult<()> {
        self.post_api(&format!("/r/{subreddit}/api/accept_moderator_invite"), &[])
            .await?;
        info!("Accepted moderator invite for r/{}", subreddit);
        Ok(())
    }

    async fn mark_read(&self, fullname: &str) -> ForumResult<()> {
        let _: serde_json::Value = self.post("/api/read_message", &[("id", fullname)]).await?;
        Ok(())
    }
}

impl std::fmt::Debug for RedditClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditClient")
            .field("username", &self.config.username)
            .field("api_url", &self.config.api_url)
            .finish_non_exhaustive()
    }
}
