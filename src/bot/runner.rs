//! The polling moderation loop

use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::image_url::extract_image_url;
use crate::config::BotConfig;
use crate::errors::{AppResult, ForumResult};
use crate::forum::ForumClient;
use crate::models::Submission;
use crate::services::{CommentTemplates, SauceResolver, render};

const NOT_FOUND_SUBJECT: &str = "Sauce not found!";

/// What happened to one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Link was not an image; not-found reply posted and removed
    NoImage,
    /// Reply posted, distinguished and stickied
    Sourced,
    /// Author messaged; not-found reply posted and removed
    NotFound,
    /// Lookup failed; left unsaved for the next cycle
    Failed(&'static str),
}

/// Split subreddit names into `+`-joined groups of at most `size`
pub fn build_multireddits(names: &[String], size: usize) -> Vec<String> {
    names
        .chunks(size.max(1))
        .map(|chunk| chunk.join("+"))
        .collect()
}

pub struct SauceBot {
    forum: Arc<dyn ForumClient>,
    resolver: SauceResolver,
    templates: CommentTemplates,
    config: BotConfig,
    multireddits: Vec<String>,
}

impl SauceBot {
    pub fn new(
        forum: Arc<dyn ForumClient>,
        resolver: SauceResolver,
        templates: CommentTemplates,
        config: BotConfig,
    ) -> Self {
        Self {
            forum,
            resolver,
            templates,
            config,
            multireddits: Vec::new(),
        }
    }

    pub fn multireddits(&self) -> &[String] {
        &self.multireddits
    }

    /// Reload the moderated subreddits
    pub async fn refresh_multireddits(&mut self) -> ForumResult<()> {
        let names = self.forum.moderated_subreddits().await?;
        info!("Loaded {} subreddits", names.len());
        self.multireddits = build_multireddits(&names, self.config.multireddit_size);
        info!("Split into {} multireddits", self.multireddits.len());
        Ok(())
    }

    /// New, unsaved posts across every multireddit
    ///
    /// Listing a multireddit stops once `saved_stop_threshold` saved posts
    /// have been seen: everything older was handled in earlier cycles.
    pub async fn collect_submissions(&self) -> Vec<Submission> {
        let mut submissions = Vec::new();

        for multireddit in &self.multireddits {
            let listing = match self
                .forum
                .new_submissions(multireddit, self.config.submission_limit)
                .await
            {
                Ok(listing) => listing,
                Err(e) => {
                    warn!("Failed to list submissions from multireddit: {}", e);
                    continue;
                }
            };

            let mut skipped = 0;
            for submission in listing {
                if submission.saved {
                    skipped += 1;
                    if skipped >= self.config.saved_stop_threshold {
                        break;
                    }
                } else {
                    submissions.push(submission);
                }
            }
        }

        submissions
    }

    pub async fn process_submission(&self, submission: &Submission) -> AppResult<SubmissionOutcome> {
        let Some(image_url) = extract_image_url(&submission.url) else {
            info!(
                "Post {} in r/{} didn't have a url to lookup",
                submission.id, submission.subreddit
            );
            self.reply_not_found(submission).await?;
            self.forum.save(&submission.fullname).await?;
            return Ok(SubmissionOutcome::NoImage);
        };

        info!(
            "Processing post {} in r/{} with url {}",
            submission.id, submission.subreddit, image_url
        );
        let resolution = match self.resolver.resolve(&image_url, Some(&submission.subreddit)).await {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!("Lookup for post {} failed, will retry: {}", submission.id, e);
                return Ok(SubmissionOutcome::Failed(e.kind()));
            }
        };

        let outcome = match render(&resolution.record, &self.templates, submission) {
            Some(comment) => {
                info!("Source found, replying with comment");
                let reply = self.forum.reply(&submission.fullname, &comment).await?;
                if let Err(e) = self.forum.distinguish_sticky(&reply).await {
                    warn!("Failed to sticky reply {}: {}", reply, e);
                }
                SubmissionOutcome::Sourced
            }
            None => {
                self.notify_author(submission).await;
                self.reply_not_found(submission).await?;
                SubmissionOutcome::NotFound
            }
        };

        self.forum.save(&submission.fullname).await?;
        Ok(outcome)
    }

    /// Post the not-found reply and remove it from public view.
    ///
    /// Once the reply exists only the post save is allowed to fail, so a
    /// post is never answered twice.
    async fn reply_not_found(&self, submission: &Submission) -> AppResult<()> {
        let text = self.templates.render_not_found(submission)?;
        let reply = self.forum.reply(&submission.fullname, &text).await?;
        if let Err(e) = self.forum.remove(&reply).await {
            warn!("Failed to remove reply {}: {}", reply, e);
        }
        Ok(())
    }

    async fn notify_author(&self, submission: &Submission) {
        let Some(author) = submission.author.as_deref() else {
            debug!("Post {} has no author to message", submission.id);
            return;
        };

        info!("Couldn't find a source, messaging author u/{}", author);
        let body = format!(
            "I couldn't find the source for your [recent submission]({}). \
             Please consider putting it in the comments yourself.",
            submission.permalink
        );
        if let Err(e) = self.forum.message_user(author, NOT_FOUND_SUBJECT, &body).await {
            warn!("Failed to message u/{}: {}", author, e);
        }
    }

    /// Accept moderator invites and track removals
    pub async fn handle_inbox(&mut self) -> ForumResult<()> {
        let mut rebuild = false;

        for message in self.forum.unread_messages().await? {
            if let Some(subreddit) = message.mod_invite_subreddit() {
                info!("Accepting mod invite for r/{}", subreddit);
                match self.forum.accept_mod_invite(subreddit).await {
                    Ok(()) => rebuild = true,
                    Err(e) => warn!("Error accepting mod invite: {}", e),
                }
            } else if message.is_mod_removal() {
                info!(
                    "Removed as mod from r/{}",
                    message.subreddit.as_deref().unwrap_or("unknown")
                );
                rebuild = true;
            } else if let Some(author) = message.author.as_deref() {
                info!(
                    "Got a message from u/{}, but it's not a mod invite. {}",
                    author, message.id
                );
            }
            if let Err(e) = self.forum.mark_read(&message.fullname).await {
                warn!("Failed to mark message {} read: {}", message.id, e);
            }
        }

        if rebuild {
            self.refresh_multireddits().await?;
        }
        Ok(())
    }

    /// One pass over new submissions and the inbox
    pub async fn run_cycle(&mut self) -> AppResult<()> {
        let submissions = self.collect_submissions().await;
        if !submissions.is_empty() {
            debug!("Processing {} submissions", submissions.len());
        }

        for submission in &submissions {
            if let Err(e) = self.process_submission(submission).await {
                error!("Failed to handle post {}: {}", submission.id, e);
            }
        }

        self.handle_inbox().await?;
        Ok(())
    }

    /// Log in, then poll until `shutdown` resolves
    pub async fn run<F>(mut self, shutdown: F) -> AppResult<()>
    where
        F: Future<Output = ()>,
    {
        let username = self.forum.username().await?;
        info!("Logged into reddit as u/{}", username);

        info!("Loading list of moderated subs...");
        self.refresh_multireddits().await?;
        info!("Finished start up, checking submissions and messages");

        tokio::pin!(shutdown);
        loop {
            if let Err(e) = self.run_cycle().await {
                error!("Caught top level error: {}", e);
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping");
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemplateConfig;
    use crate::errors::ForumError;
    use crate::forum::traits::MockForumClient;
    use crate::models::{ErrorKind, InboxMessage, SauceField, SauceRecord};
    use crate::sources::traits::MockSauceProvider;
    use crate::sources::{ProviderOutcome, ProviderPool, SauceProvider};
    use mockall::predicate::eq;
    use std::time::Duration;

    fn submission(id: &str, url: &str, saved: bool) -> Submission {
        Submission {
            id: id.to_string(),
            fullname: format!("t3_{id}"),
            subreddit: "art".to_string(),
            url: url.to_string(),
            permalink: format!("https://www.reddit.com/r/art/comments/{id}/x/"),
            author: Some("poster".to_string()),
            title: "x".to_string(),
            saved,
        }
    }

    fn resolver_returning(record: Option<SauceRecord>) -> SauceResolver {
        let mut provider = MockSauceProvider::new();
        provider.expect_name().return_const("mock");
        match record {
            Some(record) => {
                provider
                    .expect_search()
                    .times(1)
                    .returning(move |_| ProviderOutcome::new(record.clone(), None));
            }
            None => {
                provider.expect_search().times(0);
            }
        }
        let provider: Arc<dyn SauceProvider> = Arc::new(provider);
        SauceResolver::new(
            Arc::new(ProviderPool::new(move |_| Ok(provider.clone()))),
            "key",
        )
    }

    fn bot(forum: MockForumClient, resolver: SauceResolver) -> SauceBot {
        let config = BotConfig {
            saved_stop_threshold: 2,
            multireddit_size: 2,
            poll_interval: Duration::from_millis(10),
            ..BotConfig::default()
        };
        SauceBot::new(
            Arc::new(forum),
            resolver,
            CommentTemplates::from_config(&TemplateConfig::default()).unwrap(),
            config,
        )
    }

    #[test]
    fn test_build_multireddits_chunks() {
        let names: Vec<String> = (0..450).map(|i| format!("sub{i}")).collect();
        let multireddits = build_multireddits(&names, 200);
        assert_eq!(multireddits.len(), 3);
        assert_eq!(multireddits[0].split('+').count(), 200);
        assert_eq!(multireddits[2].split('+').count(), 50);
        assert!(multireddits[0].starts_with("sub0+sub1+"));

        assert!(build_multireddits(&[], 200).is_empty());
        assert_eq!(
            build_multireddits(&["a".to_string(), "b".to_string()], 0),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[tokio::test]
    async fn test_collect_skips_saved_and_stops_at_threshold() {
        let mut forum = MockForumClient::new();
        forum
            .expect_moderated_subreddits()
            .returning(|| Ok(vec!["art".to_string()]));
        forum
            .expect_new_submissions()
            .with(eq("art"), eq(100u32))
            .returning(|_, _| {
                Ok(vec![
                    submission("a", "https://i.redd.it/a.png", false),
                    submission("b", "https://i.redd.it/b.png", true),
                    submission("c", "https://i.redd.it/c.png", false),
                    submission("d", "https://i.redd.it/d.png", true),
                    submission("e", "https://i.redd.it/e.png", false),
                ])
            });

        let mut bot = bot(forum, resolver_returning(None));
        bot.refresh_multireddits().await.unwrap();
        let ids: Vec<String> = bot
            .collect_submissions()
            .await
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_listing_errors_do_not_stop_collection() {
        let mut forum = MockForumClient::new();
        forum
            .expect_moderated_subreddits()
            .returning(|| Ok(vec!["a".into(), "b".into(), "c".into()]));
        forum
            .expect_new_submissions()
            .with(eq("a+b"), eq(100u32))
            .returning(|_, _| Err(ForumError::Http { status: 503, message: "busy".into() }));
        forum
            .expect_new_submissions()
            .with(eq("c"), eq(100u32))
            .returning(|_, _| Ok(vec![submission("z", "https://i.redd.it/z.png", false)]));

        let mut bot = bot(forum, resolver_returning(None));
        bot.refresh_multireddits().await.unwrap();
        assert_eq!(bot.multireddits(), ["a+b".to_string(), "c".to_string()]);
        assert_eq!(bot.collect_submissions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_sourced_post_gets_sticky_reply() {
        let post = submission("a", "https://i.redd.it/a.png", false);
        let mut record = SauceRecord::new("https://i.redd.it/a.png");
        record.update_if_absent(SauceField::Creator, Some("studio x"));

        let mut forum = MockForumClient::new();
        forum
            .expect_reply()
            .withf(|parent, text| parent.to_string() == "t3_a" && text.contains("**Creator:** Studio X | "))
            .times(1)
            .returning(|_, _| Ok("t1_reply".to_string()));
        forum
            .expect_distinguish_sticky()
            .with(eq("t1_reply"))
            .times(1)
            .returning(|_| Ok(()));
        forum.expect_save().with(eq("t3_a")).times(1).returning(|_| Ok(()));
        forum.expect_remove().times(0);
        forum.expect_message_user().times(0);

        let bot = bot(forum, resolver_returning(Some(record)));
        assert_eq!(
            bot.process_submission(&post).await.unwrap(),
            SubmissionOutcome::Sourced
        );
    }

    #[tokio::test]
    async fn test_sticky_failure_still_saves_post() {
        let post = submission("a", "https://i.redd.it/a.png", false);
        let mut record = SauceRecord::new("https://i.redd.it/a.png");
        record.update_if_absent(SauceField::Creator, Some("studio x"));

        let mut forum = MockForumClient::new();
        forum
            .expect_reply()
            .times(1)
            .returning(|_, _| Ok("t1_reply".to_string()));
        forum
            .expect_distinguish_sticky()
            .times(1)
            .returning(|_| Err(ForumError::Http { status: 500, message: "oops".into() }));
        forum.expect_save().with(eq("t3_a")).times(1).returning(|_| Ok(()));

        let bot = bot(forum, resolver_returning(Some(record)));
        assert_eq!(
            bot.process_submission(&post).await.unwrap(),
            SubmissionOutcome::Sourced
        );
    }

    #[tokio::test]
    async fn test_remove_failure_still_saves_post() {
        let post = submission("a", "https://www.youtube.com/watch?v=x", false);

        let mut forum = MockForumClient::new();
        forum
            .expect_reply()
            .times(1)
            .returning(|_, _| Ok("t1_nf".to_string()));
        forum
            .expect_remove()
            .times(1)
            .returning(|_| Err(ForumError::Http { status: 403, message: "forbidden".into() }));
        forum.expect_save().with(eq("t3_a")).times(1).returning(|_| Ok(()));

        let bot = bot(forum, resolver_returning(None));
        assert_eq!(
            bot.process_submission(&post).await.unwrap(),
            SubmissionOutcome::NoImage
        );
    }

    #[tokio::test]
    async fn test_failed_reply_leaves_post_unsaved() {
        let post = submission("a", "https://www.youtube.com/watch?v=x", false);

        let mut forum = MockForumClient::new();
        forum
            .expect_reply()
            .times(1)
            .returning(|_, _| Err(ForumError::Http { status: 503, message: "busy".into() }));
        forum.expect_save().times(0);

        let bot = bot(forum, resolver_returning(None));
        assert!(bot.process_submission(&post).await.is_err());
    }

    #[tokio::test]
    async fn test_not_found_messages_author_and_removes_reply() {
        let post = submission("a", "https://i.redd.it/a.png", false);

        let mut forum = MockForumClient::new();
        forum
            .expect_message_user()
            .withf(|to, subject, body| {
                to.to_string() == "poster" && subject.to_string() == NOT_FOUND_SUBJECT && body.contains("/comments/a/")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        forum
            .expect_reply()
            .times(1)
            .returning(|_, _| Ok("t1_nf".to_string()));
        forum.expect_remove().with(eq("t1_nf")).times(1).returning(|_| Ok(()));
        forum.expect_save().with(eq("t3_a")).times(1).returning(|_| Ok(()));
        forum.expect_distinguish_sticky().times(0);

        let not_found = SauceRecord::with_error("https://i.redd.it/a.png", ErrorKind::NotFound);
        let bot = bot(forum, resolver_returning(Some(not_found)));
        assert_eq!(
            bot.process_submission(&post).await.unwrap(),
            SubmissionOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_non_image_post_is_not_looked_up() {
        let post = submission("a", "https://www.youtube.com/watch?v=x", false);

        let mut forum = MockForumClient::new();
        forum
            .expect_reply()
            .times(1)
            .returning(|_, _| Ok("t1_nf".to_string()));
        forum.expect_remove().with(eq("t1_nf")).times(1).returning(|_| Ok(()));
        forum.expect_save().times(1).returning(|_| Ok(()));
        forum.expect_message_user().times(0);

        let bot = bot(forum, resolver_returning(None));
        assert_eq!(
            bot.process_submission(&post).await.unwrap(),
            SubmissionOutcome::NoImage
        );
    }

    #[tokio::test]
    async fn test_failed_lookup_leaves_post_unsaved() {
        let post = submission("a", "https://i.redd.it/a.png", false);

        let mut forum = MockForumClient::new();
        forum.expect_reply().times(0);
        forum.expect_save().times(0);

        let failed = SauceRecord::with_error("https://i.redd.it/a.png", ErrorKind::ProviderTransportError);
        let bot = bot(forum, resolver_returning(Some(failed)));
        assert_eq!(
            bot.process_submission(&post).await.unwrap(),
            SubmissionOutcome::Failed("provider_transport_error")
        );
    }

    #[tokio::test]
    async fn test_inbox_invite_is_accepted_and_triggers_rebuild() {
        let mut forum = MockForumClient::new();
        forum.expect_unread_messages().times(1).returning(|| {
            Ok(vec![
                InboxMessage {
                    id: "m1".into(),
                    fullname: "t4_m1".into(),
                    subject: "invitation to moderate /r/newsub".into(),
                    subreddit: Some("newsub".into()),
                    author: None,
                },
                InboxMessage {
                    id: "m2".into(),
                    fullname: "t4_m2".into(),
                    subject: "hello".into(),
                    subreddit: None,
                    author: Some("someone".into()),
                },
            ])
        });
        forum
            .expect_accept_mod_invite()
            .with(eq("newsub"))
            .times(1)
            .returning(|_| Ok(()));
        forum.expect_mark_read().times(2).returning(|_| Ok(()));
        forum
            .expect_moderated_subreddits()
            .times(1)
            .returning(|| Ok(vec!["art".into(), "newsub".into()]));

        let mut bot = bot(forum, resolver_returning(None));
        bot.handle_inbox().await.unwrap();
        assert_eq!(bot.multireddits(), ["art+newsub".to_string()]);
    }

    #[tokio::test]
    async fn test_mark_read_failure_still_rebuilds() {
        let mut forum = MockForumClient::new();
        forum.expect_unread_messages().times(1).returning(|| {
            Ok(vec![InboxMessage {
                id: "m1".into(),
                fullname: "t4_m1".into(),
                subject: "invitation to moderate /r/newsub".into(),
                subreddit: Some("newsub".into()),
                author: None,
            }])
        });
        forum.expect_accept_mod_invite().times(1).returning(|_| Ok(()));
        forum
            .expect_mark_read()
            .times(1)
            .returning(|_| Err(ForumError::Http { status: 500, message: "oops".into() }));
        forum
            .expect_moderated_subreddits()
            .times(1)
            .returning(|| Ok(vec!["newsub".into()]));

        let mut bot = bot(forum, resolver_returning(None));
        bot.handle_inbox().await.unwrap();
        assert_eq!(bot.multireddits(), ["newsub".to_string()]);
    }

    #[tokio::test]
    async fn test_plain_messages_do_not_rebuild() {
        let mut forum = MockForumClient::new();
        forum.expect_unread_messages().returning(|| {
            Ok(vec![InboxMessage {
                id: "m".into(),
                fullname: "t4_m".into(),
                subject: "question".into(),
                subreddit: None,
                author: Some("someone".into()),
            }])
        });
        forum.expect_mark_read().with(eq("t4_m")).times(1).returning(|_| Ok(()));
        forum.expect_moderated_subreddits().times(0);

        let mut bot = bot(forum, resolver_returning(None));
        bot.handle_inbox().await.unwrap();
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let mut forum = MockForumClient::new();
        forum.expect_username().returning(|| Ok("saucebot".into()));
        forum.expect_moderated_subreddits().returning(|| Ok(vec![]));
        forum.expect_unread_messages().returning(|| Ok(vec![]));

        let bot = bot(forum, resolver_returning(None));
        bot.run(async {}).await.unwrap();
    }
}
