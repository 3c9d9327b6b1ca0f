//! Jinja reply templates
//!
//! `comment_footer` is rendered with `saucenao` (the record: `image_url` and
//! every set field) and `submission`; `not_found` only sees `submission`.
//! `submission.author` renders as the account name and also exposes
//! `.name`. Lookups of missing values chain to undefined and render as
//! nothing, so `{% if saucenao.creator %}` works for unset fields.
//!
//! Both templates are compiled and test-rendered against a sample post when
//! they are loaded, which surfaces syntax errors and unknown filters at
//! start-up rather than on the first reply.

use minijinja::value::{Object, Value};
use minijinja::{Environment, UndefinedBehavior, context};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::config::TemplateConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{SauceField, SauceRecord, Submission};

const FOOTER: &str = "comment_footer";
const NOT_FOUND: &str = "not_found";

/// Field names older templates used for the Pixiv links
const LEGACY_ALIASES: [(&str, SauceField); 2] = [
    ("pixev_art", SauceField::PixivArt),
    ("pixev_src", SauceField::PixivSrc),
];

/// Post author: prints as the name, `.name` also works
#[derive(Debug)]
struct Author(String);

impl Object for Author {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        match key.as_str()? {
            "name" => Some(Value::from(self.0.clone())),
            _ => None,
        }
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn sauce_value(record: &SauceRecord) -> Value {
    let mut values: BTreeMap<&str, Value> = BTreeMap::new();
    values.insert("image_url", Value::from(record.image_url()));
    for (field, value) in record.fields() {
        if let Some(value) = value {
            values.insert(field.name(), Value::from(value));
        }
    }
    for (alias, field) in LEGACY_ALIASES {
        if let Some(value) = record.get(field) {
            values.insert(alias, Value::from(value));
        }
    }
    Value::from(values)
}

fn submission_value(submission: &Submission) -> Value {
    let mut values: BTreeMap<&str, Value> = BTreeMap::new();
    values.insert("id", Value::from(submission.id.as_str()));
    values.insert("fullname", Value::from(submission.fullname.as_str()));
    values.insert("subreddit", Value::from(submission.subreddit.as_str()));
    values.insert("url", Value::from(submission.url.as_str()));
    values.insert("permalink", Value::from(submission.permalink.as_str()));
    values.insert("title", Value::from(submission.title.as_str()));
    if let Some(author) = &submission.author {
        values.insert("author", Value::from_object(Author(author.clone())));
    }
    Value::from(values)
}

/// The two templates the bot replies with
#[derive(Clone)]
pub struct CommentTemplates {
    env: Environment<'static>,
}

impl fmt::Debug for CommentTemplates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommentTemplates")
            .field("templates", &[FOOTER, NOT_FOUND])
            .finish()
    }
}

impl CommentTemplates {
    /// Compile both templates and check they render
    pub fn new(footer: &str, not_found: &str) -> AppResult<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        for (name, source) in [(FOOTER, footer), (NOT_FOUND, not_found)] {
            env.add_template_owned(name, source.to_string())
                .map_err(|e| AppError::template(format!("templates.{name}: {e}")))?;
        }

        let templates = Self { env };
        templates.check()?;
        Ok(templates)
    }

    pub fn from_config(config: &TemplateConfig) -> AppResult<Self> {
        Self::new(&config.comment_footer, &config.not_found)
    }

    fn check(&self) -> AppResult<()> {
        let submission = Submission {
            id: "abc123".to_string(),
            fullname: "t3_abc123".to_string(),
            subreddit: "pics".to_string(),
            url: "https://i.redd.it/abc123.png".to_string(),
            permalink: "https://www.reddit.com/r/pics/comments/abc123/post/".to_string(),
            author: Some("someone".to_string()),
            title: "A post".to_string(),
            saved: false,
        };
        let mut record = SauceRecord::new(&submission.url);
        for field in SauceField::SCHEMA.into_iter().filter(|field| field.is_content()) {
            record.update_if_absent(field, Some(field.name()));
        }

        self.try_render_footer(&record, &submission)?;
        self.render_not_found(&submission)?;
        Ok(())
    }

    fn render_named(&self, name: &str, ctx: Value) -> AppResult<String> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map_err(|e| AppError::template(format!("templates.{name}: {e}")))
    }

    fn try_render_footer(&self, record: &SauceRecord, submission: &Submission) -> AppResult<String> {
        self.render_named(
            FOOTER,
            context! {
                saucenao => sauce_value(record),
                sauce => sauce_value(record),
                submission => submission_value(submission),
            },
        )
    }

    /// The whole not-found reply
    pub fn render_not_found(&self, submission: &Submission) -> AppResult<String> {
        self.render_named(
            NOT_FOUND,
            context! {
                submission => submission_value(submission),
            },
        )
    }

    /// Footer text, or nothing if it fails to render
    pub fn render_footer(&self, record: &SauceRecord, submission: &Submission) -> String {
        self.try_render_footer(record, submission).unwrap_or_else(|e| {
            warn!("Dropping reply footer: {}", e);
            String::new()
        })
    }
}
