use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

// Use the library instead of redeclaring modules
use sauce_bot::{
    bot::{SauceBot, extract_image_url},
    cache,
    config::{Config, defaults::DEFAULT_CONFIG_FILE},
    forum::RedditClient,
    services::{CommentTemplates, MetricsRecorder, SauceResolver, render},
    sources::{ProviderPool, key_fingerprint},
};

#[derive(Parser)]
#[command(name = "sauce-bot")]
#[command(version)]
#[command(about = "Replies to image posts in moderated subreddits with their source")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// Log level
    #[arg(short = 'v', long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Poll moderated subreddits and reply with sources (default)
    Run,
    /// Resolve one image URL and print the reply that would be posted
    Lookup {
        /// Image or imgur page URL
        image_url: String,
    },
}

fn init_logging(cli: &Cli) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("sauce_bot={}", cli.log_level).into());
    let format = match cli.log_format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
    };
    tracing_subscriber::registry().with(filter).with(format).init();
}

async fn build_resolver(config: &Config) -> Result<SauceResolver> {
    let pool = Arc::new(ProviderPool::saucenao(config.saucenao.clone()));
    let mut resolver = SauceResolver::new(pool, config.saucenao.api_key.clone());

    let stores = cache::build_stores(&config.cache, &config.metrics).await?;
    if let Some(store) = stores.cache {
        resolver = resolver.with_cache(store, config.cache.found_ttl, config.cache.not_found_ttl);
    }
    if let Some(store) = stores.metrics {
        info!("Recording resolution metrics in {} store", store.name());
        resolver = resolver.with_metrics(MetricsRecorder::new(store));
    }

    info!(
        "Using SauceNAO key {}",
        key_fingerprint(&config.saucenao.api_key)
    );
    Ok(resolver)
}

async fn run(config: Config) -> Result<()> {
    config.validate_bot()?;
    let templates = CommentTemplates::from_config(&config.templates)?;
    let resolver = build_resolver(&config).await?;
    let forum = Arc::new(RedditClient::new(config.reddit.clone())?);

    let bot = SauceBot::new(forum, resolver, templates, config.bot.clone());
    bot.run(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await?;
    Ok(())
}

async fn lookup(config: Config, link: &str) -> Result<()> {
    config.validate_lookup()?;
    let templates = CommentTemplates::from_config(&config.templates)?;
    let resolver = build_resolver(&config).await?;

    let image_url = extract_image_url(link)
        .with_context(|| format!("{link} is not a supported image link"))?;
    let resolution = resolver.resolve(&image_url, None).await?;
    info!(
        "Resolved {} (from cache: {})",
        image_url, resolution.from_cache
    );

    let submission = sauce_bot::models::Submission {
        id: String::new(),
        fullname: String::new(),
        subreddit: String::new(),
        url: link.to_string(),
        permalink: link.to_string(),
        author: None,
        title: String::new(),
        saved: false,
    };
    match render(&resolution.record, &templates, &submission) {
        Some(comment) => println!("{comment}"),
        None => println!("{}", templates.render_not_found(&submission)?),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    info!("Starting sauce-bot v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load(&cli.config)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(config).await,
        Command::Lookup { image_url } => lookup(config, &image_url).await,
    }
}
