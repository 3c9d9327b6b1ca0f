/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Config file
pub const DEFAULT_CONFIG_FILE: &str = "sauce-bot.toml";
pub const ENV_PREFIX: &str = "SAUCEBOT_";

// Reddit defaults
pub const DEFAULT_USER_AGENT: &str = concat!("sauce-bot/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_REDDIT_AUTH_URL: &str = "https://www.reddit.com";
pub const DEFAULT_REDDIT_API_URL: &str = "https://oauth.reddit.com";

// SauceNAO defaults
pub const DEFAULT_SAUCENAO_BASE_URL: &str = "https://saucenao.com";
pub const DEFAULT_SAUCENAO_RESULTS: u32 = 8;
pub const DEFAULT_SAUCENAO_TIMEOUT: &str = "30s";

// Cache defaults
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_MEMORY_CAPACITY: usize = 10_000;
pub const DEFAULT_FOUND_TTL: &str = "7d";
pub const DEFAULT_NOT_FOUND_TTL: &str = "3h";

// Bot loop defaults
pub const DEFAULT_POLL_INTERVAL: &str = "15s";
pub const DEFAULT_SUBMISSION_LIMIT: u32 = 100;
pub const DEFAULT_SAVED_STOP_THRESHOLD: usize = 10;
pub const DEFAULT_MULTIREDDIT_SIZE: usize = 200;

// Reply templates
pub const DEFAULT_COMMENT_FOOTER: &str = "---\n\n^(I am a bot. Sources for [this post]({{ submission.permalink }}) are looked up on SauceNAO.)";
pub const DEFAULT_NOT_FOUND: &str = "Sorry, I couldn't find a source for this post. If you know it, please add it in the comments.\n\n---\n\n^(I am a bot.)";
