use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use super::classify::{SiteCategory, board_field};
use super::models::{ResponseHeader, SearchResponse, SearchResult};
use crate::config::SauceNaoConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{ErrorKind, SauceField, SauceRecord};
use crate::sources::traits::{ProviderOutcome, RateLimits, SauceProvider};
use crate::utils::url::UrlUtils;

/// Search every index
const ALL_INDEXES: &str = "999";
/// JSON output
const OUTPUT_JSON: &str = "2";

/// SauceNAO API client bound to one API key
#[derive(Debug, Clone)]
pub struct SauceNaoClient {
    client: Client,
    search_url: String,
    api_key: String,
    results: u32,
}

impl SauceNaoClient {
    pub fn new(config: &SauceNaoConfig, api_key: &str) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let search_url = UrlUtils::join(&config.base_url, "search.php").map_err(|e| {
            AppError::configuration(format!("invalid saucenao.base_url '{}': {e}", config.base_url))
        })?;

        Ok(Self {
            client,
            search_url,
            api_key: api_key.to_string(),
            results: config.results,
        })
    }

    /// Issue the HTTP request. Any failure is classified, never raised.
    async fn fetch(&self, image_url: &str) -> Result<SearchResponse, (ErrorKind, Option<RateLimits>)> {
        let results = self.results.to_string();
        let response = self
            .client
            .get(&self.search_url)
            .query(&[
                ("output_type", OUTPUT_JSON),
                ("db", ALL_INDEXES),
                ("numres", results.as_str()),
                ("api_key", self.api_key.as_str()),
                ("url", image_url),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!(
                    "SauceNAO request failed for {}: {}",
                    image_url,
                    UrlUtils::obfuscate_credentials(&e.to_string())
                );
                (ErrorKind::ProviderTransportError, None)
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            warn!(
                "Failed to read SauceNAO response for {}: {}",
                image_url,
                UrlUtils::obfuscate_credentials(&e.to_string())
            );
            (ErrorKind::ProviderTransportError, None)
        })?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            let limits = serde_json::from_slice::<SearchResponse>(&body)
                .ok()
                .map(|parsed| rate_limits(&parsed.header));
            warn!("SauceNAO rate limit reached while looking up {}", image_url);
            return Err((ErrorKind::ProviderRateLimited, limits));
        }

        if !status.is_success() {
            warn!(
                "SauceNAO answered {} {} for {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown"),
                image_url
            );
            return Err((ErrorKind::ProviderError, None));
        }

        serde_json::from_slice(&body).map_err(|e| {
            warn!("Unreadable SauceNAO response for {}: {}", image_url, e);
            (ErrorKind::ProviderError, None)
        })
    }

    /// Turn a parsed response into a record
    ///
    /// Matches are read best-ranked first and every field keeps the first
    /// value written to it.
    pub fn normalize(image_url: &str, response: SearchResponse) -> ProviderOutcome {
        let limits = Some(rate_limits(&response.header));
        let header = &response.header;

        if header.status < 0 || (header.status > 0 && response.results.is_empty()) {
            let kind = classify_status(header);
            warn!(
                "SauceNAO status {} for {}: {}",
                header.status,
                image_url,
                header.message.as_deref().unwrap_or("no message")
            );
            return ProviderOutcome::new(SauceRecord::with_error(image_url, kind), limits);
        }
        if header.status > 0 {
            debug!(
                "SauceNAO reported partial index failure (status {}), using returned matches",
                header.status
            );
        }

        let threshold = header.minimum_similarity;
        let matches: Vec<&SearchResult> = response
            .results
            .iter()
            .filter(|result| match (threshold, result.header.similarity) {
                (Some(minimum), Some(similarity)) => similarity >= minimum,
                _ => true,
            })
            .collect();

        if matches.is_empty() {
            debug!(
                "No matches above similarity {:?} for {} ({} low similarity)",
                threshold,
                image_url,
                response.results.len()
            );
            return ProviderOutcome::new(SauceRecord::with_error(image_url, ErrorKind::NotFound), limits);
        }

        let mut record = SauceRecord::new(image_url);
        for result in matches {
            apply_match(&mut record, result);
        }

        if record.is_empty() {
            debug!("Matches for {} carried no usable attribution", image_url);
        }

        ProviderOutcome::new(record, limits)
    }
}

fn rate_limits(header: &ResponseHeader) -> RateLimits {
    RateLimits {
        short_remaining: header.short_remaining,
        short_limit: header.short_limit,
        long_remaining: header.long_remaining,
        long_limit: header.long_limit,
    }
}

fn classify_status(header: &ResponseHeader) -> ErrorKind {
    let message = header.message.as_deref().unwrap_or_default().to_ascii_lowercase();
    if header.status < 0 && (message.contains("rate") || message.contains("limit")) {
        ErrorKind::ProviderRateLimited
    } else {
        ErrorKind::ProviderError
    }
}

fn apply_match(record: &mut SauceRecord, result: &SearchResult) {
    let data = &result.data;

    record.update_if_absent(SauceField::Material, data.material_labels().first());

    match SiteCategory::for_index(result.header.index_id) {
        SiteCategory::ArtistProfile => {
            record.update_if_absent(SauceField::Member, data.member_name.as_deref());
            record.update_if_absent(
                SauceField::PixivArt,
                data.member_id
                    .as_deref()
                    .map(|id| format!("https://www.pixiv.net/users/{id}")),
            );
            record.update_if_absent(
                SauceField::PixivSrc,
                data.url_containing("pixiv.net").or(data.ext_urls.first().map(String::as_str)),
            );
        }
        SiteCategory::Gallery => {
            record.update_if_absent(SauceField::Author, data.author_name.as_deref());
            record.update_if_absent(SauceField::DeviantartArt, data.author_url.as_deref());
            record.update_if_absent(
                SauceField::DeviantartSrc,
                data.url_containing("deviantart.com").or(data.ext_urls.first().map(String::as_str)),
            );
        }
        SiteCategory::Booru => {
            record.update_if_absent(
                SauceField::Creator,
                data.creator.as_ref().and_then(|names| names.first()),
            );
        }
        SiteCategory::Unrecognized => {
            warn!(
                "Unrecognized SauceNAO index {} ({}), skipping its attribution",
                result.header.index_id, result.header.index_name
            );
        }
    }

    for url in data.urls() {
        if let Some(field) = board_field(url) {
            record.update_if_absent(field, Some(url));
        }
    }
}

#[async_trait]
impl SauceProvider for SauceNaoClient {
    fn name(&self) -> &'static str {
        "saucenao"
    }

    async fn search(&self, image_url: &str) -> ProviderOutcome {
        debug!("Querying SauceNAO for {}", image_url);
        match self.fetch(image_url).await {
            Ok(response) => Self::normalize(image_url, response),
            Err((kind, limits)) => ProviderOutcome::new(SauceRecord::with_error(image_url, kind), limits),
        }
    }
}
