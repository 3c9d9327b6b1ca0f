//! Error type definitions for the sauce bot
//!
//! Errors are grouped by the layer that produces them. The resolution
//! pipeline only ever surfaces `ResolveError`; provider failures are folded
//! into an `ErrorKind` on the record before they reach it.

use thiserror::Error;

use crate::models::ErrorKind;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Cache store errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Cache payload decoding errors
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Resolution pipeline errors
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Forum platform errors
    #[error("Forum error: {0}")]
    Forum(#[from] ForumError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Template parsing errors
    #[error("Template error: {message}")]
    Template { message: String },

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Key/value cache store errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Store could not be reached or rejected the command
    #[error("Cache backend unavailable: {message}")]
    Unavailable { message: String },

    /// Redis protocol or connection errors
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Cache payload encoding and decoding errors
///
/// A payload that fails to decode is never turned into a partial record.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The zlib stream was corrupt or truncated, or could not be written
    #[error("Cache payload zlib error: {0}")]
    Decompress(#[from] std::io::Error),

    /// The payload was not a JSON array of nullable strings
    #[error("Cache payload JSON error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The payload carries more fields than the current schema knows
    #[error("Cache payload has {found} fields, schema has {expected}")]
    SchemaMismatch { found: usize, expected: usize },

    /// A stored error kind tag is not one this build understands
    #[error("Unknown error kind in cache payload: {value}")]
    UnknownErrorKind { value: String },
}

/// Errors surfaced by the resolution orchestrator
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The cached entry for this image was corrupt and has been evicted
    #[error("Corrupt cache entry for {image_url}: {source}")]
    Decode {
        image_url: String,
        #[source]
        source: CodecError,
    },

    /// The provider failed for a reason other than "no match"
    #[error("Provider failed for {image_url}: {kind}")]
    Provider { image_url: String, kind: ErrorKind },
}

/// Forum platform errors
#[derive(Error, Debug)]
pub enum ForumError {
    /// Network or HTTP failures talking to the platform
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Login or token refresh failures
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The platform answered with an error status
    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    /// The platform reported errors in an `api_type=json` envelope
    #[error("API error: {message}")]
    Api { message: String },
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a template error
    pub fn template<S: Into<String>>(message: S) -> Self {
        Self::Template {
            message: message.into(),
        }
    }
}

impl CacheError {
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

impl ResolveError {
    /// Stable tag for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "decode_error",
            Self::Provider { kind, .. } => kind.as_str(),
        }
    }
}

impl ForumError {
    pub fn auth_failed<S: Into<String>>(message: S) -> Self {
        Self::AuthenticationFailed {
            message: message.into(),
        }
    }
}
