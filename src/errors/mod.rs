//! Centralized error handling for the sauce bot
//!
//! # Error Categories
//!
//! - **Cache Errors**: Redis or in-memory store failures
//! - **Codec Errors**: corrupt or incompatible cached payloads
//! - **Resolve Errors**: what the resolution pipeline reports upward
//! - **Forum Errors**: Reddit API failures
//!
//! # Usage
//!
//! ```rust
//! use sauce_bot::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Err(AppError::configuration("missing saucenao.api_key"))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for cache store Results
pub type CacheResult<T> = Result<T, CacheError>;

/// Convenience type alias for codec Results
pub type CodecResult<T> = Result<T, CodecError>;

/// Convenience type alias for forum client Results
pub type ForumResult<T> = Result<T, ForumError>;
