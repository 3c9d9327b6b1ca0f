//! Reverse-image-search providers

pub mod pool;
pub mod saucenao;
pub mod traits;

pub use pool::{ProviderPool, key_fingerprint};
pub use saucenao::SauceNaoClient;
pub use traits::{ProviderOutcome, RateLimits, SauceProvider};
