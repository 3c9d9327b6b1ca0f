//! URL utilities for consistent URL handling

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Query parameters whose values never reach the logs
static SENSITIVE_PARAMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([?&](?:api_key|apikey|key|token|access_token|username|password|user|pass|pwd|passwd)=)[^&\s]*")
        .expect("static regex is valid")
});

/// URL utilities for consistent URL handling
pub struct UrlUtils;

impl UrlUtils {
    /// Join a base URL with a path segment
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sauce_bot::utils::url::UrlUtils;
    ///
    /// assert_eq!(
    ///     UrlUtils::join("https://saucenao.com/", "search.php").unwrap(),
    ///     "https://saucenao.com/search.php"
    /// );
    /// ```
    pub fn join(base: &str, path: &str) -> Result<String, url::ParseError> {
        let base_url = Url::parse(base)?;
        let joined = base_url.join(path)?;
        Ok(joined.to_string())
    }

    /// Obfuscate sensitive information in URLs (or messages containing them)
    /// for safe logging
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sauce_bot::utils::url::UrlUtils;
    ///
    /// let url = "https://saucenao.com/search.php?api_key=abc123&url=x";
    /// assert_eq!(
    ///     UrlUtils::obfuscate_credentials(url),
    ///     "https://saucenao.com/search.php?api_key=****&url=x"
    /// );
    /// ```
    pub fn obfuscate_credentials(url: &str) -> String {
        let mut obfuscated = url.to_string();

        // Handle URL auth (user:pass@host)
        if let Ok(parsed) = Url::parse(url)
            && (!parsed.username().is_empty() || parsed.password().is_some())
        {
            let mut new_url = parsed.clone();
            let _ = new_url.set_username("****");
            let _ = new_url.set_password(Some("****"));
            obfuscated = new_url.to_string();
        }

        SENSITIVE_PARAMS
            .replace_all(&obfuscated, "${1}****")
            .to_string()
    }
}
