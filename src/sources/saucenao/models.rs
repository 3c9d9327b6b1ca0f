//! SauceNAO JSON API response shapes (`output_type=2`)
//!
//! The API is loose with types: limits arrive as strings or numbers,
//! similarities as strings, ids as numbers. Everything the normalizer does
//! not need is left out.

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub header: ResponseHeader,
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseHeader {
    /// 0 on success, negative for client-side errors, positive for server-side
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient::u32")]
    pub short_limit: Option<u32>,
    #[serde(default, deserialize_with = "lenient::u32")]
    pub long_limit: Option<u32>,
    #[serde(default, deserialize_with = "lenient::u32")]
    pub short_remaining: Option<u32>,
    #[serde(default, deserialize_with = "lenient::u32")]
    pub long_remaining: Option<u32>,
    /// Matches below this similarity are what the site lists as "low similarity"
    #[serde(default, deserialize_with = "lenient::f64")]
    pub minimum_similarity: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub header: ResultHeader,
    #[serde(default)]
    pub data: ResultData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultHeader {
    #[serde(default, deserialize_with = "lenient::f64")]
    pub similarity: Option<f64>,
    pub index_id: u32,
    #[serde(default)]
    pub index_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultData {
    #[serde(default)]
    pub ext_urls: Vec<String>,
    /// Pixiv and other member-based sites
    #[serde(default)]
    pub member_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub member_id: Option<String>,
    /// DeviantArt and other gallery sites
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_url: Option<String>,
    /// Booru artist tag(s)
    #[serde(default)]
    pub creator: Option<Names>,
    /// Booru copyright tag(s), comma separated
    #[serde(default)]
    pub material: Option<String>,
    /// Original source URL recorded by booru sites
    #[serde(default)]
    pub source: Option<String>,
}

/// A single name or a list of names
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Names {
    One(String),
    Many(Vec<String>),
}

impl Names {
    pub fn first(&self) -> Option<&str> {
        match self {
            Names::One(name) => Some(name.as_str()),
            Names::Many(names) => names.first().map(String::as_str),
        }
    }
}

impl ResultData {
    /// Material labels, best first
    pub fn material_labels(&self) -> Vec<&str> {
        self.material
            .as_deref()
            .map(|material| {
                material
                    .split(',')
                    .map(str::trim)
                    .filter(|label| !label.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every URL attached to the match
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.ext_urls
            .iter()
            .map(String::as_str)
            .chain(self.source.as_deref())
    }

    /// First attached URL whose text contains `needle`
    pub fn url_containing(&self, needle: &str) -> Option<&str> {
        self.ext_urls
            .iter()
            .map(String::as_str)
            .find(|url| url.contains(needle))
    }
}

/// Deserializers that accept numbers or numeric strings
mod lenient {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(serde_json::Number),
        Text(String),
    }

    fn raw<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Raw>, D::Error> {
        Option::<Raw>::deserialize(deserializer)
    }

    pub fn u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        Ok(match raw(deserializer)? {
            Some(Raw::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Some(Raw::Text(s)) => s.trim().parse().ok(),
            None => None,
        })
    }

    pub fn f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Ok(match raw(deserializer)? {
            Some(Raw::Number(n)) => n.as_f64(),
            Some(Raw::Text(s)) => s.trim().parse().ok(),
            None => None,
        })
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(match raw(deserializer)? {
            Some(Raw::Number(n)) => Some(n.to_string()),
            Some(Raw::Text(s)) => Some(s),
            None => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_loose_header_types() {
        let json = r#"{
            "header": {
                "status": 0,
                "short_limit": "4",
                "long_limit": "100",
                "short_remaining": 3,
                "long_remaining": 99,
                "minimum_similarity": 55.5
            },
            "results": [{
                "header": {"similarity": "91.02", "index_id": 5, "index_name": "Index #5: Pixiv Images"},
                "data": {"ext_urls": ["https://www.pixiv.net/artworks/1"], "member_name": "someone", "member_id": 42}
            }]
        }"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.header.short_limit, Some(4));
        assert_eq!(response.header.long_remaining, Some(99));
        assert_eq!(response.header.minimum_similarity, Some(55.5));

        let result = &response.results[0];
        assert_eq!(result.header.similarity, Some(91.02));
        assert_eq!(result.data.member_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_error_response_without_results() {
        let json = r#"{"header": {"status": -2, "message": "Search Rate Too High."}}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.header.status, -2);
        assert!(response.results.is_empty());
    }

    #[test]
    fn test_creator_as_string_or_list() {
        let one: ResultData = serde_json::from_str(r#"{"creator": "artist"}"#).unwrap();
        assert_eq!(one.creator.unwrap().first(), Some("artist"));

        let many: ResultData = serde_json::from_str(r#"{"creator": ["a", "b"]}"#).unwrap();
        assert_eq!(many.creator.unwrap().first(), Some("a"));

        let none: ResultData = serde_json::from_str(r#"{"creator": []}"#).unwrap();
        assert_eq!(none.creator.unwrap().first(), None);
    }

    #[test]
    fn test_material_labels_split_on_commas() {
        let data: ResultData =
            serde_json::from_str(r#"{"material": "touhou project, original"}"#).unwrap();
        assert_eq!(data.material_labels(), vec!["touhou project", "original"]);
        assert!(ResultData::default().material_labels().is_empty());
    }

    #[test]
    fn test_urls_include_booru_source() {
        let data: ResultData = serde_json::from_str(
            r#"{"ext_urls": ["https://danbooru.donmai.us/post/show/1"], "source": "https://gelbooru.com/index.php?page=post&s=view&id=2"}"#,
        )
        .unwrap();
        assert_eq!(data.urls().count(), 2);
        assert_eq!(
            data.url_containing("donmai"),
            Some("https://danbooru.donmai.us/post/show/1")
        );
    }
}
