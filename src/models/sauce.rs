//! Normalized result of resolving one image to its source
//!
//! The field order declared in [`SauceField::SCHEMA`] is the one ordering
//! used by the cache codec, template lookup and emptiness checks. Cached
//! payloads are positional, so the schema is append-only: new fields go at
//! the end and existing ones never move.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One named slot of a [`SauceRecord`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SauceField {
    Creator,
    Material,
    Author,
    Member,
    DeviantartArt,
    DeviantartSrc,
    PixivArt,
    PixivSrc,
    Gelbooru,
    Danbooru,
    Sankaku,
    ErrorKind,
}

impl SauceField {
    /// Canonical field order. Append only.
    pub const SCHEMA: [SauceField; 12] = [
        SauceField::Creator,
        SauceField::Material,
        SauceField::Author,
        SauceField::Member,
        SauceField::DeviantartArt,
        SauceField::DeviantartSrc,
        SauceField::PixivArt,
        SauceField::PixivSrc,
        SauceField::Gelbooru,
        SauceField::Danbooru,
        SauceField::Sankaku,
        SauceField::ErrorKind,
    ];

    pub const COUNT: usize = Self::SCHEMA.len();

    /// Position of this field in the schema
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            SauceField::Creator => "creator",
            SauceField::Material => "material",
            SauceField::Author => "author",
            SauceField::Member => "member",
            SauceField::DeviantartArt => "deviantart_art",
            SauceField::DeviantartSrc => "deviantart_src",
            SauceField::PixivArt => "pixiv_art",
            SauceField::PixivSrc => "pixiv_src",
            SauceField::Gelbooru => "gelbooru",
            SauceField::Danbooru => "danbooru",
            SauceField::Sankaku => "sankaku",
            SauceField::ErrorKind => "error_kind",
        }
    }

    /// Look a field up by its serialized name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::SCHEMA.into_iter().find(|field| field.name() == name)
    }

    /// Whether this field carries data, as opposed to resolution status
    pub fn is_content(self) -> bool {
        self != SauceField::ErrorKind
    }
}

impl fmt::Display for SauceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a resolution produced no usable data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The provider answered and had no match. Cacheable.
    NotFound,
    /// Network, timeout or body read failure
    ProviderTransportError,
    /// The provider refused the request for exceeding a search window
    ProviderRateLimited,
    /// The provider answered with an error status or an unreadable body
    ProviderError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::ProviderTransportError => "provider_transport_error",
            ErrorKind::ProviderRateLimited => "provider_rate_limited",
            ErrorKind::ProviderError => "provider_error",
        }
    }

    /// `not_found` is a terminal answer; everything else is a failure
    pub fn is_failure(self) -> bool {
        self != ErrorKind::NotFound
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_found" => Ok(ErrorKind::NotFound),
            "provider_transport_error" => Ok(ErrorKind::ProviderTransportError),
            "provider_rate_limited" => Ok(ErrorKind::ProviderRateLimited),
            "provider_error" => Ok(ErrorKind::ProviderError),
            _ => Err(format!("Unknown error kind: {s}")),
        }
    }
}

/// What we learned about one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SauceRecord {
    image_url: String,
    values: [Option<String>; SauceField::COUNT],
    error_kind: Option<ErrorKind>,
}

impl SauceRecord {
    /// Create an all-null record for `image_url`
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            values: Default::default(),
            error_kind: None,
        }
    }

    /// Create a record carrying only an error classification
    pub fn with_error(image_url: impl Into<String>, kind: ErrorKind) -> Self {
        let mut record = Self::new(image_url);
        record.set_error_kind(kind);
        record
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn get(&self, field: SauceField) -> Option<&str> {
        if field == SauceField::ErrorKind {
            return self.error_kind.map(ErrorKind::as_str);
        }
        self.values[field.index()].as_deref()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }

    /// Set `field` only if it is still null and `value` carries text.
    ///
    /// Returns whether the field was written. Empty or whitespace-only
    /// values count as absent.
    pub fn update_if_absent<S: AsRef<str>>(&mut self, field: SauceField, value: Option<S>) -> bool {
        let Some(value) = value else {
            return false;
        };
        let value = value.as_ref();
        if value.trim().is_empty() {
            return false;
        }

        if field == SauceField::ErrorKind {
            return match value.parse::<ErrorKind>() {
                Ok(kind) if self.error_kind.is_none() => {
                    self.error_kind = Some(kind);
                    true
                }
                _ => false,
            };
        }

        let slot = &mut self.values[field.index()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(value.to_string());
        true
    }

    /// Classify this record. First classification wins, like every field.
    pub fn set_error_kind(&mut self, kind: ErrorKind) -> bool {
        if self.error_kind.is_some() {
            return false;
        }
        self.error_kind = Some(kind);
        true
    }

    /// True when no content field is set (`image_url` and `error_kind` are ignored)
    pub fn is_empty(&self) -> bool {
        SauceField::SCHEMA
            .into_iter()
            .filter(|field| field.is_content())
            .all(|field| self.get(field).is_none())
    }

    /// True when even `error_kind` is null
    pub fn is_blank(&self) -> bool {
        self.is_empty() && self.error_kind.is_none()
    }

    /// All fields in schema order
    pub fn fields(&self) -> impl Iterator<Item = (SauceField, Option<&str>)> + '_ {
        SauceField::SCHEMA
            .into_iter()
            .map(move |field| (field, self.get(field)))
    }
}

impl Serialize for SauceRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(SauceField::COUNT + 1))?;
        map.serialize_entry("image_url", &self.image_url)?;
        for (field, value) in self.fields() {
            map.serialize_entry(field.name(), &value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_schema_positions_match_declaration_order() {
        for (position, field) in SauceField::SCHEMA.iter().enumerate() {
            assert_eq!(field.index(), position, "{field} is out of place");
            assert_eq!(SauceField::from_name(field.name()), Some(*field));
        }
    }

    #[test]
    fn test_new_record_is_empty_and_blank() {
        let record = SauceRecord::new("https://i.imgur.com/abc.jpg");
        assert!(record.is_empty());
        assert!(record.is_blank());
        assert_eq!(record.image_url(), "https://i.imgur.com/abc.jpg");
    }

    #[test]
    fn test_error_kind_does_not_count_as_content() {
        let record = SauceRecord::with_error("https://x/y.png", ErrorKind::NotFound);
        assert!(record.is_empty());
        assert!(!record.is_blank());
        assert_eq!(record.get(SauceField::ErrorKind), Some("not_found"));
    }

    #[test]
    fn test_update_if_absent_keeps_first_value() {
        let mut record = SauceRecord::new("https://x/y.png");
        assert!(record.update_if_absent(SauceField::Creator, Some("first")));
        assert!(!record.update_if_absent(SauceField::Creator, Some("second")));
        assert_eq!(record.get(SauceField::Creator), Some("first"));
        assert!(!record.is_empty());
    }

    #[test]
    fn test_update_if_absent_ignores_missing_and_empty_values() {
        let mut record = SauceRecord::new("https://x/y.png");
        assert!(!record.update_if_absent::<&str>(SauceField::Member, None));
        assert!(!record.update_if_absent(SauceField::Member, Some("")));
        assert!(!record.update_if_absent(SauceField::Member, Some("   ")));
        assert!(record.update_if_absent(SauceField::Member, Some("artist")));
        assert_eq!(record.get(SauceField::Member), Some("artist"));
    }

    #[test]
    fn test_update_if_absent_parses_error_kind() {
        let mut record = SauceRecord::new("https://x/y.png");
        assert!(!record.update_if_absent(SauceField::ErrorKind, Some("bogus")));
        assert!(record.update_if_absent(SauceField::ErrorKind, Some("provider_rate_limited")));
        assert!(!record.set_error_kind(ErrorKind::NotFound));
        assert_eq!(record.error_kind(), Some(ErrorKind::ProviderRateLimited));
    }

    #[test]
    fn test_serialize_uses_schema_order() {
        let mut record = SauceRecord::new("https://x/y.png");
        record.update_if_absent(SauceField::Sankaku, Some("https://chan.sankakucomplex.com/post/1"));
        let json = serde_json::to_string(&record).unwrap();
        let creator = json.find("\"creator\"").unwrap();
        let sankaku = json.find("\"sankaku\"").unwrap();
        let error_kind = json.find("\"error_kind\"").unwrap();
        assert!(json.starts_with("{\"image_url\""));
        assert!(creator < sankaku && sankaku < error_kind);
    }

    fn any_field() -> impl Strategy<Value = SauceField> {
        (0..SauceField::COUNT - 1).prop_map(|i| SauceField::SCHEMA[i])
    }

    proptest! {
        #[test]
        fn test_first_writer_wins_regardless_of_later_writes(
            field in any_field(),
            first in "[a-z]{1,12}",
            later in proptest::collection::vec(proptest::option::of("[a-z ]{0,12}"), 0..8),
        ) {
            let mut record = SauceRecord::new("https://x/y.png");
            record.update_if_absent(field, Some(first.as_str()));
            for value in later {
                record.update_if_absent(field, value);
            }
            prop_assert_eq!(record.get(field), Some(first.as_str()));
        }
    }
}
