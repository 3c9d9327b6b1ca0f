//! Mapping from SauceNAO index ids to the attribution fields they fill
//!
//! The table is the only place that knows which index behaves like which
//! kind of site. Indexes that are not listed are reported as
//! [`SiteCategory::Unrecognized`] instead of being guessed at.

use crate::models::SauceField;

/// How a match's data should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteCategory {
    /// Member pages with an artist id (Pixiv): member / pixiv_art / pixiv_src
    ArtistProfile,
    /// Author galleries (DeviantArt): author / deviantart_art / deviantart_src
    Gallery,
    /// Tag boards carrying a creator tag: creator only
    Booru,
    /// Not in the table
    Unrecognized,
}

/// `(index_id, site, category)`
pub const INDEX_CATEGORIES: &[(u32, &str, SiteCategory)] = &[
    (5, "Pixiv", SiteCategory::ArtistProfile),
    (6, "Pixiv Historical", SiteCategory::ArtistProfile),
    (34, "DeviantArt", SiteCategory::Gallery),
    (9, "Danbooru", SiteCategory::Booru),
    (12, "Yande.re", SiteCategory::Booru),
    (25, "Gelbooru", SiteCategory::Booru),
    (26, "Konachan", SiteCategory::Booru),
    (27, "Sankaku Channel", SiteCategory::Booru),
    (28, "Anime-Pictures", SiteCategory::Booru),
    (29, "e621", SiteCategory::Booru),
    (30, "Idol Complex", SiteCategory::Booru),
];

/// `(hostname fragment, field)` for board links found in any match
pub const BOARD_HOSTS: &[(&str, SauceField)] = &[
    ("danbooru.donmai.us", SauceField::Danbooru),
    ("gelbooru.com", SauceField::Gelbooru),
    ("sankakucomplex.com", SauceField::Sankaku),
];

impl SiteCategory {
    pub fn for_index(index_id: u32) -> Self {
        INDEX_CATEGORIES
            .iter()
            .find(|(id, _, _)| *id == index_id)
            .map(|(_, _, category)| *category)
            .unwrap_or(SiteCategory::Unrecognized)
    }
}

/// Board field a URL belongs to, by hostname substring
pub fn board_field(url: &str) -> Option<SauceField> {
    BOARD_HOSTS
        .iter()
        .find(|(host, _)| url.contains(host))
        .map(|(_, field)| *field)
}
