//! Which submission links can be looked up

use url::Url;

const IMAGE_EXTENSIONS: [&str; 2] = [".jpg", ".png"];
const IMGUR_HOSTS: [&str; 4] = ["imgur.com", "www.imgur.com", "m.imgur.com", "i.imgur.com"];

/// Direct image URL for a submission link, if it has one
///
/// - links whose path ends in `.jpg` or `.png` are used unchanged
/// - imgur single-image pages (`imgur.com/<id>`) become `imgur.com/<id>.jpg`
///   with any query or fragment dropped; albums and galleries are skipped
///
/// ```rust
/// use sauce_bot::bot::image_url::extract_image_url;
///
/// assert_eq!(
///     extract_image_url("https://imgur.com/AbC123").as_deref(),
///     Some("https://imgur.com/AbC123.jpg")
/// );
/// assert_eq!(extract_image_url("https://imgur.com/a/AbC123"), None);
/// ```
pub fn extract_image_url(link: &str) -> Option<String> {
    let parsed = Url::parse(link).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }

    let path = parsed.path().to_ascii_lowercase();
    if IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return Some(link.to_string());
    }

    let host = parsed.host_str()?.to_ascii_lowercase();
    if !IMGUR_HOSTS.contains(&host.as_str()) {
        return None;
    }

    let mut segments = parsed.path_segments()?.filter(|segment| !segment.is_empty());
    match (segments.next(), segments.next()) {
        (Some(id), None) if is_imgur_id(id) => {
            let mut direct = parsed.clone();
            direct.set_path(&format!("/{id}.jpg"));
            direct.set_query(None);
            direct.set_fragment(None);
            Some(direct.to_string())
        }
        _ => None,
    }
}

fn is_imgur_id(segment: &str) -> bool {
    segment.chars().all(|c| c.is_ascii_alphanumeric())
}
