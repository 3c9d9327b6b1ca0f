//! Markdown reply built from a resolved record

use super::templates::CommentTemplates;
use crate::models::{SauceField, SauceRecord, Submission};
use crate::utils::text::{join_words, title_case};

const SEPARATOR: &str = " | ";
const SECTION_END: &str = "\n\n";

/// Image link labels in display order
const IMAGE_LINKS: [(SauceField, &str); 5] = [
    (SauceField::PixivSrc, "Pixiv"),
    (SauceField::Gelbooru, "Gelbooru"),
    (SauceField::Danbooru, "Danbooru"),
    (SauceField::Sankaku, "Sankaku"),
    (SauceField::DeviantartSrc, "DeviantArt"),
];

/// Build the reply for `record`, or `None` when it names no source
///
/// `None` is returned for every empty record, and also when the only set
/// fields are profile links (`pixiv_art`, `deviantart_art`): those are only
/// shown next to a member or author name, so no section is produced. The
/// output depends only on the arguments.
pub fn render(record: &SauceRecord, templates: &CommentTemplates, submission: &Submission) -> Option<String> {
    if record.is_empty() {
        return None;
    }

    let mut reply = String::new();
    attribution_section(record, &mut reply);
    material_section(record, &mut reply);
    image_links_section(record, &mut reply);

    if reply.is_empty() {
        return None;
    }

    reply.push_str(&templates.render_footer(record, submission));
    Some(reply)
}

fn attribution_section(record: &SauceRecord, reply: &mut String) {
    let creator = record.get(SauceField::Creator);
    let member = record.get(SauceField::Member);
    let author = record.get(SauceField::Author);
    if creator.is_none() && member.is_none() && author.is_none() {
        return;
    }

    reply.push_str("**Creator:** ");
    if let Some(creator) = creator {
        reply.push_str(&title_case(creator));
        reply.push_str(SEPARATOR);
    }
    if let Some(member) = member {
        reply.push_str(member);
        if let Some(profile) = record.get(SauceField::PixivArt) {
            reply.push_str(&format!(" [^(on Pixiv)]({profile})"));
        }
        reply.push_str(SEPARATOR);
    } else if let Some(author) = author {
        reply.push_str(author);
        if let Some(gallery) = record.get(SauceField::DeviantartArt) {
            reply.push_str(&format!(" [^(on DeviantArt)]({gallery})"));
        }
        reply.push_str(SEPARATOR);
    }
    reply.push_str(SECTION_END);
}

fn material_section(record: &SauceRecord, reply: &mut String) {
    let Some(material) = record.get(SauceField::Material) else {
        return;
    };

    reply.push_str("**Material:** ");
    reply.push_str(&title_case(material));
    if material != "original" {
        reply.push_str(&format!(
            " [^(Google it!)](https://www.google.com/search?q={})",
            join_words(material, '+')
        ));
        reply.push_str(&format!(
            " [^(Find on Gelbooru)](https://gelbooru.com/index.php?page=post&s=list&tags={})",
            join_words(material, '_')
        ));
    }
    reply.push_str(SECTION_END);
}

fn image_links_section(record: &SauceRecord, reply: &mut String) {
    let links: Vec<(&str, &str)> = IMAGE_LINKS
        .iter()
        .filter_map(|(field, label)| record.get(*field).map(|url| (*label, url)))
        .collect();
    if links.is_empty() {
        return;
    }

    reply.push_str("**Image links:** ");
    for (label, url) in links {
        reply.push_str(&format!("[{label}]({url})"));
        reply.push_str(SEPARATOR);
    }
    reply.push_str(SECTION_END);
}
