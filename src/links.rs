use crate::config::ListingConfig;
use crate::trace::LogSink;
use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex must be valid"));

const SLUG_MAX_CHARS: usize = 50;

/// Makes `link` absolute against `site_origin`, synthesizing a listing link
/// from the title when the link is missing or does not look like a listing.
pub fn normalize_link(
    link: Option<&str>,
    title: &str,
    site_origin: &str,
    listing: &ListingConfig,
    sink: &mut dyn LogSink,
) -> String {
    let Some(link) = link.filter(|l| !l.is_empty()) else {
        let generated = synthesized_link(site_origin, title);
        sink.record(format!("- Generated fallback link from title: {generated}"));
        return generated;
    };

    let absolute = if link.starts_with("http") {
        link.to_string()
    } else {
        join_origin(site_origin, link)
    };

    if listing.has_listing_marker(&absolute) {
        return absolute;
    }

    let generated = synthesized_link(site_origin, title);
    sink.record(format!("- Regenerated link from title: {generated}"));
    generated
}

pub fn synthesized_link(site_origin: &str, title: &str) -> String {
    format!(
        "{}/listing/{}",
        site_origin.trim_end_matches('/'),
        title_slug(title)
    )
}

/// Lowercase, ASCII word characters only, whitespace runs as single hyphens,
/// at most 50 characters.
pub fn title_slug(title: &str) -> String {
    let stripped: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    WHITESPACE_RUN
        .replace_all(&stripped, "-")
        .chars()
        .take(SLUG_MAX_CHARS)
        .collect()
}

fn join_origin(site_origin: &str, link: &str) -> String {
    match (site_origin.ends_with('/'), link.starts_with('/')) {
        (true, true) => format!("{}{link}", site_origin.trim_end_matches('/')),
        (false, false) => format!("{site_origin}/{link}"),
        _ => format!("{site_origin}{link}"),
    }
}
