use crate::config::ListingConfig;
use crate::model::RawListingCandidate;
use crate::trace::LogSink;
use anyhow::{Result, anyhow};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static PRICE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([0-9,]+)").expect("price regex must be valid"));

static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("anchor selector must be valid"));

struct CardSelectors {
    card: Selector,
    title: Selector,
    result: Selector,
}

impl CardSelectors {
    fn compile(listing: &ListingConfig) -> Result<Self> {
        let parse = |selector: &str| {
            Selector::parse(selector).map_err(|err| anyhow!("invalid selector {selector}: {err:?}"))
        };
        Ok(Self {
            card: parse(&listing.card_selector)?,
            title: parse(&listing.title_selector)?,
            result: parse(&listing.result_selector)?,
        })
    }
}

/// Extracts listing cards in document order. Malformed markup yields fewer
/// (possibly zero) candidates, never an error.
pub fn parse_listing_candidates(
    html: &str,
    listing: &ListingConfig,
    sink: &mut dyn LogSink,
) -> Vec<RawListingCandidate> {
    let selectors = match CardSelectors::compile(listing) {
        Ok(selectors) => selectors,
        Err(err) => {
            sink.record(format!("Listing selectors unusable: {err:#}"));
            return Vec::new();
        }
    };

    let document = Html::parse_document(html);
    let cards: Vec<ElementRef<'_>> = document.select(&selectors.card).collect();
    sink.record(format!("Total listing cards found: {}", cards.len()));

    let mut candidates = Vec::with_capacity(cards.len());
    for (position, card) in cards.into_iter().enumerate() {
        let title = joined_text(card, &selectors.title);
        sink.record(format!(
            "Examining card #{}: Title = \"{title}\"",
            position + 1
        ));

        let link = resolve_card_link(card, listing, sink);
        let raw_result_text = joined_text(card, &selectors.result);

        candidates.push(RawListingCandidate {
            title,
            raw_result_text,
            link,
            position,
        });
    }

    candidates
}

fn joined_text(card: ElementRef<'_>, selector: &Selector) -> String {
    card.select(selector)
        .flat_map(|el| el.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Best-guess listing link for a card: wrapping anchor, then the first
/// descendant anchor pointing at a listing path, then the first descendant
/// anchor of any kind.
pub fn resolve_card_link(
    card: ElementRef<'_>,
    listing: &ListingConfig,
    sink: &mut dyn LogSink,
) -> Option<String> {
    if let Some(parent) = card.parent().and_then(ElementRef::wrap)
        && parent.value().name() == "a"
    {
        let href = parent.value().attr("href").unwrap_or_default().to_string();
        sink.record(format!("- Found link from parent anchor: {href}"));
        return Some(href).filter(|h| !h.is_empty());
    }

    let mut first_href: Option<String> = None;
    for (index, anchor) in card.select(&ANCHOR).enumerate() {
        let href = anchor.value().attr("href").unwrap_or_default();
        sink.record(format!("- Checking anchor #{index}: {href}"));
        if index == 0 {
            first_href = Some(href.to_string());
        }
        if !href.is_empty() && listing.has_listing_marker(href) {
            sink.record(format!("- Found listing link from anchor in card: {href}"));
            return Some(href.to_string());
        }
    }

    let fallback = first_href.filter(|h| !h.is_empty());
    sink.record(format!(
        "- Using first anchor as fallback: {}",
        fallback.as_deref().unwrap_or_default()
    ));
    fallback
}

/// First `$1,234`-style amount in the text, separators removed.
pub fn parse_price(raw_result_text: &str) -> Option<u32> {
    let caps = PRICE_TOKEN.captures(raw_result_text)?;
    let digits: String = caps
        .get(1)?
        .as_str()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse::<u32>().ok()
}
