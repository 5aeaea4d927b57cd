use crate::model::{AuctionRecord, MergeMode};
use crate::trace::LogSink;

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub records: Vec<AuctionRecord>,
    pub added: usize,
    pub mode: MergeMode,
}

/// Reconciles scraped records against the curated catalog.
///
/// Catalog entries are matched to scraped records by case-insensitive title
/// containment in either direction. Two distinct sales with overlapping
/// titles count as the same sale; there is no stable listing id to do better.
pub fn merge_with_fallback(
    scraped: Vec<AuctionRecord>,
    catalog: &[AuctionRecord],
    target_count: usize,
    sink: &mut dyn LogSink,
) -> MergeOutcome {
    if scraped.is_empty() {
        sink.record("No results from scraping, using fallback data".to_string());
        return MergeOutcome {
            records: catalog.to_vec(),
            added: catalog.len(),
            mode: MergeMode::FallbackOnly,
        };
    }

    if scraped.len() >= target_count {
        sink.record(format!(
            "Successfully scraped all {} auctions",
            scraped.len()
        ));
        return MergeOutcome {
            records: scraped,
            added: 0,
            mode: MergeMode::ScrapedOnly,
        };
    }

    sink.record(format!(
        "Only found {} of {target_count} expected auctions, supplementing with fallback data",
        scraped.len()
    ));

    let scraped_titles: Vec<String> = scraped.iter().map(|r| r.title.to_lowercase()).collect();
    let mut records = scraped;
    let mut added = 0usize;

    for entry in catalog {
        let wanted = entry.title.to_lowercase();
        let already_present = scraped_titles
            .iter()
            .any(|title| title.contains(&wanted) || wanted.contains(title.as_str()));
        if already_present {
            continue;
        }
        sink.record(format!("Adding missing auction: {}", entry.title));
        records.push(entry.clone());
        added += 1;
    }

    MergeOutcome {
        records,
        added,
        mode: MergeMode::Supplemented,
    }
}
