use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One listing card as it appeared in the search-results document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawListingCandidate {
    pub title: String,
    pub raw_result_text: String,
    pub link: Option<String>,
    pub position: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordOrigin {
    Scraped,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuctionRecord {
    pub title: String,
    pub price: u32,
    pub date: NaiveDate,
    pub link: String,
    pub origin: RecordOrigin,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AggregateStats {
    pub lowest_price: u32,
    pub highest_price: u32,
    pub average_price: u32,
    pub latest_price: u32,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Nothing was scraped; the curated catalog stands in wholesale.
    #[default]
    FallbackOnly,
    Supplemented,
    ScrapedOnly,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RunReport {
    pub fetch_degraded: bool,
    pub cards_found: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub fallback_added: usize,
    pub merge_mode: MergeMode,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PriceSummary {
    pub profile_key: String,
    pub records: Vec<AuctionRecord>,
    pub stats: AggregateStats,
    pub report: RunReport,
}
