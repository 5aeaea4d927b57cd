use crate::config::{QueryProfile, load_profile_file, load_profiles_from_dir};
use crate::dates::{DateContext, resolve_sale_date};
use crate::fetch::{FetchClient, HttpFetcher, fetch_search_page};
use crate::links::normalize_link;
use crate::merge::merge_with_fallback;
use crate::model::{AuctionRecord, PriceSummary, RecordOrigin, RunReport};
use crate::parser::{parse_listing_candidates, parse_price};
use crate::stats::{aggregate, sort_by_recency};
use crate::trace::{LogSink, TraceLog};
use crate::validate::validate_candidate;
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct TrackOptions {
    pub config_dir: PathBuf,
    pub profile: Option<String>,
    pub html_file: Option<PathBuf>,
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub config_dir: Option<PathBuf>,
    pub profile_file: Option<PathBuf>,
}

/// One pipeline invocation for one profile, owning its own trace.
pub struct PipelineRun<'a> {
    profile: &'a QueryProfile,
    today: NaiveDate,
    trace: TraceLog,
}

impl<'a> PipelineRun<'a> {
    pub fn new(profile: &'a QueryProfile, today: NaiveDate) -> Self {
        Self {
            profile,
            today,
            trace: TraceLog::new(),
        }
    }

    /// `None` stands for a failed fetch and yields the curated catalog.
    pub fn scrape_and_aggregate(&mut self, html: Option<&str>) -> PriceSummary {
        scrape_and_aggregate(self.profile, html, self.today, &mut self.trace)
    }

    pub fn trace(&self) -> &[String] {
        self.trace.entries()
    }

    pub fn into_trace(self) -> Vec<String> {
        self.trace.into_entries()
    }
}

pub fn scrape_and_aggregate(
    profile: &QueryProfile,
    html: Option<&str>,
    today: NaiveDate,
    sink: &mut dyn LogSink,
) -> PriceSummary {
    let mut report = RunReport {
        fetch_degraded: html.is_none(),
        ..RunReport::default()
    };

    let scraped = match html {
        Some(html) => extract_scraped_records(profile, html, today, sink, &mut report),
        None => Vec::new(),
    };
    sink.record(format!(
        "Found {} completed {} auctions",
        scraped.len(),
        profile.profile.name
    ));

    let catalog = profile.fallback_catalog();
    let merged = merge_with_fallback(scraped, &catalog, profile.target_count(), sink);
    report.fallback_added = merged.added;
    report.merge_mode = merged.mode;

    let mut records = merged.records;
    sort_by_recency(&mut records);
    let stats = aggregate(&records);

    PriceSummary {
        profile_key: profile.key().to_string(),
        records,
        stats,
        report,
    }
}

/// Runs every listing card through price/date extraction, validation and
/// link normalization. Rejected cards are traced and dropped.
pub fn extract_scraped_records(
    profile: &QueryProfile,
    html: &str,
    today: NaiveDate,
    sink: &mut dyn LogSink,
    report: &mut RunReport,
) -> Vec<AuctionRecord> {
    let candidates = parse_listing_candidates(html, &profile.listing, sink);
    report.cards_found = candidates.len();

    let mut records = Vec::new();
    for candidate in candidates {
        let card = candidate.position + 1;
        sink.record(format!("- Item results text: {}", candidate.raw_result_text));

        let price = parse_price(&candidate.raw_result_text);
        match price {
            Some(price) => sink.record(format!("- Extracted price: ${price}")),
            None => sink.record(format!(
                "- No price found in: {}",
                candidate.raw_result_text
            )),
        }

        let link = candidate.link.as_deref().unwrap_or_default();
        let date = resolve_sale_date(
            &DateContext {
                raw_result_text: &candidate.raw_result_text,
                link,
                overrides: &profile.date_overrides,
                today,
            },
            sink,
        );

        let sale = match validate_candidate(&profile.matching, &candidate, price, date) {
            Ok(sale) => sale,
            Err(reason) => {
                sink.record(format!(
                    "Skipping card #{card} ({reason}): {}",
                    candidate.title
                ));
                report.rejected += 1;
                continue;
            }
        };

        let link = normalize_link(
            sale.link.as_deref(),
            &sale.title,
            &profile.profile.site_origin,
            &profile.listing,
            sink,
        );
        sink.record(format!(
            "Added auction: {} (${}, {})",
            sale.title, sale.price, sale.date
        ));
        records.push(AuctionRecord {
            title: sale.title,
            price: sale.price,
            date: sale.date,
            link,
            origin: RecordOrigin::Scraped,
        });
        report.accepted += 1;
    }

    records
}

/// Fetches through `client` and runs the pipeline; fetch failures degrade to
/// the curated catalog.
pub fn track_profile_with(
    client: &dyn FetchClient,
    profile: &QueryProfile,
    today: NaiveDate,
) -> (PriceSummary, Vec<String>) {
    let mut run = PipelineRun::new(profile, today);
    let html = fetch_search_page(client, profile, &mut run.trace);
    let summary = run.scrape_and_aggregate(html.as_deref());
    (summary, run.into_trace())
}

pub fn track_profiles(options: &TrackOptions) -> Result<Vec<PriceSummary>> {
    let mut profiles = load_profiles_from_dir(&options.config_dir)?;
    if let Some(filter) = &options.profile {
        profiles.retain(|p| p.profile.key() == filter.as_str());
    }
    if profiles.is_empty() {
        bail!("no matching profile configurations found");
    }

    let offline_html = match &options.html_file {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read html file {}", path.display()))?,
        ),
        None => None,
    };

    let mut summaries = Vec::new();
    for loaded in profiles {
        let profile = &loaded.profile;
        if !profile.profile.enabled {
            info!(profile = %profile.key(), "profile disabled; skipping");
            continue;
        }

        let today = options.today.unwrap_or_else(|| profile.today());
        info!(profile = %profile.key(), %today, "tracking start");

        let summary = match &offline_html {
            Some(html) => {
                PipelineRun::new(profile, today).scrape_and_aggregate(Some(html.as_str()))
            }
            None => match HttpFetcher::for_profile(profile) {
                Ok(client) => track_profile_with(&client, profile, today).0,
                Err(err) => {
                    warn!(
                        profile = %profile.key(),
                        error = %err,
                        "fetcher setup failed; using fallback data"
                    );
                    PipelineRun::new(profile, today).scrape_and_aggregate(None)
                }
            },
        };

        info!(
            profile = %profile.key(),
            cards = summary.report.cards_found,
            accepted = summary.report.accepted,
            rejected = summary.report.rejected,
            fallback_added = summary.report.fallback_added,
            records = summary.records.len(),
            lowest = summary.stats.lowest_price,
            highest = summary.stats.highest_price,
            average = summary.stats.average_price,
            latest = summary.stats.latest_price,
            "tracking summary"
        );
        summaries.push(summary);
    }

    Ok(summaries)
}

pub fn validate_configs(options: &ValidateOptions) -> Result<Vec<String>> {
    let mut messages = Vec::new();

    if let Some(file) = &options.profile_file {
        let loaded = load_profile_file(file)?;
        messages.push(format!("OK: {} ({})", loaded.profile.key(), file.display()));
        return Ok(messages);
    }

    if let Some(dir) = &options.config_dir {
        for loaded in load_profiles_from_dir(dir)? {
            messages.push(format!(
                "OK: {} ({})",
                loaded.profile.key(),
                loaded.path.display()
            ));
        }
        return Ok(messages);
    }

    bail!("either --config-dir or --profile-file must be provided");
}
