use anyhow::Result;
use chrono::NaiveDate;
use salewatch::config::{QueryProfile, load_profile_file};
use salewatch::model::{MergeMode, RecordOrigin};
use salewatch::pipeline::{PipelineRun, scrape_and_aggregate};
use salewatch::trace::TraceLog;
use std::fs;
use std::path::{Path, PathBuf};

fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture_profile() -> Result<QueryProfile> {
    Ok(load_profile_file(&fixture_root().join("profiles/test-e88.toml"))?.profile)
}

fn fixture_html() -> Result<String> {
    Ok(fs::read_to_string(fixture_root().join("data/test-e88.html"))?)
}

fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("test date must parse")
}

#[test]
fn search_page_yields_validated_records_sorted_by_date() -> Result<()> {
    let profile = load_fixture_profile()?;
    let html = fixture_html()?;

    let mut run = PipelineRun::new(&profile, date("2025-06-01"));
    let summary = run.scrape_and_aggregate(Some(html.as_str()));

    assert_eq!(summary.profile_key, "test-e88");
    assert_eq!(summary.report.cards_found, 8);
    assert_eq!(summary.report.accepted, 5);
    assert_eq!(summary.report.rejected, 3);
    assert_eq!(summary.report.merge_mode, MergeMode::ScrapedOnly);
    assert_eq!(summary.report.fallback_added, 0);
    assert!(!summary.report.fetch_degraded);

    let dates: Vec<String> = summary.records.iter().map(|r| r.date.to_string()).collect();
    assert_eq!(
        dates,
        vec![
            "2025-02-23",
            "2024-12-01",
            "2024-09-13",
            "2024-04-29",
            "2022-03-14"
        ]
    );
    assert!(
        summary
            .records
            .iter()
            .all(|r| r.origin == RecordOrigin::Scraped)
    );

    let bmw = &summary.records[0];
    assert_eq!(bmw.price, 5746);
    assert_eq!(bmw.link, "https://bringatrailer.com/listing/wheels-151/");

    let center_lock = &summary.records[2];
    assert_eq!(center_lock.price, 8200);
    assert_eq!(
        center_lock.link,
        "https://bringatrailer.com/listing/19x95-and-19x125-bbs-e88-center-lock-wheels-for-porsche/"
    );

    assert_eq!(summary.stats.lowest_price, 3900);
    assert_eq!(summary.stats.highest_price, 8200);
    assert_eq!(summary.stats.average_price, 5589);
    assert_eq!(summary.stats.latest_price, 5746);

    assert!(
        run.trace()
            .iter()
            .any(|line| line == "Total listing cards found: 8")
    );

    Ok(())
}

#[test]
fn cards_without_usable_links_get_title_slugs() -> Result<()> {
    let profile = load_fixture_profile()?;
    let html = fixture_html()?;

    let summary =
        PipelineRun::new(&profile, date("2025-06-01")).scrape_and_aggregate(Some(html.as_str()));

    let no_anchor = summary
        .records
        .iter()
        .find(|r| r.title == "17″ BBS E88 Wheels")
        .expect("card without anchors must survive");
    assert_eq!(
        no_anchor.link,
        "https://bringatrailer.com/listing/17-bbs-e88-wheels"
    );

    let dated_path = summary
        .records
        .iter()
        .find(|r| r.title == "BBS E88 Wheels From Archive")
        .expect("card with dated path must survive");
    assert_eq!(dated_path.date, date("2022-03-14"));
    assert_eq!(
        dated_path.link,
        "https://bringatrailer.com/listing/bbs-e88-wheels-from-archive"
    );

    Ok(())
}

#[test]
fn future_inline_dates_are_pulled_back_but_overrides_are_not() -> Result<()> {
    let profile = load_fixture_profile()?;
    let html = fixture_html()?;
    let today = date("2025-06-01");

    let summary = PipelineRun::new(&profile, today).scrape_and_aggregate(Some(html.as_str()));

    let pulled_back = summary
        .records
        .iter()
        .find(|r| r.price == 3900)
        .expect("december sale must survive");
    assert_eq!(pulled_back.date, date("2024-12-01"));

    let html = r#"
        <div class="listing-card">
          <a href="https://bringatrailer.com/listing/bbs-e88-for-bmw-m3/"></a>
          <h3>BBS E88 Wheels for BMW M3</h3>
          <div class="item-results">Bid to $5,100</div>
        </div>"#;
    let early = date("2024-01-10");
    let summary = PipelineRun::new(&profile, early).scrape_and_aggregate(Some(html));
    let scheduled = summary
        .records
        .iter()
        .find(|r| r.origin == RecordOrigin::Scraped)
        .expect("scheduled sale must survive");
    assert_eq!(scheduled.date, date("2025-02-23"));
    assert!(scheduled.date > early);

    Ok(())
}

#[test]
fn page_without_cards_returns_the_catalog() -> Result<()> {
    let profile = load_fixture_profile()?;
    let html = "<html><body><p>No results.</p></body></html>";

    let summary =
        PipelineRun::new(&profile, date("2025-06-01")).scrape_and_aggregate(Some(html));

    assert_eq!(summary.records, profile.fallback_catalog());
    assert_eq!(summary.report.merge_mode, MergeMode::FallbackOnly);
    assert_eq!(summary.report.fallback_added, 5);
    assert_eq!(summary.stats.lowest_price, 4750);
    assert_eq!(summary.stats.highest_price, 8700);
    assert_eq!(summary.stats.average_price, 6479);
    assert_eq!(summary.stats.latest_price, 5746);

    Ok(())
}

#[test]
fn failed_fetch_degrades_to_catalog() -> Result<()> {
    let profile = load_fixture_profile()?;
    let mut trace = TraceLog::new();

    let summary = scrape_and_aggregate(&profile, None, date("2025-06-01"), &mut trace);

    assert!(summary.report.fetch_degraded);
    assert_eq!(summary.records.len(), 5);
    assert!(
        summary
            .records
            .iter()
            .all(|r| r.origin == RecordOrigin::Fallback)
    );
    assert!(
        trace
            .entries()
            .iter()
            .any(|line| line == "No results from scraping, using fallback data")
    );

    Ok(())
}

#[test]
fn partial_scrape_is_supplemented_from_catalog() -> Result<()> {
    let profile = load_fixture_profile()?;
    let html = r#"
        <div class="listing-card">
          <a href="/listing/wheels-151/"></a>
          <h3>18×10″ and 18×11″ BBS Motorsport E88 Wheels for BMW</h3>
          <div class="item-results">Sold for $5,746 on 2/23/25</div>
        </div>
        <div class="listing-card">
          <a href="/listing/18-bbs-e88-center-lock-wheels-for-ferrari-f50/"></a>
          <h3>18″ BBS E88 Center-Lock Wheels for Ferrari F50</h3>
          <div class="item-results">Sold for $8,700 on 8/15/23</div>
        </div>"#;

    let summary =
        PipelineRun::new(&profile, date("2025-06-01")).scrape_and_aggregate(Some(html));

    assert_eq!(summary.report.merge_mode, MergeMode::Supplemented);
    assert_eq!(summary.report.accepted, 2);
    assert_eq!(summary.report.fallback_added, 3);
    assert_eq!(summary.records.len(), 5);

    let scraped = summary
        .records
        .iter()
        .filter(|r| r.origin == RecordOrigin::Scraped)
        .count();
    assert_eq!(scraped, 2);

    Ok(())
}

#[test]
fn identical_input_gives_identical_output() -> Result<()> {
    let profile = load_fixture_profile()?;
    let html = fixture_html()?;
    let today = date("2025-06-01");

    let mut first = PipelineRun::new(&profile, today);
    let mut second = PipelineRun::new(&profile, today);
    let a = serde_json::to_string(&first.scrape_and_aggregate(Some(html.as_str())))?;
    let b = serde_json::to_string(&second.scrape_and_aggregate(Some(html.as_str())))?;

    assert_eq!(a, b);
    assert_eq!(first.trace(), second.trace());

    Ok(())
}
