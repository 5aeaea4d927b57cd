use crate::model::{AuctionRecord, RecordOrigin};
use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use reqwest::header::{HeaderName, HeaderValue};
use scraper::Selector;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct LoadedProfile {
    pub path: PathBuf,
    pub profile: QueryProfile,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryProfile {
    pub profile: ProfileMeta,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    pub matching: MatchConfig,
    #[serde(default)]
    pub date_overrides: Vec<DateOverride>,
    #[serde(default)]
    pub fallback: FallbackConfig,
}

impl QueryProfile {
    pub fn validate(&self) -> Result<()> {
        if self.profile.key.trim().is_empty() {
            bail!("profile.key must not be empty");
        }
        if self.profile.search_term.trim().is_empty() {
            bail!("profile.search_term must not be empty");
        }

        let origin = Url::parse(&self.profile.site_origin)
            .with_context(|| format!("invalid profile.site_origin {}", self.profile.site_origin))?;
        if !matches!(origin.scheme(), "http" | "https") {
            bail!("profile.site_origin must be an http(s) url");
        }

        if let Some(tz) = &self.profile.timezone {
            tz.parse::<Tz>()
                .map_err(|err| anyhow!("invalid profile.timezone {tz}: {err}"))?;
        }

        if !self.fetch.search_url.contains("{query}") {
            bail!("fetch.search_url must contain a {{query}} placeholder");
        }
        if let Some(user_agent) = &self.fetch.user_agent {
            HeaderValue::from_str(user_agent)
                .with_context(|| format!("invalid fetch.user_agent {user_agent:?}"))?;
        }
        for (name, value) in &self.fetch.headers {
            HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("invalid fetch.headers name {name:?}"))?;
            HeaderValue::from_str(value)
                .with_context(|| format!("invalid fetch.headers value for {name}"))?;
        }

        for (name, selector) in [
            ("listing.card_selector", &self.listing.card_selector),
            ("listing.title_selector", &self.listing.title_selector),
            ("listing.result_selector", &self.listing.result_selector),
        ] {
            Selector::parse(selector).map_err(|err| anyhow!("invalid {name} {selector}: {err:?}"))?;
        }
        if self.listing.listing_markers.iter().all(|m| m.trim().is_empty()) {
            bail!("listing.listing_markers must contain at least one marker");
        }

        if self.matching.aliases.iter().all(|a| a.trim().is_empty()) {
            bail!("matching.aliases must contain at least one alias");
        }
        if self.matching.category_word.trim().is_empty() {
            bail!("matching.category_word must not be empty");
        }

        for (index, entry) in self.date_overrides.iter().enumerate() {
            if entry.link_contains.iter().all(|s| s.is_empty()) {
                bail!("date_overrides[{index}] needs at least one link_contains substring");
            }
        }

        for (index, record) in self.fallback.records.iter().enumerate() {
            if record.title.trim().is_empty() {
                bail!("fallback.records[{index}].title must not be empty");
            }
            if record.price == 0 {
                bail!("fallback.records[{index}].price must be positive");
            }
            if !record.link.starts_with("http") {
                bail!("fallback.records[{index}].link must be absolute");
            }
        }

        Ok(())
    }

    pub fn key(&self) -> &str {
        &self.profile.key
    }

    /// Curated records in catalog order, tagged as fallback data.
    pub fn fallback_catalog(&self) -> Vec<AuctionRecord> {
        self.fallback
            .records
            .iter()
            .map(|entry| AuctionRecord {
                title: entry.title.clone(),
                price: entry.price,
                date: entry.date,
                link: entry.link.clone(),
                origin: RecordOrigin::Fallback,
            })
            .collect()
    }

    pub fn target_count(&self) -> usize {
        self.fallback
            .target_count
            .unwrap_or(self.fallback.records.len())
    }

    pub fn search_url(&self) -> String {
        let encoded: String =
            url::form_urlencoded::byte_serialize(self.profile.search_term.as_bytes()).collect();
        self.fetch.search_url.replace("{query}", &encoded)
    }

    /// Calendar date "now" as seen from the profile's timezone.
    pub fn today(&self) -> NaiveDate {
        let now = Utc::now();
        match self
            .profile
            .timezone
            .as_deref()
            .and_then(|tz| tz.parse::<Tz>().ok())
        {
            Some(tz) => now.with_timezone(&tz).date_naive(),
            None => now.date_naive(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileMeta {
    pub key: String,
    pub name: String,
    pub search_term: String,
    pub site_origin: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_search_url")]
    pub search_url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
            headers: BTreeMap::new(),
            timeout_secs: default_timeout_secs(),
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
    #[serde(default = "default_card_selector")]
    pub card_selector: String,
    #[serde(default = "default_title_selector")]
    pub title_selector: String,
    #[serde(default = "default_result_selector")]
    pub result_selector: String,
    #[serde(default = "default_listing_markers")]
    pub listing_markers: Vec<String>,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            card_selector: default_card_selector(),
            title_selector: default_title_selector(),
            result_selector: default_result_selector(),
            listing_markers: default_listing_markers(),
        }
    }
}

impl ListingConfig {
    pub fn has_listing_marker(&self, link: &str) -> bool {
        self.listing_markers
            .iter()
            .filter(|m| !m.is_empty())
            .any(|m| link.contains(m.as_str()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchConfig {
    pub aliases: Vec<String>,
    pub category_word: String,
}

impl MatchConfig {
    pub fn matches_title(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        let alias_hit = self
            .aliases
            .iter()
            .filter(|a| !a.trim().is_empty())
            .any(|a| title.contains(&a.to_lowercase()));
        alias_hit && title.contains(&self.category_word.to_lowercase())
    }
}

/// A curated sale date keyed by substrings of the listing link.
#[derive(Debug, Clone, Deserialize)]
pub struct DateOverride {
    pub link_contains: Vec<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
}

impl DateOverride {
    pub fn matches(&self, link: &str) -> bool {
        self.link_contains
            .iter()
            .any(|needle| !needle.is_empty() && link.contains(needle.as_str()))
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct FallbackConfig {
    #[serde(default)]
    pub target_count: Option<usize>,
    #[serde(default)]
    pub records: Vec<FallbackEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FallbackEntry {
    pub title: String,
    pub price: u32,
    pub date: NaiveDate,
    pub link: String,
}

pub fn load_profiles_from_dir(config_dir: &Path) -> Result<Vec<LoadedProfile>> {
    if !config_dir.exists() {
        bail!("config dir does not exist: {}", config_dir.display());
    }

    let mut loaded = Vec::new();
    for entry in WalkDir::new(config_dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("toml") {
            continue;
        }

        loaded.push(load_profile_file(path)?);
    }

    loaded.sort_by(|a, b| a.profile.key().cmp(b.profile.key()));
    Ok(loaded)
}

pub fn load_profile_file(config_path: &Path) -> Result<LoadedProfile> {
    let text = std::fs::read_to_string(config_path)
        .with_context(|| format!("failed to read profile config: {}", config_path.display()))?;
    let profile = parse_profile(&text)
        .with_context(|| format!("invalid profile config {}", config_path.display()))?;
    Ok(LoadedProfile {
        path: config_path.to_path_buf(),
        profile,
    })
}

pub fn parse_profile(text: &str) -> Result<QueryProfile> {
    let profile: QueryProfile = toml::from_str(text).context("failed to parse profile toml")?;
    profile.validate()?;
    Ok(profile)
}

fn default_true() -> bool {
    true
}

fn default_search_url() -> String {
    "https://bringatrailer.com/search/?s={query}".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_card_selector() -> String {
    ".listing-card".to_string()
}

fn default_title_selector() -> String {
    "h3".to_string()
}

fn default_result_selector() -> String {
    ".item-results".to_string()
}

fn default_listing_markers() -> Vec<String> {
    vec!["/listing/".to_string(), "/auctions/".to_string()]
}
