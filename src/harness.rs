use crate::config::load_profiles_from_dir;
use crate::model::PriceSummary;
use crate::pipeline::PipelineRun;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct HarnessOptions {
    pub config_dir: PathBuf,
    pub html_dir: PathBuf,
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileHarnessReport {
    pub profile_key: String,
    pub html_found: bool,
    pub records: usize,
    pub first_digest: String,
    pub second_digest: String,
    pub identical: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarnessReport {
    pub profiles: Vec<ProfileHarnessReport>,
    pub all_identical: bool,
}

/// Runs each profile twice over `<html_dir>/<key>.html` and compares the
/// serialized summaries byte for byte. A missing document is treated as an
/// empty page.
pub fn run_harness(options: &HarnessOptions) -> Result<HarnessReport> {
    let profiles = load_profiles_from_dir(&options.config_dir)?;

    let mut reports = Vec::new();
    for loaded in profiles {
        let profile = &loaded.profile;
        let html_path = options.html_dir.join(format!("{}.html", profile.key()));
        let html_found = html_path.exists();
        let html = if html_found {
            std::fs::read_to_string(&html_path)
                .with_context(|| format!("failed to read {}", html_path.display()))?
        } else {
            String::new()
        };

        let today = options.today.unwrap_or_else(|| profile.today());
        let first = PipelineRun::new(profile, today).scrape_and_aggregate(Some(html.as_str()));
        let second = PipelineRun::new(profile, today).scrape_and_aggregate(Some(html.as_str()));

        let first_digest = summary_digest(&first)?;
        let second_digest = summary_digest(&second)?;
        let identical = first_digest == second_digest;
        if !identical {
            warn!(profile = %profile.key(), "pipeline output differs between identical runs");
        }

        reports.push(ProfileHarnessReport {
            profile_key: profile.key().to_string(),
            html_found,
            records: first.records.len(),
            first_digest,
            second_digest,
            identical,
        });
    }

    let all_identical = reports.iter().all(|r| r.identical);
    Ok(HarnessReport {
        profiles: reports,
        all_identical,
    })
}

pub fn summary_digest(summary: &PriceSummary) -> Result<String> {
    let json = serde_json::to_vec(summary)?;
    Ok(hex::encode(Sha256::digest(json)))
}
