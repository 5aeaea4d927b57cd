use crate::config::MatchConfig;
use crate::dates::ResolvedDate;
use crate::model::RawListingCandidate;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    TitleMismatch,
    MissingPrice,
    MissingDate,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RejectReason::TitleMismatch => "title does not match profile keywords",
            RejectReason::MissingPrice => "no price found",
            RejectReason::MissingDate => "no date resolved",
        };
        f.write_str(text)
    }
}

/// A candidate that passed every gate, link not yet normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSale {
    pub title: String,
    pub price: u32,
    pub date: NaiveDate,
    pub link: Option<String>,
}

pub fn validate_candidate(
    matching: &MatchConfig,
    candidate: &RawListingCandidate,
    price: Option<u32>,
    date: Option<ResolvedDate>,
) -> Result<ValidatedSale, RejectReason> {
    if candidate.title.trim().is_empty() || !matching.matches_title(&candidate.title) {
        return Err(RejectReason::TitleMismatch);
    }
    let price = price.filter(|p| *p > 0).ok_or(RejectReason::MissingPrice)?;
    let date = date.ok_or(RejectReason::MissingDate)?;

    Ok(ValidatedSale {
        title: candidate.title.clone(),
        price,
        date: date.date,
        link: candidate.link.clone().filter(|l| !l.is_empty()),
    })
}
