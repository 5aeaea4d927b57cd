//! Sale date inference.
//!
//! Rules are tried in table order and the first one that produces a date
//! wins. Inline "sold on" dates are pulled back a year when they land in the
//! future; curated override dates are taken as-is, since some of them are
//! confirmed upcoming sales.

use crate::config::DateOverride;
use crate::trace::LogSink;
use chrono::{Datelike, Months, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

static SOLD_ON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"on\s+(\d+)/(\d+)/(\d+)").expect("sold-on date regex must be valid")
});

static LINK_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(\d{4})/(\d{2})/(\d{2})/").expect("link date regex must be valid")
});

const DEFAULT_LOOKBACK_MONTHS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRule {
    InlineSoldOn,
    LinkPath,
    KnownOverride,
    DefaultLookback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub date: NaiveDate,
    pub rule: DateRule,
}

pub struct DateContext<'a> {
    pub raw_result_text: &'a str,
    /// Link as resolved from the card, before normalization.
    pub link: &'a str,
    pub overrides: &'a [DateOverride],
    pub today: NaiveDate,
}

type RuleFn = fn(&DateContext<'_>, &mut dyn LogSink) -> Option<NaiveDate>;

const DATE_RULES: [(DateRule, RuleFn); 4] = [
    (DateRule::InlineSoldOn, inline_sold_on),
    (DateRule::LinkPath, link_path_date),
    (DateRule::KnownOverride, known_override),
    (DateRule::DefaultLookback, default_lookback),
];

pub fn resolve_sale_date(ctx: &DateContext<'_>, sink: &mut dyn LogSink) -> Option<ResolvedDate> {
    DATE_RULES.iter().find_map(|(rule, apply)| {
        apply(ctx, sink).map(|date| ResolvedDate { date, rule: *rule })
    })
}

/// Two-digit years above the current year's last two digits belong to the
/// previous century.
pub fn expand_two_digit_year(value: i32, current_year: i32) -> i32 {
    let century = current_year.div_euclid(100) * 100;
    if value > current_year.rem_euclid(100) {
        century - 100 + value
    } else {
        century + value
    }
}

/// Same month and day one year earlier; Feb 29 rolls forward to Mar 1.
pub fn previous_year(date: NaiveDate) -> NaiveDate {
    let year = date.year() - 1;
    date.with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
        .unwrap_or(date)
}

fn inline_sold_on(ctx: &DateContext<'_>, sink: &mut dyn LogSink) -> Option<NaiveDate> {
    let Some(caps) = SOLD_ON.captures(ctx.raw_result_text) else {
        sink.record(format!("- No date match in: {}", ctx.raw_result_text));
        return None;
    };

    let month = caps[1].parse::<u32>().ok()?;
    let day = caps[2].parse::<u32>().ok()?;
    let year_text = &caps[3];
    let year = match year_text.len() {
        2 => expand_two_digit_year(year_text.parse().ok()?, ctx.today.year()),
        4 => year_text.parse().ok()?,
        _ => {
            sink.record(format!("- Unusable year in sold-on date: {}", &caps[0]));
            return None;
        }
    };

    let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
        sink.record(format!("- Invalid calendar date in: {}", &caps[0]));
        return None;
    };

    if date > ctx.today {
        let corrected = previous_year(date);
        sink.record(format!(
            "- Date {date} is in the future, adjusting to previous year"
        ));
        sink.record(format!("- Extracted date: {corrected}"));
        return Some(corrected);
    }

    sink.record(format!("- Extracted date: {date}"));
    Some(date)
}

fn link_path_date(ctx: &DateContext<'_>, sink: &mut dyn LogSink) -> Option<NaiveDate> {
    let caps = LINK_DATE.captures(ctx.link)?;
    let year = caps[1].parse::<i32>().ok()?;
    let month = caps[2].parse::<u32>().ok()?;
    let day = caps[3].parse::<u32>().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    sink.record(format!("- Extracted date from URL: {date}"));
    Some(date)
}

fn known_override(ctx: &DateContext<'_>, sink: &mut dyn LogSink) -> Option<NaiveDate> {
    let entry = ctx.overrides.iter().find(|o| o.matches(ctx.link))?;
    sink.record(format!(
        "- Using known date for {}: {}",
        entry.note.as_deref().unwrap_or(ctx.link),
        entry.date
    ));
    Some(entry.date)
}

fn default_lookback(ctx: &DateContext<'_>, sink: &mut dyn LogSink) -> Option<NaiveDate> {
    let date = ctx
        .today
        .checked_sub_months(Months::new(DEFAULT_LOOKBACK_MONTHS))?;
    sink.record(format!("- Using fallback date: {date}"));
    Some(date)
}
