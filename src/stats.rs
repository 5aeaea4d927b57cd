use crate::model::{AggregateStats, AuctionRecord};

/// Most recent first. Records sharing a date keep their relative order.
pub fn sort_by_recency(records: &mut [AuctionRecord]) {
    records.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Summary over records already sorted by [`sort_by_recency`]; all zero when
/// there is nothing to summarize.
pub fn aggregate(records: &[AuctionRecord]) -> AggregateStats {
    let Some(latest) = records.first() else {
        return AggregateStats::default();
    };

    let lowest_price = records.iter().map(|r| r.price).min().unwrap_or_default();
    let highest_price = records.iter().map(|r| r.price).max().unwrap_or_default();

    let count = records.len() as u64;
    let total: u64 = records.iter().map(|r| u64::from(r.price)).sum();
    // Half rounds up.
    let average = (2 * total + count) / (2 * count);

    AggregateStats {
        lowest_price,
        highest_price,
        average_price: u32::try_from(average).unwrap_or(u32::MAX),
        latest_price: latest.price,
    }
}
