use chrono::NaiveDate;

use crate::models::news::NewsItem;

/// Publish-window filter: the order-preserving subsequence of `items` that
/// are live on `today`.
pub fn visible_on(items: Vec<NewsItem>, today: NaiveDate) -> Vec<NewsItem> {
    items.into_iter().filter(|item| is_visible(item, today)).collect()
}

/// An item with no window is always live; a single bound is half-open.
///
/// An inverted window (start after end) is left to the raw comparisons —
/// with both bounds present it matches nothing. Undefined upstream, kept
/// undefined here rather than rejected.
pub fn is_visible(item: &NewsItem, today: NaiveDate) -> bool {
    match (item.start_date, item.end_date) {
        (None, None) => true,
        (Some(start), None) => today >= start,
        (None, Some(end)) => today <= end,
        (Some(start), Some(end)) => start <= today && today <= end,
    }
}
