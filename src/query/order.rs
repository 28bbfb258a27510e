use std::cmp::Reverse;

/// Sorts most recent first. The sort is stable, so equal timestamps keep
/// their enumeration order.
pub(crate) fn sort_recent_first<T>(items: &mut [T], timestamp: impl Fn(&T) -> i64) {
    items.sort_by_key(|item| Reverse(timestamp(item)));
}

/// Returns `[offset, offset + length)` clipped to the available items.
///
/// A negative offset or one at or past the end yields nothing.
pub(crate) fn window<T>(mut items: Vec<T>, offset: i64, length: usize) -> Vec<T> {
    let Ok(start) = usize::try_from(offset) else {
        return Vec::new();
    };
    if start >= items.len() {
        return Vec::new();
    }
    let end = start.saturating_add(length).min(items.len());
    items.truncate(end);
    items.drain(..start);
    items
}

/// Keeps items whose timestamp lies in `[low, high]`. Empty when `low > high`.
pub(crate) fn within<T>(items: &mut Vec<T>, low: i64, high: i64, timestamp: impl Fn(&T) -> i64) {
    items.retain(|item| (low..=high).contains(&timestamp(item)));
}
