//! Windowing and summary statistics shared by every detector.

/// Split a chronologically sorted slice into `k` contiguous windows of
/// `ceil(n / k)` records each, in original order. The last window may be
/// shorter; trailing windows may be absent entirely when `n < k` leaves
/// nothing for them.
pub fn windows<T>(records: &[T], k: usize) -> Vec<&[T]> {
    let k = k.max(1);
    if records.is_empty() {
        return Vec::new();
    }
    let size = records.len().div_ceil(k);
    records.chunks(size).collect()
}

/// Percentage of records in a window matching `predicate`. Empty window is 0.
pub fn rate<T>(window: &[T], predicate: impl Fn(&T) -> bool) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let matching = window.iter().filter(|&r| predicate(r)).count();
    matching as f64 / window.len() as f64 * 100.0
}

/// 95th percentile of a value set: element at index `ceil(0.95 * m) - 1` of
/// the ascending sort, clamped into bounds. Empty set is 0.
pub fn p95(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let idx = (sorted.len() as f64 * 0.95).ceil() as usize;
    sorted[idx.saturating_sub(1).min(sorted.len() - 1)]
}

/// Arithmetic mean. Empty set is 0.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Round to 2 decimals (percentages, trend values).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to 1 decimal (change percentages).
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
