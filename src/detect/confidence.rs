//! Confidence scoring for detected patterns.

/// Score how trustworthy a detected pattern is, 0-100.
///
/// Half the score comes from sample volume (saturating at 1000 records),
/// half from the magnitude of the change (saturating at 100%).
pub fn score(sample_size: usize, change_percent: f64) -> u8 {
    let volume = (sample_size as f64 / 20.0).min(50.0);
    let magnitude = (change_percent.abs() / 2.0).min(50.0);
    (volume + magnitude).round().clamp(0.0, 100.0) as u8
}
