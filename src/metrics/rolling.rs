//! Rolling window helpers.

use statrs::statistics::Statistics;

/// Number of trailing rows averaged, including the current one.
pub const ROLLING_WINDOW: usize = 7;

/// Trailing mean over `window` consecutive slots ending at each index.
///
/// A slot's mean is `None` unless all `window` inputs are present, so the
/// first `window - 1` outputs are always `None`.
pub fn trailing_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slot: Vec<f64> = values[i + 1 - window..=i]
                .iter()
                .copied()
                .collect::<Option<Vec<f64>>>()?;
            Some(slot.iter().mean())
        })
        .collect()
}

/// Round to the nearest integer, ties to even (NumPy compatible).
pub fn round_half_even(x: f64) -> f64 {
    x.round_ties_even()
}
