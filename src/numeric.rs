//! Numeric conversion helpers used by the outcome evaluator.
//!
//! Piece counts live in `usize` while rates are reported as `f64`. These
//! helpers keep the lossy casts in one place.

/// Ratio of `part` to `whole`, or `0.0` when `whole` is zero.
///
/// # Examples
///
/// ```
/// use trestle::numeric::ratio;
/// assert!((ratio(9, 10) - 0.9).abs() < 1e-12);
/// assert_eq!(ratio(3, 0), 0.0);
/// ```
#[expect(
    clippy::cast_precision_loss,
    reason = "Piece counts stay far below 2^52, so the conversion is exact."
)]
#[must_use]
pub fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64
}

/// Rounds a rate in `[0, ∞)` to a whole percentage.
///
/// Non-finite or negative input yields `0`.
///
/// # Examples
///
/// ```
/// use trestle::numeric::round_percent;
/// assert_eq!(round_percent(0.906), 91);
/// assert_eq!(round_percent(f64::NAN), 0);
/// ```
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "The value is clamped into the u32 domain before casting."
)]
#[must_use]
pub fn round_percent(rate: f64) -> u32 {
    if !rate.is_finite() || rate <= 0.0 {
        return 0;
    }
    (rate * 100.0).round().min(f64::from(u32::MAX)) as u32
}
