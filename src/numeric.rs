// Shared numeric helpers for every percentage, share and bar width.

/// `numerator / denominator`, or `0.0` when the denominator is zero
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// `part` as a percentage of `whole`, `0.0` when `whole` is zero
///
/// Multiplies before dividing so exact shares stay exact (30 of 100 is 30.0).
pub fn percent_of(part: f64, whole: f64) -> f64 {
    safe_ratio(part * 100.0, whole)
}

/// Round half away from zero to `places` decimals (display values only)
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}
