use super::errors::SeasonalityError;

/// Linear-interpolated quantile (the R-7 method, matching the default of
/// common statistical packages).
///
/// Sorts a copy of `samples` ascending and interpolates between the two
/// closest order statistics at position `(n - 1) * q`. Fails with
/// `InvalidArgument` on an empty sample or `q` outside `[0, 1]`.
pub fn quantile(samples: &[f64], q: f64) -> Result<f64, SeasonalityError> {
    if samples.is_empty() {
        return Err(SeasonalityError::InvalidArgument(
            "quantile requires a non-empty sample".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&q) {
        return Err(SeasonalityError::InvalidArgument(format!(
            "quantile fraction must be in [0, 1], got {}",
            q
        )));
    }

    let mut sorted = samples.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);

    let pos = (sorted.len() - 1) as f64 * q;
    let base = pos.floor() as usize;
    let rest = pos - base as f64;

    match sorted.get(base + 1) {
        Some(next) => Ok(sorted[base] + rest * (next - sorted[base])),
        None => Ok(sorted[base]),
    }
}
