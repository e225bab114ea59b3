//! Simulator-vs-market z-scores

/// Standardized distance between the simulator's raw mean and the market line.
///
/// `z = clip((raw_mean - market_line) / raw_sd, -z_cap, z_cap)`. A non-positive
/// or non-finite spread, or a non-finite mean, carries no signal and yields 0.
pub fn z_score(raw_mean: f64, market_line: f64, raw_sd: f64, z_cap: f64) -> f64 {
    if !(raw_sd.is_finite() && raw_sd > 0.0) || !raw_mean.is_finite() || !market_line.is_finite()
    {
        return 0.0;
    }
    let cap = z_cap.abs();
    ((raw_mean - market_line) / raw_sd).clamp(-cap, cap)
}
