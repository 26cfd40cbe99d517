/// Probability that a candidate used `uses` times is passed over by the reuse draw
///
/// Each prior use independently survives with probability `keep`, so an unused
/// candidate is never rejected and the rejection probability rises towards one
/// as the usage count grows.
pub fn reuse_rejection_probability(uses: u32, keep: f64) -> f64 {
    if uses == 0 {
        return 0.0;
    }
    let keep = keep.clamp(0.0, 1.0);
    let exponent = i32::try_from(uses).unwrap_or(i32::MAX);
    1.0 - keep.powi(exponent)
}

