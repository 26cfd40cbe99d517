/// Candidate scoring: lightness compatibility, usage fairness and padding
pub mod fitness;
/// Greedy region-to-image matching against the pool
pub mod matcher;
