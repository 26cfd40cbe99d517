//! Mathematical utilities for the matching model

/// Probabilities of the usage fairness draw
pub mod probability;
