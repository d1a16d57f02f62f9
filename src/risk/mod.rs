// Risk scoring — five bounded components combined by configured weights.
//
// components.rs holds the pure per-narrative signals, toxicity.rs the
// swappable toxicity scorer, and engine.rs the weighted combination, risk
// level and reasons.

pub mod components;
pub mod engine;
pub mod toxicity;

pub use engine::RiskEngine;

/// Round to 4 decimal places, the precision every score is reported at.
pub(crate) fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}
