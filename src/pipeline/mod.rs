// Pipeline — one batch analysis over a fixed collection of posts.
//
// summarize narratives -> detect coordination -> score risk -> persist.
// The first three stages are pure; persistence is optional and isolated.

pub mod analysis;
pub mod embedding;

pub use analysis::{run, RunInput, RunOutcome};
