// Ingestion — JSONL loading and post normalization.
//
// Raw records are parsed line by line; anything that fails to parse is
// counted as a dead letter and skipped rather than aborting the run.

pub mod loader;
pub mod normalize;

pub use loader::{load_jsonl, parse_jsonl, DeadLetter, LoadReport, RawPost};
pub use normalize::{extract_domain, Normalizer};
