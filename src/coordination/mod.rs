// Coordination detection — pairwise author comparison and group building.
//
// Flow: evidence (score one author pair) -> detector (every author pair in
// every narrative) -> groups (connected components over the kept pairs).
// report formats the results for people. Nothing here touches storage.

pub mod detector;
pub mod evidence;
pub mod groups;
pub mod report;

pub use detector::CoordinationDetector;
pub use evidence::score_pair;
pub use groups::build_groups;
