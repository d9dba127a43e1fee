//! Review gating and aggregate rating statistics
//!
//! Reviews are one-per-author-per-order and only allowed on completed
//! orders. The eligibility check is pure so the same rule backs both
//! the submit command and the can-review query.

pub mod eligibility;
pub mod stats;

pub use eligibility::{ReviewEligibility, check_review_eligibility};
pub use stats::compute_review_stats;
