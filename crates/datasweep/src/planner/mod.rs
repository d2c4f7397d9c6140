//! Plan construction strategies.
//!
//! Two interchangeable planners implement the same contract: a deterministic
//! decision table over the profile, and a delegated strategy that asks an
//! external oracle and validates its reply against the operation registry.
//! The delegated planner always fails over to the rule table; planning
//! never aborts a run because the oracle is unavailable.

mod delegated;
mod rule;

pub use delegated::DelegatedPlanner;
pub use rule::RuleBasedPlanner;

use crate::error::Result;
use crate::types::{DatasetProfile, Plan};

/// Decides which operations to run, in what order, with what parameters.
pub trait Planner: Send + Sync {
    fn plan(&self, profile: &DatasetProfile) -> Result<Plan>;
}
