//! Cleaning quality assessment.
//!
//! Mirrors the planner split: a deterministic scorer that penalizes
//! residual defects, and a delegated scorer that asks an external oracle
//! and clamps whatever comes back. The delegated validator always fails
//! over to the rule-based one.

mod delegated;
mod rule;

pub use delegated::DelegatedValidator;
pub use rule::{RuleBasedValidator, ScoringWeights};

use polars::prelude::DataFrame;

use crate::error::Result;
use crate::types::{ExecutionRecord, QualityAssessment};

/// Scores a finished cleaning run on a 1-10 scale.
pub trait Validator: Send + Sync {
    fn validate(
        &self,
        original: &DataFrame,
        cleaned: &DataFrame,
        records: &[ExecutionRecord],
    ) -> Result<QualityAssessment>;
}
