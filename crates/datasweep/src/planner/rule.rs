//! Deterministic rule-based planning.

use serde_json::json;
use tracing::debug;

use crate::config::AgentConfig;
use crate::error::Result;
use crate::ops::StandardizeColumnNames;
use crate::planner::Planner;
use crate::types::{DatasetProfile, Plan, PlanSource, PlanStep};

/// Fixed decision table: profile in, ordered step list out.
///
/// Step order is deliberate. Renaming happens first so later messages refer
/// to clean names, deduplication before imputation so duplicate rows cannot
/// vote in KNN neighborhoods or the mode, and outlier detection last so it
/// sees complete, deduplicated data.
pub struct RuleBasedPlanner {
    config: AgentConfig,
}

impl RuleBasedPlanner {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }
}

impl Planner for RuleBasedPlanner {
    fn plan(&self, profile: &DatasetProfile) -> Result<Plan> {
        let mut steps = Vec::new();

        let messy_names: Vec<&str> = profile
            .column_profiles
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| StandardizeColumnNames::needs_rename(name))
            .collect();
        if !messy_names.is_empty() {
            steps.push(PlanStep::new(
                "standardize_column_names",
                format!("{} column names are not snake_case", messy_names.len()),
            ));
        }

        if profile.duplicate_count > 0 {
            steps.push(
                PlanStep::new(
                    "remove_duplicates",
                    format!("{} duplicate rows found", profile.duplicate_count),
                )
                .with_param("keep", self.config.duplicate_keep.as_str()),
            );
        }

        if profile.has_missing() {
            steps.push(
                PlanStep::new(
                    "handle_missing_values",
                    format!("{} missing cells found", profile.total_missing),
                )
                .with_param("threshold", self.config.missing_value_threshold)
                .with_param("n_neighbors", self.config.knn_neighbors),
            );
        }

        let numeric_count = profile.numeric_columns().len();
        if numeric_count >= 1 && profile.rows >= 2 {
            steps.push(
                PlanStep::new(
                    "detect_outliers",
                    format!("{} numeric columns eligible for anomaly scoring", numeric_count),
                )
                .with_param("contamination", self.config.outlier_contamination)
                .with_param("remove", self.config.remove_outliers)
                .with_param("seed", json!(self.config.random_seed)),
            );
        }

        debug!(steps = steps.len(), "Rule-based plan built");
        Ok(Plan::new(steps, PlanSource::Rules))
    }
}
