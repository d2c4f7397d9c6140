//! Oracle-delegated planning with registry validation and failover.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::AgentConfig;
use crate::error::Result;
use crate::ops::OperationRegistry;
use crate::oracle::{Oracle, extract_json};
use crate::planner::{Planner, RuleBasedPlanner};
use crate::types::{DatasetProfile, Plan, PlanSource, PlanStep};

#[derive(Debug, Deserialize)]
struct OraclePlan {
    steps: Vec<PlanStep>,
}

/// Asks an external oracle for a plan and validates every returned step
/// against the registry. Steps naming unknown operations or carrying
/// ill-typed parameters are discarded with a recorded warning; an
/// unreachable oracle or unusable reply fails over to [`RuleBasedPlanner`].
pub struct DelegatedPlanner {
    oracle: Arc<dyn Oracle>,
    registry: Arc<OperationRegistry>,
    fallback: RuleBasedPlanner,
}

impl DelegatedPlanner {
    pub fn new(oracle: Arc<dyn Oracle>, registry: Arc<OperationRegistry>, config: AgentConfig) -> Self {
        Self {
            oracle,
            registry,
            fallback: RuleBasedPlanner::new(config),
        }
    }

    fn build_prompt(&self, profile: &DatasetProfile) -> Result<String> {
        let profile_json = serde_json::to_string_pretty(profile)?;
        let operations = serde_json::to_string_pretty(&self.registry.schemas())?;

        Ok(format!(
            "You are a data cleaning planner. Given the dataset profile below, \
            decide which cleaning operations to run and in what order.\n\n\
            DATASET PROFILE:\n{}\n\n\
            AVAILABLE OPERATIONS:\n{}\n\n\
            Reply with ONLY a JSON object of this exact shape:\n\
            {{\"steps\": [{{\"operation\": \"<name>\", \"parameters\": {{}}, \"reason\": \"<why>\"}}]}}\n\n\
            Use only the operation names listed above. Do not add any other text.",
            profile_json, operations
        ))
    }

    /// Parse and validate the oracle reply. `Err` here means the reply was
    /// unusable as a whole; individual bad steps are dropped with warnings.
    fn parse_reply(&self, reply: &str) -> std::result::Result<(Vec<PlanStep>, Vec<String>), String> {
        let payload = extract_json(reply).ok_or("reply contains no JSON object")?;
        let parsed: OraclePlan =
            serde_json::from_str(payload).map_err(|e| format!("reply is not a valid plan: {e}"))?;

        let mut steps = Vec::new();
        let mut warnings = Vec::new();

        for step in parsed.steps {
            match self.registry.get(&step.operation) {
                None => {
                    warn!(operation = %step.operation, "Discarding plan step: unknown operation");
                    warnings.push(format!(
                        "Discarded plan step '{}': not in the operation registry",
                        step.operation
                    ));
                }
                Some(op) => match op.validate_params(&step.parameters) {
                    Ok(()) => steps.push(step),
                    Err(reason) => {
                        warn!(operation = %step.operation, %reason, "Discarding plan step: invalid parameters");
                        warnings.push(format!(
                            "Discarded plan step '{}': {}",
                            step.operation, reason
                        ));
                    }
                },
            }
        }

        if steps.is_empty() {
            return Err("no valid steps survived validation".to_string());
        }

        Ok((steps, warnings))
    }
}

impl Planner for DelegatedPlanner {
    fn plan(&self, profile: &DatasetProfile) -> Result<Plan> {
        let prompt = self.build_prompt(profile)?;

        let reply = match self.oracle.complete(&prompt) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    oracle = self.oracle.name(),
                    error = %e,
                    "Planning oracle unavailable, falling back to rules"
                );
                let mut plan = self.fallback.plan(profile)?;
                plan.warnings
                    .push(format!("Planning oracle unavailable ({}), used rule-based plan", e));
                return Ok(plan);
            }
        };

        match self.parse_reply(&reply) {
            Ok((steps, warnings)) => {
                debug!(
                    steps = steps.len(),
                    discarded = warnings.len(),
                    model = self.oracle.model(),
                    "Oracle plan accepted"
                );
                let mut plan = Plan::new(steps, PlanSource::Oracle);
                plan.warnings = warnings;
                Ok(plan)
            }
            Err(reason) => {
                warn!(%reason, "Oracle plan unusable, falling back to rules");
                let mut plan = self.fallback.plan(profile)?;
                plan.warnings
                    .push(format!("Oracle plan unusable ({}), used rule-based plan", reason));
                Ok(plan)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SweepError;
    use crate::types::{ColumnKind, ColumnProfile};

    struct CannedOracle {
        reply: std::result::Result<String, String>,
    }

    impl Oracle for CannedOracle {
        fn name(&self) -> &str {
            "canned"
        }

        fn model(&self) -> &str {
            "test"
        }

        fn complete(&self, _prompt: &str) -> Result<String> {
            self.reply
                .clone()
                .map_err(SweepError::OracleError)
        }
    }

    fn planner_with(reply: std::result::Result<String, String>) -> DelegatedPlanner {
        DelegatedPlanner::new(
            Arc::new(CannedOracle { reply }),
            Arc::new(OperationRegistry::with_defaults()),
            AgentConfig::default(),
        )
    }

    fn messy_profile() -> DatasetProfile {
        DatasetProfile {
            rows: 10,
            columns: 2,
            column_profiles: vec![
                ColumnProfile {
                    name: "Age".to_string(),
                    kind: ColumnKind::Numeric,
                    missing_count: 2,
                    missing_fraction: 0.2,
                    distinct_count: 8,
                },
                ColumnProfile {
                    name: "city".to_string(),
                    kind: ColumnKind::Categorical,
                    missing_count: 0,
                    missing_fraction: 0.0,
                    distinct_count: 4,
                },
            ],
            duplicate_count: 1,
            total_missing: 2,
        }
    }

    #[test]
    fn test_valid_oracle_plan_is_used() {
        let reply = r#"```json
{"steps": [
  {"operation": "remove_duplicates", "parameters": {"keep": "first"}, "reason": "dupes"},
  {"operation": "handle_missing_values", "parameters": {"threshold": 0.5}, "reason": "gaps"}
]}
```"#;
        let plan = planner_with(Ok(reply.to_string()))
            .plan(&messy_profile())
            .unwrap();

        assert_eq!(plan.source, PlanSource::Oracle);
        assert_eq!(plan.steps.len(), 2);
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn test_unknown_operation_is_discarded_with_warning() {
        let reply = r#"{"steps": [
  {"operation": "delete_all_rows", "parameters": {}, "reason": "bad idea"},
  {"operation": "remove_duplicates", "parameters": {}, "reason": "dupes"}
]}"#;
        let plan = planner_with(Ok(reply.to_string()))
            .plan(&messy_profile())
            .unwrap();

        assert_eq!(plan.source, PlanSource::Oracle);
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].operation, "remove_duplicates");
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.warnings[0].contains("delete_all_rows"));
    }

    #[test]
    fn test_ill_typed_parameters_are_discarded() {
        let reply = r#"{"steps": [
  {"operation": "handle_missing_values", "parameters": {"threshold": "most"}, "reason": ""},
  {"operation": "detect_outliers", "parameters": {"contamination": 0.05}, "reason": ""}
]}"#;
        let plan = planner_with(Ok(reply.to_string()))
            .plan(&messy_profile())
            .unwrap();

        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].operation, "detect_outliers");
        assert_eq!(plan.warnings.len(), 1);
    }

    #[test]
    fn test_oracle_error_falls_back_to_rules() {
        let plan = planner_with(Err("connection refused".to_string()))
            .plan(&messy_profile())
            .unwrap();

        assert_eq!(plan.source, PlanSource::Rules);
        assert!(!plan.is_empty());
        assert!(plan.warnings.iter().any(|w| w.contains("unavailable")));
    }

    #[test]
    fn test_unparsable_reply_falls_back_to_rules() {
        let plan = planner_with(Ok("I think you should clean the data.".to_string()))
            .plan(&messy_profile())
            .unwrap();

        assert_eq!(plan.source, PlanSource::Rules);
        assert!(!plan.is_empty());
    }

    #[test]
    fn test_all_steps_invalid_falls_back_to_rules() {
        let reply = r#"{"steps": [{"operation": "nope", "parameters": {}, "reason": ""}]}"#;
        let plan = planner_with(Ok(reply.to_string()))
            .plan(&messy_profile())
            .unwrap();

        assert_eq!(plan.source, PlanSource::Rules);
    }

    #[test]
    fn test_prompt_contains_profile_and_operations() {
        let planner = planner_with(Ok(String::new()));
        let prompt = planner.build_prompt(&messy_profile()).unwrap();
        assert!(prompt.contains("\"Age\""));
        assert!(prompt.contains("remove_duplicates"));
        assert!(prompt.contains("\"steps\""));
    }
}
