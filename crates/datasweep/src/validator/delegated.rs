//! Oracle-delegated quality assessment with failover.

use std::sync::Arc;

use polars::prelude::DataFrame;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::oracle::{Oracle, extract_json};
use crate::types::{DatasetSummary, ExecutionRecord, QualityAssessment};
use crate::validator::{RuleBasedValidator, Validator};

#[derive(Debug, Deserialize)]
struct OracleAssessment {
    score: i64,
    #[serde(default)]
    feedback: String,
    #[serde(default)]
    suggestions: Vec<String>,
}

/// Asks an external oracle to grade the cleaning run. The returned score is
/// clamped into [1, 10] whatever the oracle says; an unreachable oracle or
/// unusable reply fails over to [`RuleBasedValidator`].
pub struct DelegatedValidator {
    oracle: Arc<dyn Oracle>,
    fallback: RuleBasedValidator,
}

impl DelegatedValidator {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self {
            oracle,
            fallback: RuleBasedValidator::new(),
        }
    }

    fn build_prompt(
        before: &DatasetSummary,
        after: &DatasetSummary,
        records: &[ExecutionRecord],
    ) -> Result<String> {
        let actions: Vec<String> = records
            .iter()
            .map(|r| format!("{}. [{}] {}", r.iteration, r.operation, r.message))
            .collect();

        Ok(format!(
            "You are a data quality reviewer. A dataset was cleaned; grade the result.\n\n\
            BEFORE:\n{}\n\n\
            AFTER:\n{}\n\n\
            ACTIONS TAKEN:\n{}\n\n\
            Reply with ONLY a JSON object of this exact shape:\n\
            {{\"score\": <integer 1-10>, \"feedback\": \"<one paragraph>\", \
            \"suggestions\": [\"<improvement>\"]}}\n\n\
            Do not add any other text.",
            serde_json::to_string_pretty(before)?,
            serde_json::to_string_pretty(after)?,
            actions.join("\n")
        ))
    }

    fn parse_reply(reply: &str) -> std::result::Result<QualityAssessment, String> {
        let payload = extract_json(reply).ok_or("reply contains no JSON object")?;
        let parsed: OracleAssessment = serde_json::from_str(payload)
            .map_err(|e| format!("reply is not a valid assessment: {e}"))?;

        Ok(QualityAssessment {
            score: QualityAssessment::clamp_score(parsed.score),
            feedback: parsed.feedback,
            suggestions: parsed.suggestions,
        })
    }
}

impl Validator for DelegatedValidator {
    fn validate(
        &self,
        original: &DataFrame,
        cleaned: &DataFrame,
        records: &[ExecutionRecord],
    ) -> Result<QualityAssessment> {
        let before = DatasetSummary::from_frame(original)?;
        let after = DatasetSummary::from_frame(cleaned)?;
        let prompt = Self::build_prompt(&before, &after, records)?;

        let reply = match self.oracle.complete(&prompt) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    oracle = self.oracle.name(),
                    error = %e,
                    "Scoring oracle unavailable, falling back to rules"
                );
                return self.fallback.validate(original, cleaned, records);
            }
        };

        match Self::parse_reply(&reply) {
            Ok(assessment) => {
                debug!(
                    score = assessment.score,
                    model = self.oracle.model(),
                    "Oracle assessment accepted"
                );
                Ok(assessment)
            }
            Err(reason) => {
                warn!(%reason, "Oracle assessment unusable, falling back to rules");
                self.fallback.validate(original, cleaned, records)
            }
        }
    }
}
