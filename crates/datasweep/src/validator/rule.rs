//! Deterministic quality scoring.

use polars::prelude::DataFrame;
use tracing::debug;

use crate::error::Result;
use crate::types::{DatasetSummary, ExecutionRecord, QualityAssessment};
use crate::validator::Validator;

/// Penalty weights for the rule-based scorer.
///
/// The score starts at 10 and each residual defect subtracts from it.
#[derive(Debug, Clone)]
pub struct ScoringWeights {
    /// Multiplier on the residual missing-cell fraction.
    pub missing_scale: f64,
    /// Upper bound on the missing-cell penalty.
    pub missing_cap: f64,
    /// Flat penalty when any duplicate rows remain.
    pub duplicate_penalty: f64,
    /// Penalty per constant (single-valued) column.
    pub constant_column_penalty: f64,
    /// Upper bound on the constant-column penalty.
    pub constant_column_cap: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            missing_scale: 20.0,
            missing_cap: 5.0,
            duplicate_penalty: 2.0,
            constant_column_penalty: 1.0,
            constant_column_cap: 2.0,
        }
    }
}

/// Scores the cleaned dataset by what is still wrong with it: residual
/// missing cells, residual duplicates, and columns left with a single
/// value. Steps that could not proceed surface as suggestions, not
/// penalties, since the data itself is what gets scored.
pub struct RuleBasedValidator {
    weights: ScoringWeights,
}

impl RuleBasedValidator {
    pub fn new() -> Self {
        Self::with_weights(ScoringWeights::default())
    }

    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Names of columns with at most one distinct value. Only meaningful
    /// for datasets with more than one row.
    fn constant_columns(df: &DataFrame) -> Result<Vec<String>> {
        if df.height() < 2 {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for col in df.get_columns() {
            if col.as_materialized_series().n_unique()? <= 1 {
                names.push(col.name().to_string());
            }
        }
        Ok(names)
    }
}

impl Default for RuleBasedValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for RuleBasedValidator {
    fn validate(
        &self,
        original: &DataFrame,
        cleaned: &DataFrame,
        records: &[ExecutionRecord],
    ) -> Result<QualityAssessment> {
        let before = DatasetSummary::from_frame(original)?;
        let after = DatasetSummary::from_frame(cleaned)?;
        let constant = Self::constant_columns(cleaned)?;

        let cells = (after.rows * after.columns).max(1);
        let missing_fraction = after.missing_cells as f64 / cells as f64;

        let mut penalty = (missing_fraction * self.weights.missing_scale).min(self.weights.missing_cap);
        if after.duplicate_rows > 0 {
            penalty += self.weights.duplicate_penalty;
        }
        penalty += (constant.len() as f64 * self.weights.constant_column_penalty)
            .min(self.weights.constant_column_cap);

        let score = QualityAssessment::clamp_score((10.0 - penalty).round() as i64);

        let mut issues = Vec::new();
        if after.missing_cells > 0 {
            issues.push(format!("{} missing cells remain", after.missing_cells));
        }
        if after.duplicate_rows > 0 {
            issues.push(format!("{} duplicate rows remain", after.duplicate_rows));
        }
        if !constant.is_empty() {
            issues.push(format!(
                "{} columns hold a single value ({})",
                constant.len(),
                constant.join(", ")
            ));
        }

        let feedback = if issues.is_empty() {
            format!(
                "Dataset is clean: {} rows and {} columns, no missing cells or duplicate rows \
                (was {} missing and {} duplicates)",
                after.rows, after.columns, before.missing_cells, before.duplicate_rows
            )
        } else {
            format!("Residual issues after cleaning: {}", issues.join("; "))
        };

        let mut suggestions = Vec::new();
        if after.missing_cells > 0 {
            suggestions.push(
                "Re-run handle_missing_values with a lower threshold to address remaining gaps"
                    .to_string(),
            );
        }
        if after.duplicate_rows > 0 {
            suggestions.push("Re-run remove_duplicates on the cleaned dataset".to_string());
        }
        for name in &constant {
            suggestions.push(format!(
                "Column '{}' carries no information and could be dropped",
                name
            ));
        }
        for record in records.iter().filter(|r| !r.success) {
            suggestions.push(format!(
                "Step '{}' could not proceed: {}",
                record.operation, record.message
            ));
        }

        debug!(score, penalty, "Rule-based assessment complete");

        Ok(QualityAssessment {
            score,
            feedback,
            suggestions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use serde_json::Map;

    fn validator() -> RuleBasedValidator {
        RuleBasedValidator::new()
    }

    #[test]
    fn test_clean_dataset_scores_ten() {
        let original = df![
            "age" => [Some(25), None, Some(30), Some(25)],
            "city" => ["NY", "LA", "SF", "NY"],
        ]
        .unwrap();
        let cleaned = df![
            "age" => [25, 28, 30],
            "city" => ["NY", "LA", "SF"],
        ]
        .unwrap();

        let assessment = validator().validate(&original, &cleaned, &[]).unwrap();
        assert_eq!(assessment.score, 10);
        assert!(assessment.feedback.contains("clean"));
        assert!(assessment.suggestions.is_empty());
    }

    #[test]
    fn test_residual_missing_lowers_score() {
        let original = df!["age" => [Some(1), None, None, None, Some(5)]].unwrap();
        let cleaned = original.clone();

        let assessment = validator().validate(&original, &cleaned, &[]).unwrap();
        assert!(assessment.score < 10);
        assert!(assessment.feedback.contains("missing cells remain"));
        assert!(
            assessment
                .suggestions
                .iter()
                .any(|s| s.contains("handle_missing_values"))
        );
    }

    #[test]
    fn test_residual_duplicates_lower_score() {
        let original = df!["a" => [1, 1, 2]].unwrap();
        let cleaned = original.clone();

        let assessment = validator().validate(&original, &cleaned, &[]).unwrap();
        assert_eq!(assessment.score, 8);
        assert!(assessment.feedback.contains("duplicate rows remain"));
    }

    #[test]
    fn test_constant_column_is_flagged() {
        let original = df![
            "a" => [1, 2, 3],
            "status" => ["ok", "ok", "ok"],
        ]
        .unwrap();

        let assessment = validator().validate(&original, &original, &[]).unwrap();
        assert_eq!(assessment.score, 9);
        assert!(
            assessment
                .suggestions
                .iter()
                .any(|s| s.contains("'status'"))
        );
    }

    #[test]
    fn test_failed_steps_surface_as_suggestions() {
        let df = df!["a" => ["x", "y", "z"]].unwrap();
        let records = vec![ExecutionRecord::new(
            1,
            "detect_outliers",
            false,
            "No numeric columns for outlier detection",
            Map::new(),
        )];

        let assessment = validator().validate(&df, &df, &records).unwrap();
        assert!(
            assessment
                .suggestions
                .iter()
                .any(|s| s.contains("detect_outliers"))
        );
    }

    #[test]
    fn test_score_never_drops_below_one() {
        let weights = ScoringWeights {
            missing_scale: 100.0,
            missing_cap: 100.0,
            duplicate_penalty: 5.0,
            ..ScoringWeights::default()
        };
        let original = df!["a" => [Some(1), None, None, Some(1)]].unwrap();

        let assessment = RuleBasedValidator::with_weights(weights)
            .validate(&original, &original, &[])
            .unwrap();
        assert_eq!(assessment.score, 1);
    }

    #[test]
    fn test_single_row_dataset_has_no_constant_columns() {
        let df = df!["a" => [1], "b" => ["x"]].unwrap();
        let assessment = validator().validate(&df, &df, &[]).unwrap();
        assert_eq!(assessment.score, 10);
    }
}
