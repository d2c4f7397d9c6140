//! Final report assembly.
//!
//! The report is built exactly once per run, after validation. Action
//! messages are taken verbatim from the execution records so the report
//! never re-narrates what happened.

use polars::prelude::DataFrame;

use crate::error::Result;
use crate::types::{CleaningReport, DatasetSummary, ExecutionRecord, QualityAssessment};

/// Assemble the final report from the run's artifacts.
pub fn build_report(
    original: &DataFrame,
    cleaned: &DataFrame,
    records: &[ExecutionRecord],
    assessment: &QualityAssessment,
    warnings: Vec<String>,
) -> Result<CleaningReport> {
    let before = DatasetSummary::from_frame(original)?;
    let after = DatasetSummary::from_frame(cleaned)?;

    let actions = records.iter().map(|r| r.message.clone()).collect();

    Ok(CleaningReport {
        quality_score: assessment.score,
        feedback: assessment.feedback.clone(),
        actions,
        before,
        after,
        suggestions: assessment.suggestions.clone(),
        warnings,
        iterations: records.len(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Render a report as human-readable text for terminal output.
pub fn render_text(report: &CleaningReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("Quality score: {}/10\n", report.quality_score));
    out.push_str(&format!("Feedback: {}\n\n", report.feedback));

    out.push_str(&format!(
        "Before: {} rows x {} cols, {} missing, {} duplicates\n",
        report.before.rows, report.before.columns, report.before.missing_cells, report.before.duplicate_rows
    ));
    out.push_str(&format!(
        "After:  {} rows x {} cols, {} missing, {} duplicates\n",
        report.after.rows, report.after.columns, report.after.missing_cells, report.after.duplicate_rows
    ));

    if !report.actions.is_empty() {
        out.push_str("\nActions:\n");
        for (i, action) in report.actions.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, action));
        }
    }

    if !report.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for warning in &report.warnings {
            out.push_str(&format!("  - {}\n", warning));
        }
    }

    if !report.suggestions.is_empty() {
        out.push_str("\nSuggestions:\n");
        for suggestion in &report.suggestions {
            out.push_str(&format!("  - {}\n", suggestion));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use serde_json::Map;

    fn sample_report() -> CleaningReport {
        let original = df!["age" => [Some(25), None, Some(25)]].unwrap();
        let cleaned = df!["age" => [25, 26]].unwrap();
        let records = vec![
            ExecutionRecord::new(1, "remove_duplicates", true, "Removed 1 duplicate row", Map::new()),
            ExecutionRecord::new(2, "handle_missing_values", true, "Imputed 1 missing cell", Map::new()),
        ];
        let assessment = QualityAssessment {
            score: 9,
            feedback: "Nearly clean".to_string(),
            suggestions: vec!["Verify dtypes".to_string()],
        };

        build_report(
            &original,
            &cleaned,
            &records,
            &assessment,
            vec!["Discarded plan step 'nope'".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn test_report_carries_actions_verbatim() {
        let report = sample_report();
        assert_eq!(report.iterations, 2);
        assert_eq!(report.actions[0], "Removed 1 duplicate row");
        assert_eq!(report.actions[1], "Imputed 1 missing cell");
    }

    #[test]
    fn test_report_before_after_summaries() {
        let report = sample_report();
        assert_eq!(report.before.rows, 3);
        assert_eq!(report.before.missing_cells, 1);
        assert_eq!(report.before.duplicate_rows, 1);
        assert_eq!(report.after.rows, 2);
        assert_eq!(report.after.missing_cells, 0);
        assert_eq!(report.after.duplicate_rows, 0);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = sample_report();
        let json = serde_json::to_string_pretty(&report).unwrap();
        assert!(json.contains("\"quality_score\": 9"));
        assert!(json.contains("Removed 1 duplicate row"));
    }

    #[test]
    fn test_render_text_sections() {
        let text = render_text(&sample_report());
        assert!(text.contains("Quality score: 9/10"));
        assert!(text.contains("Actions:"));
        assert!(text.contains("Warnings:"));
        assert!(text.contains("Suggestions:"));
    }
}
