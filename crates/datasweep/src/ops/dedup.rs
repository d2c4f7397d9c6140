//! Duplicate row removal.

use polars::prelude::*;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::error::Result;
use crate::ops::{CleaningOperation, param_str, param_str_list};
use crate::types::Outcome;

/// Removes rows that duplicate an earlier (or later) row exactly, across all
/// columns or a caller-specified subset. Keeps one occurrence per duplicate
/// group; row order is preserved. Idempotent after the first application.
///
/// Parameters:
/// - `keep`: `"first"` (default) or `"last"`
/// - `subset`: list of column names to compare on (default: all columns)
pub struct RemoveDuplicates;

impl RemoveDuplicates {
    fn keep_strategy(params: &Map<String, Value>) -> std::result::Result<UniqueKeepStrategy, String> {
        match param_str(params, "keep") {
            None | Some("first") => Ok(UniqueKeepStrategy::First),
            Some("last") => Ok(UniqueKeepStrategy::Last),
            Some(other) => Err(format!(
                "parameter 'keep' must be \"first\" or \"last\", got \"{}\"",
                other
            )),
        }
    }
}

impl CleaningOperation for RemoveDuplicates {
    fn name(&self) -> &'static str {
        "remove_duplicates"
    }

    fn description(&self) -> &'static str {
        "Remove exact duplicate rows, keeping the first (or last) occurrence"
    }

    fn validate_params(&self, params: &Map<String, Value>) -> std::result::Result<(), String> {
        Self::keep_strategy(params)?;
        if let Some(value) = params.get("subset") {
            let is_string_array = value
                .as_array()
                .is_some_and(|arr| arr.iter().all(Value::is_string));
            if !is_string_array {
                return Err("parameter 'subset' must be an array of column names".to_string());
            }
        }
        Ok(())
    }

    fn execute(&self, df: &DataFrame, params: &Map<String, Value>) -> Result<Outcome> {
        let keep = match Self::keep_strategy(params) {
            Ok(keep) => keep,
            Err(reason) => return Ok(Outcome::skipped(df.clone(), reason)),
        };

        let subset = param_str_list(params, "subset").filter(|cols| !cols.is_empty());

        if let Some(cols) = &subset {
            for col in cols {
                if df.column(col).is_err() {
                    return Ok(Outcome::skipped(
                        df.clone(),
                        format!("Subset column '{}' not found in dataset", col),
                    ));
                }
            }
        }

        let before = df.height();
        let deduped = match &subset {
            Some(cols) => df.unique_stable(Some(cols.as_slice()), keep, None)?,
            None => df.unique_stable(None, keep, None)?,
        };
        let removed = before - deduped.height();

        if removed == 0 {
            debug!("No duplicate rows found");
            return Ok(Outcome::success(deduped, "No duplicate rows found")
                .with_metadata("removed", 0));
        }

        let pct = (removed as f64 / before as f64) * 100.0;
        let message = format!("Removed {} duplicate rows ({:.1}%)", removed, pct);
        info!("{}", message);

        Ok(Outcome::success(deduped, message)
            .with_metadata("removed", removed)
            .with_metadata("subset", subset.map(|s| json!(s)).unwrap_or(Value::Null)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn df_with_duplicates() -> DataFrame {
        df![
            "a" => [1, 2, 1, 3, 1],
            "b" => ["x", "y", "x", "z", "x"],
        ]
        .unwrap()
    }

    #[test]
    fn test_removes_exact_duplicates() {
        let df = df_with_duplicates();
        let outcome = RemoveDuplicates.execute(&df, &Map::new()).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.dataset.height(), 3);
        assert_eq!(outcome.metadata.get("removed").unwrap(), 2);
        // input untouched
        assert_eq!(df.height(), 5);
    }

    #[test]
    fn test_idempotent_second_pass_removes_nothing() {
        let df = df_with_duplicates();
        let once = RemoveDuplicates.execute(&df, &Map::new()).unwrap();
        let twice = RemoveDuplicates.execute(&once.dataset, &Map::new()).unwrap();
        assert!(twice.success);
        assert_eq!(twice.dataset.height(), once.dataset.height());
        assert_eq!(twice.metadata.get("removed").unwrap(), 0);
        assert_eq!(twice.message, "No duplicate rows found");
    }

    #[test]
    fn test_keep_first_preserves_order() {
        let df = df_with_duplicates();
        let outcome = RemoveDuplicates.execute(&df, &Map::new()).unwrap();
        let a = outcome.dataset.column("a").unwrap();
        let vals: Vec<i32> = a.i32().unwrap().into_no_null_iter().collect();
        assert_eq!(vals, vec![1, 2, 3]);
    }

    #[test]
    fn test_subset_deduplication() {
        let df = df![
            "a" => [1, 1, 2],
            "b" => ["x", "y", "z"],
        ]
        .unwrap();
        let params: Map<String, Value> =
            serde_json::from_str(r#"{"subset": ["a"]}"#).unwrap();
        let outcome = RemoveDuplicates.execute(&df, &params).unwrap();
        assert_eq!(outcome.dataset.height(), 2);
    }

    #[test]
    fn test_missing_subset_column_is_skipped_not_error() {
        let df = df!["a" => [1, 2]].unwrap();
        let params: Map<String, Value> =
            serde_json::from_str(r#"{"subset": ["nope"]}"#).unwrap();
        let outcome = RemoveDuplicates.execute(&df, &params).unwrap();
        assert!(!outcome.success);
        assert!(outcome.message.contains("nope"));
        assert_eq!(outcome.dataset.height(), 2);
    }

    #[test]
    fn test_validate_params() {
        let ok: Map<String, Value> = serde_json::from_str(r#"{"keep": "last"}"#).unwrap();
        assert!(RemoveDuplicates.validate_params(&ok).is_ok());

        let bad_keep: Map<String, Value> = serde_json::from_str(r#"{"keep": "middle"}"#).unwrap();
        assert!(RemoveDuplicates.validate_params(&bad_keep).is_err());

        let bad_subset: Map<String, Value> = serde_json::from_str(r#"{"subset": [1, 2]}"#).unwrap();
        assert!(RemoveDuplicates.validate_params(&bad_subset).is_err());
    }
}
