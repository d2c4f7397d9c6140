//! Column name standardization.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use polars::prelude::DataFrame;
use regex::Regex;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::error::Result;
use crate::ops::CleaningOperation;
use crate::types::Outcome;

static SEPARATOR_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("Invalid regex: separator runs"));

/// Rewrites every column name to lower-case snake_case: non-alphanumeric
/// runs collapse to a single underscore, leading and trailing underscores
/// are trimmed. Collisions get a numeric suffix so output names stay
/// unique. Idempotent.
pub struct StandardizeColumnNames;

impl StandardizeColumnNames {
    /// Whether a name would change under standardization.
    pub(crate) fn needs_rename(name: &str) -> bool {
        Self::normalize(name) != name
    }

    /// Normalize a single name. May produce a collision or an empty string;
    /// [`Self::unique_names`] resolves both.
    fn normalize(name: &str) -> String {
        let lower = name.to_lowercase();
        let collapsed = SEPARATOR_RUNS.replace_all(&lower, "_");
        collapsed.trim_matches('_').to_string()
    }

    /// Normalize all names, disambiguating collisions with numeric suffixes
    /// (`_2`, `_3`, ...) in column order.
    fn unique_names(names: &[String]) -> Vec<String> {
        let mut used: HashSet<String> = HashSet::new();
        let mut result = Vec::with_capacity(names.len());

        for name in names {
            let mut base = Self::normalize(name);
            if base.is_empty() {
                base = "column".to_string();
            }

            let mut candidate = base.clone();
            let mut suffix = 2;
            while used.contains(&candidate) {
                candidate = format!("{}_{}", base, suffix);
                suffix += 1;
            }

            used.insert(candidate.clone());
            result.push(candidate);
        }

        result
    }
}

impl CleaningOperation for StandardizeColumnNames {
    fn name(&self) -> &'static str {
        "standardize_column_names"
    }

    fn description(&self) -> &'static str {
        "Rename columns to lower-case snake_case, keeping names unique"
    }

    fn execute(&self, df: &DataFrame, _params: &Map<String, Value>) -> Result<Outcome> {
        let old_names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();

        if old_names.is_empty() {
            return Ok(Outcome::success(df.clone(), "No columns to rename"));
        }

        let new_names = Self::unique_names(&old_names);

        if new_names == old_names {
            debug!("Column names already standardized");
            return Ok(Outcome::success(
                df.clone(),
                "Column names already standardized",
            ));
        }

        let mut renamed: Map<String, Value> = Map::new();
        for (old, new) in old_names.iter().zip(new_names.iter()) {
            if old != new {
                renamed.insert(old.clone(), json!(new));
            }
        }

        let mut result = df.clone();
        result.set_column_names(new_names.iter().map(String::as_str))?;

        let message = format!("Standardized {} column names", renamed.len());
        info!("{}", message);

        Ok(Outcome::success(result, message).with_metadata("renamed", Value::Object(renamed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn names_of(df: &DataFrame) -> Vec<String> {
        df.get_column_names().iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_normalize_basics() {
        assert_eq!(StandardizeColumnNames::normalize("User ID"), "user_id");
        assert_eq!(StandardizeColumnNames::normalize("  First--Name  "), "first_name");
        assert_eq!(StandardizeColumnNames::normalize("Total ($)"), "total");
        assert_eq!(StandardizeColumnNames::normalize("already_fine"), "already_fine");
    }

    #[test]
    fn test_collision_gets_numeric_suffix() {
        let names = vec!["User ID".to_string(), "user id".to_string(), "USER_ID".to_string()];
        let unique = StandardizeColumnNames::unique_names(&names);
        assert_eq!(unique, vec!["user_id", "user_id_2", "user_id_3"]);
    }

    #[test]
    fn test_empty_name_becomes_column() {
        let names = vec!["***".to_string(), "%%%".to_string()];
        let unique = StandardizeColumnNames::unique_names(&names);
        assert_eq!(unique, vec!["column", "column_2"]);
    }

    #[test]
    fn test_execute_renames_columns() {
        let df = df![
            "User ID" => [1, 2],
            "First Name" => ["a", "b"],
        ]
        .unwrap();

        let outcome = StandardizeColumnNames.execute(&df, &Map::new()).unwrap();
        assert!(outcome.success);
        assert_eq!(names_of(&outcome.dataset), vec!["user_id", "first_name"]);
        // input untouched
        assert_eq!(names_of(&df), vec!["User ID", "First Name"]);
    }

    #[test]
    fn test_execute_is_idempotent() {
        let df = df![
            "User ID" => [1, 2],
            "user-id" => ["a", "b"],
        ]
        .unwrap();

        let once = StandardizeColumnNames.execute(&df, &Map::new()).unwrap();
        let twice = StandardizeColumnNames
            .execute(&once.dataset, &Map::new())
            .unwrap();

        assert_eq!(names_of(&once.dataset), names_of(&twice.dataset));
        assert!(twice.success);
        assert_eq!(twice.message, "Column names already standardized");
    }

    #[test]
    fn test_execute_no_op_reports_success() {
        let df = df!["clean" => [1]].unwrap();
        let outcome = StandardizeColumnNames.execute(&df, &Map::new()).unwrap();
        assert!(outcome.success);
        assert!(!outcome.metadata.contains_key("renamed"));
    }
}
