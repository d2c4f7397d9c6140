//! Inspection as a registry operation.

use polars::prelude::DataFrame;
use serde_json::{Map, Value};
use tracing::info;

use crate::error::Result;
use crate::ops::CleaningOperation;
use crate::profiler::DataProfiler;
use crate::types::Outcome;

/// Profiles the dataset and passes it through unchanged. The profile lands
/// in the outcome metadata under `"profile"`.
pub struct InspectData;

impl CleaningOperation for InspectData {
    fn name(&self) -> &'static str {
        "inspect"
    }

    fn description(&self) -> &'static str {
        "Profile the dataset: shape, per-column missing counts, duplicate rows, column kinds"
    }

    fn execute(&self, df: &DataFrame, _params: &Map<String, Value>) -> Result<Outcome> {
        let profile = DataProfiler::profile(df)?;

        let message = format!(
            "Inspected dataset: {} rows x {} columns, {} missing cells, {} duplicate rows",
            profile.rows, profile.columns, profile.total_missing, profile.duplicate_count
        );
        info!("{}", message);

        let mut outcome = Outcome::success(df.clone(), message)
            .with_metadata("profile", serde_json::to_value(&profile)?);

        if profile.is_empty() {
            outcome = outcome.with_metadata("warning", "dataset is empty");
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_inspect_passes_dataset_through() {
        let df = df!["a" => [1, 2, 3]].unwrap();
        let outcome = InspectData.execute(&df, &Map::new()).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.dataset.shape(), (3, 1));
        assert!(outcome.metadata.contains_key("profile"));
        assert!(!outcome.metadata.contains_key("warning"));
    }

    #[test]
    fn test_inspect_empty_dataset_warns_in_metadata() {
        let outcome = InspectData.execute(&DataFrame::empty(), &Map::new()).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.metadata.get("warning").unwrap(), "dataset is empty");
    }

    #[test]
    fn test_inspect_profile_metadata_shape() {
        let df = df![
            "a" => [Some(1), None],
            "b" => ["x", "x"],
        ]
        .unwrap();
        let outcome = InspectData.execute(&df, &Map::new()).unwrap();
        let profile = outcome.metadata.get("profile").unwrap();
        assert_eq!(profile["rows"], 2);
        assert_eq!(profile["total_missing"], 1);
    }
}
