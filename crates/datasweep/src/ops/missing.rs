//! Missing value handling.

use polars::prelude::*;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::imputers::KnnImputer;
use crate::ops::{CleaningOperation, param_f64, param_usize};
use crate::types::Outcome;
use crate::utils;

const DEFAULT_THRESHOLD: f64 = 0.5;
const DEFAULT_NEIGHBORS: usize = 5;

/// Drops columns that are mostly missing and imputes the rest: KNN over the
/// other numeric columns for numeric cells, most frequent value for
/// categorical cells. Entirely missing columns are always dropped, never
/// imputed.
///
/// Parameters:
/// - `threshold`: missing fraction at or above which a column is dropped
///   (default 0.5)
/// - `n_neighbors`: neighbor count for KNN imputation (default 5)
pub struct HandleMissingValues;

impl HandleMissingValues {
    fn threshold(params: &Map<String, Value>) -> f64 {
        param_f64(params, "threshold").unwrap_or(DEFAULT_THRESHOLD)
    }

    fn neighbors(params: &Map<String, Value>) -> usize {
        param_usize(params, "n_neighbors").unwrap_or(DEFAULT_NEIGHBORS)
    }
}

impl CleaningOperation for HandleMissingValues {
    fn name(&self) -> &'static str {
        "handle_missing_values"
    }

    fn description(&self) -> &'static str {
        "Drop mostly-missing columns, then impute numeric cells via KNN and categorical cells via mode"
    }

    fn validate_params(&self, params: &Map<String, Value>) -> std::result::Result<(), String> {
        if let Some(value) = params.get("threshold") {
            let ok = value.as_f64().is_some_and(|t| t > 0.0 && t < 1.0);
            if !ok {
                return Err(format!(
                    "parameter 'threshold' must be a number in (0, 1), got {}",
                    value
                ));
            }
        }
        if let Some(value) = params.get("n_neighbors") {
            let ok = value.as_u64().is_some_and(|k| k >= 1);
            if !ok {
                return Err(format!(
                    "parameter 'n_neighbors' must be a positive integer, got {}",
                    value
                ));
            }
        }
        Ok(())
    }

    fn execute(&self, df: &DataFrame, params: &Map<String, Value>) -> Result<Outcome> {
        if utils::total_missing(df) == 0 {
            debug!("No missing values found");
            return Ok(Outcome::success(df.clone(), "No missing values found")
                .with_metadata("imputed_cells", 0));
        }

        let threshold = Self::threshold(params);
        let n_neighbors = Self::neighbors(params);
        let rows = df.height();

        // Columns at or above the threshold are dropped rather than imputed.
        // All-missing columns are dropped unconditionally.
        let mut dropped: Vec<String> = Vec::new();
        for col in df.get_columns() {
            let missing = col.as_materialized_series().null_count();
            let fraction = if rows > 0 {
                missing as f64 / rows as f64
            } else {
                0.0
            };
            if missing == rows || fraction >= threshold {
                dropped.push(col.name().to_string());
            }
        }

        let mut working = if dropped.is_empty() {
            df.clone()
        } else {
            let names: Vec<PlSmallStr> = dropped.iter().map(|s| s.as_str().into()).collect();
            warn!(columns = ?dropped, "Dropping mostly-missing columns");
            df.drop_many(names)
        };

        let mut imputed_cells = 0usize;
        let mut mean_fallbacks: Vec<String> = Vec::new();
        let mut imputed_numeric: Vec<String> = Vec::new();
        let mut imputed_categorical: Vec<String> = Vec::new();

        let column_names: Vec<String> = working
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();

        for name in &column_names {
            let series = working.column(name)?.as_materialized_series().clone();
            let missing = series.null_count();
            if missing == 0 {
                continue;
            }

            if utils::is_numeric_dtype(series.dtype()) {
                let donors = KnnImputer::donor_count(&working, name)?;
                let filled = if donors < n_neighbors {
                    // Too few complete rows for a meaningful neighborhood.
                    let mean = utils::numeric_mean(&series).ok_or_else(|| {
                        crate::error::SweepError::NoValidValues(name.clone())
                    })?;
                    mean_fallbacks.push(name.clone());
                    debug!(column = %name, donors, n_neighbors, "Falling back to mean imputation");
                    utils::fill_numeric_nulls(&series, mean)?
                } else {
                    KnnImputer::new(n_neighbors).impute_column(&working, name)?
                };
                working.replace(name, filled)?;
                imputed_numeric.push(name.clone());
            } else {
                let mode = utils::string_mode(&series).unwrap_or_else(|| "Unknown".to_string());
                let filled = utils::fill_string_nulls(&series, &mode)?;
                working.replace(name, filled)?;
                imputed_categorical.push(name.clone());
            }
            imputed_cells += missing;
        }

        let mut parts: Vec<String> = Vec::new();
        if !dropped.is_empty() {
            parts.push(format!(
                "dropped {} mostly-missing columns: {:?}",
                dropped.len(),
                dropped
            ));
        }
        if imputed_cells > 0 {
            parts.push(format!(
                "imputed {} cells ({} numeric, {} categorical columns)",
                imputed_cells,
                imputed_numeric.len(),
                imputed_categorical.len()
            ));
        }
        if !mean_fallbacks.is_empty() {
            parts.push(format!(
                "mean fallback for {:?} (fewer complete rows than {} neighbors)",
                mean_fallbacks, n_neighbors
            ));
        }

        let message = format!("Handled missing values: {}", parts.join("; "));
        info!("{}", message);

        Ok(Outcome::success(working, message)
            .with_metadata("dropped_columns", json!(dropped))
            .with_metadata("imputed_cells", imputed_cells)
            .with_metadata("imputed_numeric", json!(imputed_numeric))
            .with_metadata("imputed_categorical", json!(imputed_categorical))
            .with_metadata("mean_fallback_columns", json!(mean_fallbacks)))
    }
}
