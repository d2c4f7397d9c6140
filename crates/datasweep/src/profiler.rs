//! Dataset inspection.
//!
//! The profiler takes a snapshot of a dataset: shape, per-column missingness,
//! duplicate-row count, and an inferred kind per column. Profiles drive the
//! planner's decision table and the validator's scoring. A profile is always
//! regenerated from scratch; it is never updated in place.

use polars::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::types::{ColumnKind, ColumnProfile, DatasetProfile};
use crate::utils;

/// Inspects datasets and produces [`DatasetProfile`]s.
pub struct DataProfiler;

impl DataProfiler {
    /// Profile a dataset.
    ///
    /// Deterministic and O(rows x columns). An empty dataset yields a
    /// zero-shape profile rather than an error.
    pub fn profile(df: &DataFrame) -> Result<DatasetProfile> {
        if df.width() == 0 || df.height() == 0 {
            debug!("Profiling empty dataset");
            return Ok(DatasetProfile::empty());
        }

        let rows = df.height();
        let mut column_profiles = Vec::with_capacity(df.width());
        let mut total_missing = 0;

        for col in df.get_columns() {
            let series = col.as_materialized_series();
            let name = series.name().to_string();
            let missing_count = series.null_count();
            let missing_fraction = missing_count as f64 / rows as f64;
            let distinct_count = series.drop_nulls().n_unique()?;
            let kind = Self::infer_kind(&name, series, distinct_count);

            total_missing += missing_count;
            column_profiles.push(ColumnProfile {
                name,
                kind,
                missing_count,
                missing_fraction,
                distinct_count,
            });
        }

        let duplicate_count = utils::duplicate_row_count(df)?;

        debug!(
            rows,
            columns = df.width(),
            duplicate_count,
            total_missing,
            "Profiled dataset"
        );

        Ok(DatasetProfile {
            rows,
            columns: df.width(),
            column_profiles,
            duplicate_count,
            total_missing,
        })
    }

    /// Infer the kind of a column from its name, dtype and cardinality.
    ///
    /// A column counts as an identifier when its name looks like an id and
    /// every non-null value is distinct.
    fn infer_kind(name: &str, series: &Series, distinct_count: usize) -> ColumnKind {
        let non_null = series.len() - series.null_count();
        if Self::looks_like_identifier_name(name) && non_null > 0 && distinct_count == non_null {
            return ColumnKind::Identifier;
        }

        if utils::is_numeric_dtype(series.dtype()) {
            ColumnKind::Numeric
        } else {
            ColumnKind::Categorical
        }
    }

    fn looks_like_identifier_name(name: &str) -> bool {
        let lower = name.trim().to_ascii_lowercase();
        let normalized: String = lower
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        normalized == "id"
            || normalized.ends_with("_id")
            || normalized.starts_with("id_")
            || normalized.ends_with("id") && normalized.len() <= 6
    }
}
