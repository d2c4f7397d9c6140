//! Shared utilities for the cleaning agent.
//!
//! This module contains common helper functions used across multiple modules
//! to reduce code duplication and ensure consistency.

use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is string-like.
#[inline]
pub fn is_string_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String | DataType::Categorical(_, _))
}

// =============================================================================
// Dataset Statistics Utilities
// =============================================================================

/// Total number of missing cells across all columns.
pub fn total_missing(df: &DataFrame) -> usize {
    df.get_columns()
        .iter()
        .map(|col| col.as_materialized_series().null_count())
        .sum()
}

/// Number of rows that are exact duplicates of an earlier row
/// (whole-row identity).
pub fn duplicate_row_count(df: &DataFrame) -> PolarsResult<usize> {
    if df.height() == 0 {
        return Ok(0);
    }
    let deduped = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
    Ok(df.height() - deduped.height())
}

/// Calculate the mode (most frequent value) of a string Series.
///
/// Ties are broken by the first-encountered value so the result is
/// deterministic for a given row order.
pub fn string_mode(series: &Series) -> Option<String> {
    let non_null = series.drop_nulls();
    if non_null.is_empty() {
        return None;
    }

    let str_series = non_null.cast(&DataType::String).ok()?;
    let str_chunked = str_series.str().ok()?;

    let mut counts: std::collections::HashMap<&str, (usize, usize)> =
        std::collections::HashMap::new();
    for (idx, val) in str_chunked.into_iter().flatten().enumerate() {
        let entry = counts.entry(val).or_insert((0, idx));
        entry.0 += 1;
    }

    counts
        .into_iter()
        .min_by_key(|(_, (count, first_idx))| (std::cmp::Reverse(*count), *first_idx))
        .map(|(val, _)| val.to_string())
}

/// Mean of the non-null values of a numeric Series.
pub fn numeric_mean(series: &Series) -> Option<f64> {
    series.cast(&DataType::Float64).ok()?.mean()
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a numeric Series with a specific value.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let mask = series.is_null();
    let len = series.len();
    let mut result_vec = Vec::with_capacity(len);

    for i in 0..len {
        if mask.get(i).unwrap_or(false) {
            result_vec.push(Some(fill_value));
        } else {
            let val = series.get(i)?;
            result_vec.push(Some(val.try_extract::<f64>()?));
        }
    }

    Ok(Series::new(series.name().clone(), result_vec))
}

/// Fill null values in a string Series with a specific value.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let str_series = series.cast(&DataType::String)?;
    let chunked = str_series.str()?;
    let result_vec: Vec<&str> = chunked
        .into_iter()
        .map(|val| val.unwrap_or(fill_value))
        .collect();

    Ok(Series::new(series.name().clone(), result_vec))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_total_missing() {
        let df = df![
            "a" => [Some(1.0), None, Some(3.0)],
            "b" => [Some("x"), None, None],
        ]
        .unwrap();
        assert_eq!(total_missing(&df), 3);
    }

    #[test]
    fn test_duplicate_row_count() {
        let df = df![
            "a" => [1, 2, 1, 3],
            "b" => ["x", "y", "x", "z"],
        ]
        .unwrap();
        assert_eq!(duplicate_row_count(&df).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_row_count_empty() {
        let df = DataFrame::empty();
        assert_eq!(duplicate_row_count(&df).unwrap(), 0);
    }

    #[test]
    fn test_string_mode() {
        let series = Series::new("test".into(), &["a", "b", "a", "c", "a"]);
        assert_eq!(string_mode(&series), Some("a".to_string()));
    }

    #[test]
    fn test_string_mode_tie_breaks_on_first_seen() {
        let series = Series::new("test".into(), &["b", "a", "a", "b"]);
        assert_eq!(string_mode(&series), Some("b".to_string()));
    }

    #[test]
    fn test_string_mode_all_null() {
        let series = Series::new("test".into(), &[None::<&str>, None, None]);
        assert_eq!(string_mode(&series), None);
    }

    #[test]
    fn test_fill_numeric_nulls() {
        let series = Series::new("test".into(), &[Some(1.0), None, Some(3.0)]);
        let filled = fill_numeric_nulls(&series, 0.0).unwrap();

        assert_eq!(filled.get(0).unwrap().try_extract::<f64>().unwrap(), 1.0);
        assert_eq!(filled.get(1).unwrap().try_extract::<f64>().unwrap(), 0.0);
        assert_eq!(filled.get(2).unwrap().try_extract::<f64>().unwrap(), 3.0);
    }

    #[test]
    fn test_fill_string_nulls() {
        let series = Series::new("test".into(), &[Some("a"), None, Some("c")]);
        let filled = fill_string_nulls(&series, "Unknown").unwrap();

        assert_eq!(filled.null_count(), 0);
        let vals = filled.str().unwrap();
        assert_eq!(vals.get(1), Some("Unknown"));
    }

    #[test]
    fn test_numeric_mean() {
        let series = Series::new("test".into(), &[Some(1.0), None, Some(3.0)]);
        assert_eq!(numeric_mean(&series), Some(2.0));
    }
}
