//! K-nearest-neighbor imputation for numeric columns.
//!
//! Missing cells are estimated from the `k` nearest rows, measured by
//! normalized Euclidean distance over the other numeric columns, weighted
//! by inverse distance. Rows with no comparable features fall back to the
//! column mean. Callers are expected to check donor availability up front
//! and choose plain mean imputation when fewer complete rows than
//! neighbors exist.

use polars::prelude::*;
use tracing::debug;

use crate::error::{Result, SweepError};
use crate::utils;

/// Numeric view of a dataset used for distance calculations.
struct NumericMatrix {
    columns: Vec<String>,
    values: Vec<Vec<Option<f64>>>,
}

impl NumericMatrix {
    fn build(df: &DataFrame) -> Result<Self> {
        let columns: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|col| utils::is_numeric_dtype(col.dtype()))
            .map(|col| col.name().to_string())
            .collect();

        let mut values = vec![vec![None; columns.len()]; df.height()];
        for (col_idx, name) in columns.iter().enumerate() {
            let series = df.column(name)?.cast(&DataType::Float64)?;
            let floats = series.f64()?;
            for (row_idx, row) in values.iter_mut().enumerate() {
                row[col_idx] = floats.get(row_idx);
            }
        }

        Ok(Self { columns, values })
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn column_mean(&self, col_idx: usize) -> Option<f64> {
        let mut sum = 0.0;
        let mut count = 0usize;
        for row in &self.values {
            if let Some(v) = row[col_idx] {
                sum += v;
                count += 1;
            }
        }
        (count > 0).then(|| sum / count as f64)
    }

    /// Normalized Euclidean distance between two rows over the columns both
    /// have values for, skipping the column being imputed. `None` when the
    /// rows share no comparable feature.
    fn row_distance(&self, a: usize, b: usize, skip_col: usize) -> Option<f64> {
        let mut sum_squared = 0.0;
        let mut count = 0usize;

        for col_idx in 0..self.columns.len() {
            if col_idx == skip_col {
                continue;
            }
            if let (Some(x), Some(y)) = (self.values[a][col_idx], self.values[b][col_idx]) {
                let diff = x - y;
                sum_squared += diff * diff;
                count += 1;
            }
        }

        (count > 0).then(|| (sum_squared / count as f64).sqrt())
    }
}

/// K-nearest-neighbor imputer for a single numeric column.
pub struct KnnImputer {
    n_neighbors: usize,
}

impl KnnImputer {
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1),
        }
    }

    /// Count of rows that can donate a value for `column` (non-null cells).
    pub fn donor_count(df: &DataFrame, column: &str) -> Result<usize> {
        let series = df.column(column)?;
        Ok(series.len() - series.null_count())
    }

    /// Impute the missing cells of one numeric column, returning the filled
    /// replacement series (as Float64).
    pub fn impute_column(&self, df: &DataFrame, column: &str) -> Result<Series> {
        let matrix = NumericMatrix::build(df)?;
        let col_idx = matrix
            .column_index(column)
            .ok_or_else(|| SweepError::ColumnNotFound(column.to_string()))?;

        let donors: Vec<usize> = matrix
            .values
            .iter()
            .enumerate()
            .filter(|(_, row)| row[col_idx].is_some())
            .map(|(idx, _)| idx)
            .collect();

        if donors.is_empty() {
            return Err(SweepError::NoValidValues(column.to_string()));
        }

        let mean = matrix.column_mean(col_idx).unwrap_or(0.0);
        let mut filled = Vec::with_capacity(df.height());
        let mut fallback_cells = 0usize;

        for row_idx in 0..df.height() {
            match matrix.values[row_idx][col_idx] {
                Some(v) => filled.push(Some(v)),
                None => {
                    let estimate = self.estimate(&matrix, &donors, row_idx, col_idx);
                    if estimate.is_none() {
                        fallback_cells += 1;
                    }
                    filled.push(Some(estimate.unwrap_or(mean)));
                }
            }
        }

        if fallback_cells > 0 {
            debug!(
                column,
                fallback_cells, "No comparable neighbors, used column mean"
            );
        }

        Ok(Series::new(column.into(), filled))
    }

    /// Inverse-distance-weighted average of the k nearest donors.
    /// `None` when no donor is comparable to the target row.
    fn estimate(
        &self,
        matrix: &NumericMatrix,
        donors: &[usize],
        target_row: usize,
        target_col: usize,
    ) -> Option<f64> {
        let mut neighbors: Vec<(usize, f64)> = donors
            .iter()
            .filter(|&&d| d != target_row)
            .filter_map(|&d| {
                matrix
                    .row_distance(target_row, d, target_col)
                    .map(|dist| (d, dist))
            })
            .collect();

        if neighbors.is_empty() {
            return None;
        }

        neighbors.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        neighbors.truncate(self.n_neighbors);

        let mut weighted_sum = 0.0;
        let mut weight_sum = 0.0;
        for (donor, distance) in neighbors {
            // Near-zero distances dominate instead of dividing by zero.
            let weight = if distance < 1e-10 { 1e10 } else { 1.0 / distance };
            if let Some(value) = matrix.values[donor][target_col] {
                weighted_sum += value * weight;
                weight_sum += weight;
            }
        }

        (weight_sum > 0.0).then(|| weighted_sum / weight_sum)
    }
}
