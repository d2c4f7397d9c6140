//! Isolation-forest outlier detection.
//!
//! Builds an ensemble of random partitioning trees over the numeric columns;
//! points that isolate in few splits (short average path length) score as
//! anomalous. The expected contamination fraction decides how many rows get
//! flagged. Detection is deterministic for a fixed seed.

use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::error::Result;
use crate::ops::{CleaningOperation, param_bool, param_f64, param_u64};
use crate::types::Outcome;
use crate::utils;

const DEFAULT_CONTAMINATION: f64 = 0.05;
const DEFAULT_SEED: u64 = 42;
const N_TREES: usize = 100;
const MAX_SAMPLE: usize = 256;
const EULER_MASCHERONI: f64 = 0.577_215_664_901_532_9;

/// Name of the boolean column added when flagging outliers.
pub const OUTLIER_FLAG_COLUMN: &str = "is_outlier";

/// Flags anomalous rows using isolation-forest scoring over the numeric
/// columns. Adds a boolean [`OUTLIER_FLAG_COLUMN`] by default; removing the
/// flagged rows is an explicit opt-in.
///
/// Parameters:
/// - `contamination`: expected outlier fraction in (0, 0.5] (default 0.05)
/// - `remove`: drop flagged rows instead of adding the flag column
///   (default false)
/// - `seed`: RNG seed (default 42)
pub struct DetectOutliers;

enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        value: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

struct IsolationForest {
    trees: Vec<Node>,
    sample_size: usize,
}

impl IsolationForest {
    fn fit(data: &[Vec<f64>], seed: u64) -> Self {
        let n_rows = data.len();
        let sample_size = n_rows.min(MAX_SAMPLE);
        let max_depth = (sample_size as f64).log2().ceil().max(1.0) as usize;
        let mut rng = StdRng::seed_from_u64(seed);

        let mut trees = Vec::with_capacity(N_TREES);
        for _ in 0..N_TREES {
            let mut indices: Vec<usize> = (0..n_rows).collect();
            indices.shuffle(&mut rng);
            indices.truncate(sample_size);
            trees.push(Self::build_tree(data, &indices, 0, max_depth, &mut rng));
        }

        Self { trees, sample_size }
    }

    fn build_tree(
        data: &[Vec<f64>],
        rows: &[usize],
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> Node {
        if rows.len() <= 1 || depth >= max_depth {
            return Node::Leaf { size: rows.len() };
        }

        let n_features = data[rows[0]].len();

        // Features where the sampled rows still spread out.
        let splittable: Vec<usize> = (0..n_features)
            .filter(|&f| {
                let mut min = f64::INFINITY;
                let mut max = f64::NEG_INFINITY;
                for &row in rows {
                    min = min.min(data[row][f]);
                    max = max.max(data[row][f]);
                }
                max > min
            })
            .collect();

        if splittable.is_empty() {
            return Node::Leaf { size: rows.len() };
        }

        let feature = splittable[rng.gen_range(0..splittable.len())];
        let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
        for &row in rows {
            min = min.min(data[row][feature]);
            max = max.max(data[row][feature]);
        }
        let value = rng.gen_range(min..max);

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.iter().partition(|&&row| data[row][feature] < value);

        Node::Split {
            feature,
            value,
            left: Box::new(Self::build_tree(data, &left_rows, depth + 1, max_depth, rng)),
            right: Box::new(Self::build_tree(data, &right_rows, depth + 1, max_depth, rng)),
        }
    }

    /// Average unsuccessful-search path length of a binary search tree with
    /// `n` nodes, the standard normalization term.
    fn expected_path(n: usize) -> f64 {
        if n <= 1 {
            return 0.0;
        }
        let n = n as f64;
        2.0 * ((n - 1.0).ln() + EULER_MASCHERONI) - 2.0 * (n - 1.0) / n
    }

    fn path_length(node: &Node, point: &[f64], depth: f64) -> f64 {
        match node {
            Node::Leaf { size } => depth + Self::expected_path(*size),
            Node::Split {
                feature,
                value,
                left,
                right,
            } => {
                if point[*feature] < *value {
                    Self::path_length(left, point, depth + 1.0)
                } else {
                    Self::path_length(right, point, depth + 1.0)
                }
            }
        }
    }

    /// Anomaly score in (0, 1); higher means more anomalous.
    fn score(&self, point: &[f64]) -> f64 {
        let avg_path: f64 = self
            .trees
            .iter()
            .map(|tree| Self::path_length(tree, point, 0.0))
            .sum::<f64>()
            / self.trees.len() as f64;

        let c = Self::expected_path(self.sample_size).max(1e-12);
        2f64.powf(-avg_path / c)
    }
}

impl DetectOutliers {
    /// Numeric feature matrix with nulls replaced by the column mean.
    /// Columns without any value are left out.
    fn feature_matrix(df: &DataFrame) -> Result<(Vec<String>, Vec<Vec<f64>>)> {
        let mut names = Vec::new();
        let mut columns: Vec<Vec<f64>> = Vec::new();

        for col in df.get_columns() {
            if !utils::is_numeric_dtype(col.dtype()) {
                continue;
            }
            let series = col.as_materialized_series();
            let Some(mean) = utils::numeric_mean(series) else {
                continue;
            };
            let floats = series.cast(&DataType::Float64)?;
            let values: Vec<f64> = floats
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(mean))
                .collect();
            names.push(col.name().to_string());
            columns.push(values);
        }

        let rows = df.height();
        let mut matrix = vec![vec![0.0; columns.len()]; rows];
        for (col_idx, column) in columns.iter().enumerate() {
            for (row_idx, &v) in column.iter().enumerate() {
                matrix[row_idx][col_idx] = v;
            }
        }

        Ok((names, matrix))
    }

    /// Flag the `ceil(rows * contamination)` highest-scoring rows.
    fn flags_from_scores(scores: &[f64], contamination: f64) -> Vec<bool> {
        let n = scores.len();
        let k = ((n as f64 * contamination).ceil() as usize).clamp(1, n);

        let mut sorted: Vec<f64> = scores.to_vec();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        let threshold = sorted[k - 1];

        scores.iter().map(|&s| s >= threshold).collect()
    }
}

impl CleaningOperation for DetectOutliers {
    fn name(&self) -> &'static str {
        "detect_outliers"
    }

    fn description(&self) -> &'static str {
        "Flag anomalous rows via isolation forest over numeric columns (removal is opt-in)"
    }

    fn validate_params(&self, params: &Map<String, Value>) -> std::result::Result<(), String> {
        if let Some(value) = params.get("contamination") {
            let ok = value.as_f64().is_some_and(|c| c > 0.0 && c <= 0.5);
            if !ok {
                return Err(format!(
                    "parameter 'contamination' must be a number in (0, 0.5], got {}",
                    value
                ));
            }
        }
        if let Some(value) = params.get("remove")
            && !value.is_boolean()
        {
            return Err(format!("parameter 'remove' must be a boolean, got {}", value));
        }
        if let Some(value) = params.get("seed")
            && !value.is_u64()
        {
            return Err(format!(
                "parameter 'seed' must be a non-negative integer, got {}",
                value
            ));
        }
        Ok(())
    }

    fn execute(&self, df: &DataFrame, params: &Map<String, Value>) -> Result<Outcome> {
        let contamination = param_f64(params, "contamination").unwrap_or(DEFAULT_CONTAMINATION);
        let remove = param_bool(params, "remove").unwrap_or(false);
        let seed = param_u64(params, "seed").unwrap_or(DEFAULT_SEED);

        if df.height() < 2 {
            return Ok(Outcome::skipped(
                df.clone(),
                "Not enough rows for outlier detection (need at least 2)",
            ));
        }

        let (feature_names, matrix) = Self::feature_matrix(df)?;
        if feature_names.is_empty() {
            return Ok(Outcome::skipped(
                df.clone(),
                "No numeric columns for outlier detection",
            ));
        }

        debug!(
            features = ?feature_names,
            contamination,
            seed,
            "Fitting isolation forest"
        );

        let forest = IsolationForest::fit(&matrix, seed);
        let scores: Vec<f64> = matrix.iter().map(|row| forest.score(row)).collect();
        let flags = Self::flags_from_scores(&scores, contamination);
        let outlier_count = flags.iter().filter(|&&f| f).count();

        let outcome = if remove {
            let keep: Vec<bool> = flags.iter().map(|&f| !f).collect();
            let mask = BooleanChunked::new("keep".into(), keep);
            let filtered = df.filter(&mask)?;
            let message = format!(
                "Removed {} outlier rows ({:.1}%)",
                outlier_count,
                outlier_count as f64 / df.height() as f64 * 100.0
            );
            info!("{}", message);
            Outcome::success(filtered, message).with_metadata("removed", true)
        } else {
            let mut flagged = df.clone();
            flagged.with_column(Series::new(OUTLIER_FLAG_COLUMN.into(), flags))?;
            let message = format!(
                "Flagged {} outlier rows ({:.1}%) in column '{}'",
                outlier_count,
                outlier_count as f64 / df.height() as f64 * 100.0,
                OUTLIER_FLAG_COLUMN
            );
            info!("{}", message);
            Outcome::success(flagged, message)
                .with_metadata("flag_column", OUTLIER_FLAG_COLUMN)
                .with_metadata("removed", false)
        };

        Ok(outcome
            .with_metadata("outlier_count", outlier_count)
            .with_metadata("contamination", contamination)
            .with_metadata("features", json!(feature_names))
            .with_metadata("seed", seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(json_str: &str) -> Map<String, Value> {
        serde_json::from_str(json_str).unwrap()
    }

    fn df_with_outlier() -> DataFrame {
        df![
            "age" => [30.0, 32.0, 35.0, 33.0, 36.0, 34.0, 31.0, 37.0, 35.0, 500.0],
            "score" => [1.0, 1.2, 0.9, 1.1, 1.0, 0.8, 1.3, 1.1, 0.9, 1.0],
        ]
        .unwrap()
    }

    #[test]
    fn test_flags_extreme_value() {
        let df = df_with_outlier();
        let outcome = DetectOutliers.execute(&df, &Map::new()).unwrap();
        assert!(outcome.success);

        let flags = outcome.dataset.column(OUTLIER_FLAG_COLUMN).unwrap();
        let flags = flags.bool().unwrap();
        assert_eq!(flags.get(9), Some(true), "the age=500 row must be flagged");
        assert_eq!(outcome.dataset.height(), df.height());
    }

    #[test]
    fn test_flag_only_by_default() {
        let df = df_with_outlier();
        let outcome = DetectOutliers.execute(&df, &Map::new()).unwrap();
        assert_eq!(outcome.dataset.width(), df.width() + 1);
        assert_eq!(outcome.metadata.get("removed").unwrap(), false);
    }

    #[test]
    fn test_removal_is_opt_in() {
        let df = df_with_outlier();
        let outcome = DetectOutliers
            .execute(&df, &params(r#"{"remove": true}"#))
            .unwrap();
        assert!(outcome.dataset.height() < df.height());
        assert!(outcome.dataset.column(OUTLIER_FLAG_COLUMN).is_err());
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let df = df_with_outlier();
        let a = DetectOutliers
            .execute(&df, &params(r#"{"seed": 7}"#))
            .unwrap();
        let b = DetectOutliers
            .execute(&df, &params(r#"{"seed": 7}"#))
            .unwrap();

        let flags_a: Vec<Option<bool>> = a
            .dataset
            .column(OUTLIER_FLAG_COLUMN)
            .unwrap()
            .bool()
            .unwrap()
            .into_iter()
            .collect();
        let flags_b: Vec<Option<bool>> = b
            .dataset
            .column(OUTLIER_FLAG_COLUMN)
            .unwrap()
            .bool()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(flags_a, flags_b);
    }

    #[test]
    fn test_no_numeric_columns_is_skipped() {
        let df = df!["name" => ["a", "b", "c"]].unwrap();
        let outcome = DetectOutliers.execute(&df, &Map::new()).unwrap();
        assert!(!outcome.success);
        assert!(outcome.message.contains("No numeric columns"));
        assert_eq!(outcome.dataset.shape(), df.shape());
    }

    #[test]
    fn test_too_few_rows_is_skipped() {
        let df = df!["a" => [1.0]].unwrap();
        let outcome = DetectOutliers.execute(&df, &Map::new()).unwrap();
        assert!(!outcome.success);
        assert!(outcome.message.contains("Not enough rows"));
    }

    #[test]
    fn test_nulls_do_not_break_scoring() {
        let df = df![
            "age" => [Some(30.0), Some(31.0), None, Some(33.0), Some(500.0)],
        ]
        .unwrap();
        let outcome = DetectOutliers
            .execute(&df, &params(r#"{"contamination": 0.2}"#))
            .unwrap();
        assert!(outcome.success);
        let flags = outcome.dataset.column(OUTLIER_FLAG_COLUMN).unwrap();
        assert_eq!(flags.bool().unwrap().get(4), Some(true));
    }

    #[test]
    fn test_flags_from_scores_count() {
        let scores = vec![0.1, 0.2, 0.9, 0.3, 0.15, 0.2, 0.25, 0.3, 0.1, 0.2];
        let flags = DetectOutliers::flags_from_scores(&scores, 0.05);
        assert_eq!(flags.iter().filter(|&&f| f).count(), 1);
        assert!(flags[2]);
    }

    #[test]
    fn test_validate_params() {
        assert!(DetectOutliers.validate_params(&Map::new()).is_ok());
        assert!(
            DetectOutliers
                .validate_params(&params(r#"{"contamination": 0.1, "remove": false}"#))
                .is_ok()
        );
        assert!(
            DetectOutliers
                .validate_params(&params(r#"{"contamination": 0.9}"#))
                .is_err()
        );
        assert!(
            DetectOutliers
                .validate_params(&params(r#"{"remove": "yes"}"#))
                .is_err()
        );
        assert!(
            DetectOutliers
                .validate_params(&params(r#"{"seed": -1}"#))
                .is_err()
        );
    }
}
