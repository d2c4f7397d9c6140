//! Configuration types for the cleaning agent.
//!
//! This module provides configuration options using the builder pattern.
//! Configuration is always passed explicitly into the agent so runs are
//! reproducible and testable in isolation; nothing here reads ambient
//! process state.

use serde::{Deserialize, Serialize};

/// Which occurrence to keep when removing duplicate rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateKeep {
    /// Keep the first occurrence of each duplicate group
    #[default]
    First,
    /// Keep the last occurrence of each duplicate group
    Last,
}

impl DuplicateKeep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Last => "last",
        }
    }
}

/// Configuration for a cleaning run.
///
/// Use [`AgentConfig::builder()`] for fluent construction.
///
/// # Example
///
/// ```rust,ignore
/// use datasweep::config::AgentConfig;
///
/// let config = AgentConfig::builder()
///     .missing_value_threshold(0.6)
///     .knn_neighbors(3)
///     .use_delegated_planner(false)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum number of plan steps executed in one run.
    /// Steps beyond this cap are skipped with a warning.
    /// Default: 5
    pub max_iterations: usize,

    /// Columns whose missing fraction is at or above this threshold are
    /// dropped instead of imputed (0.0 - 1.0, exclusive).
    /// Default: 0.5 (50%)
    pub missing_value_threshold: f64,

    /// Expected fraction of outlier rows for the isolation forest
    /// (0.0 - 0.5, exclusive low end).
    /// Default: 0.05 (5%)
    pub outlier_contamination: f64,

    /// Number of neighbors for KNN imputation.
    /// Default: 5
    pub knn_neighbors: usize,

    /// Which occurrence to keep when removing duplicates.
    /// Default: First
    pub duplicate_keep: DuplicateKeep,

    /// Whether outlier detection removes flagged rows instead of only
    /// adding a flag column.
    /// Default: false (flag only)
    pub remove_outliers: bool,

    /// Whether to plan via the delegated oracle (falls back to the
    /// rule-based planner when the oracle is absent or fails).
    /// Default: false
    pub use_delegated_planner: bool,

    /// Whether to score via the delegated oracle (falls back to the
    /// rule-based validator when the oracle is absent or fails).
    /// Default: false
    pub use_delegated_validator: bool,

    /// Timeout in seconds for each oracle call.
    /// Default: 30
    pub oracle_timeout_secs: u64,

    /// Seed for the isolation forest RNG so runs are reproducible.
    /// Default: 42
    pub random_seed: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            missing_value_threshold: 0.5,
            outlier_contamination: 0.05,
            knn_neighbors: 5,
            duplicate_keep: DuplicateKeep::default(),
            remove_outliers: false,
            use_delegated_planner: false,
            use_delegated_validator: false,
            oracle_timeout_secs: 30,
            random_seed: 42,
        }
    }
}

impl AgentConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(self.missing_value_threshold > 0.0 && self.missing_value_threshold < 1.0) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "missing_value_threshold".to_string(),
                value: self.missing_value_threshold,
            });
        }

        if !(self.outlier_contamination > 0.0 && self.outlier_contamination <= 0.5) {
            return Err(ConfigValidationError::InvalidContamination(
                self.outlier_contamination,
            ));
        }

        if self.knn_neighbors == 0 {
            return Err(ConfigValidationError::InvalidKnnNeighbors(
                self.knn_neighbors,
            ));
        }

        if self.max_iterations == 0 {
            return Err(ConfigValidationError::InvalidMaxIterations(
                self.max_iterations,
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0 exclusive)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid outlier contamination: {0} (must be in (0.0, 0.5])")]
    InvalidContamination(f64),

    #[error("Invalid KNN neighbors: {0} (must be at least 1)")]
    InvalidKnnNeighbors(usize),

    #[error("Invalid max iterations: {0} (must be at least 1)")]
    InvalidMaxIterations(usize),
}

/// Builder for [`AgentConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AgentConfigBuilder {
    max_iterations: Option<usize>,
    missing_value_threshold: Option<f64>,
    outlier_contamination: Option<f64>,
    knn_neighbors: Option<usize>,
    duplicate_keep: Option<DuplicateKeep>,
    remove_outliers: Option<bool>,
    use_delegated_planner: Option<bool>,
    use_delegated_validator: Option<bool>,
    oracle_timeout_secs: Option<u64>,
    random_seed: Option<u64>,
}

impl AgentConfigBuilder {
    /// Set the maximum number of plan steps executed in one run.
    pub fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = Some(n);
        self
    }

    /// Set the missing-fraction threshold above which columns are dropped.
    ///
    /// # Arguments
    /// * `threshold` - Value between 0.0 and 1.0 exclusive (e.g., 0.5 = 50%)
    pub fn missing_value_threshold(mut self, threshold: f64) -> Self {
        self.missing_value_threshold = Some(threshold);
        self
    }

    /// Set the expected outlier contamination fraction.
    pub fn outlier_contamination(mut self, contamination: f64) -> Self {
        self.outlier_contamination = Some(contamination);
        self
    }

    /// Set the number of neighbors for KNN imputation.
    pub fn knn_neighbors(mut self, k: usize) -> Self {
        self.knn_neighbors = Some(k);
        self
    }

    /// Set which occurrence to keep when removing duplicates.
    pub fn duplicate_keep(mut self, keep: DuplicateKeep) -> Self {
        self.duplicate_keep = Some(keep);
        self
    }

    /// Opt in to removing outlier rows instead of only flagging them.
    pub fn remove_outliers(mut self, remove: bool) -> Self {
        self.remove_outliers = Some(remove);
        self
    }

    /// Enable or disable the delegated (oracle-backed) planner.
    pub fn use_delegated_planner(mut self, enabled: bool) -> Self {
        self.use_delegated_planner = Some(enabled);
        self
    }

    /// Enable or disable the delegated (oracle-backed) validator.
    pub fn use_delegated_validator(mut self, enabled: bool) -> Self {
        self.use_delegated_validator = Some(enabled);
        self
    }

    /// Set the per-call oracle timeout in seconds.
    pub fn oracle_timeout_secs(mut self, secs: u64) -> Self {
        self.oracle_timeout_secs = Some(secs);
        self
    }

    /// Set the RNG seed used by outlier detection.
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AgentConfig` or an error if validation fails.
    pub fn build(self) -> Result<AgentConfig, ConfigValidationError> {
        let config = AgentConfig {
            max_iterations: self.max_iterations.unwrap_or(5),
            missing_value_threshold: self.missing_value_threshold.unwrap_or(0.5),
            outlier_contamination: self.outlier_contamination.unwrap_or(0.05),
            knn_neighbors: self.knn_neighbors.unwrap_or(5),
            duplicate_keep: self.duplicate_keep.unwrap_or_default(),
            remove_outliers: self.remove_outliers.unwrap_or(false),
            use_delegated_planner: self.use_delegated_planner.unwrap_or(false),
            use_delegated_validator: self.use_delegated_validator.unwrap_or(false),
            oracle_timeout_secs: self.oracle_timeout_secs.unwrap_or(30),
            random_seed: self.random_seed.unwrap_or(42),
        };

        config.validate()?;
        Ok(config)
    }
}
