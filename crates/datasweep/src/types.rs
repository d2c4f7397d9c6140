//! Core value types shared across the cleaning agent.
//!
//! This module defines the data model threaded through a run: the dataset
//! profile produced by inspection, the plan produced by a planner, the
//! per-step outcome and execution record, and the final report.

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::utils;

// =============================================================================
// Profile types
// =============================================================================

/// Inferred kind of a column, used to drive planning and imputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Integer or floating point values
    Numeric,
    /// Text or low-cardinality string values
    Categorical,
    /// Fully distinct values that look like row identifiers
    Identifier,
}

impl ColumnKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
            Self::Identifier => "identifier",
        }
    }
}

/// Snapshot of one column produced by the inspector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    /// Column name
    pub name: String,
    /// Inferred column kind
    pub kind: ColumnKind,
    /// Number of missing (null) cells
    pub missing_count: usize,
    /// Missing cells as a fraction of the row count (0.0 when empty)
    pub missing_fraction: f64,
    /// Number of distinct non-null values
    pub distinct_count: usize,
}

/// Snapshot of a whole dataset. Regenerated fresh on every inspection,
/// never patched incrementally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetProfile {
    /// Number of rows
    pub rows: usize,
    /// Number of columns
    pub columns: usize,
    /// Per-column profiles, in dataset column order
    pub column_profiles: Vec<ColumnProfile>,
    /// Number of rows that duplicate an earlier row exactly
    pub duplicate_count: usize,
    /// Total missing cells across all columns
    pub total_missing: usize,
}

impl DatasetProfile {
    /// An empty-dataset profile (zero shape, no columns).
    pub fn empty() -> Self {
        Self {
            rows: 0,
            columns: 0,
            column_profiles: Vec::new(),
            duplicate_count: 0,
            total_missing: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.columns == 0
    }

    /// Names of numeric columns.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.column_profiles
            .iter()
            .filter(|c| c.kind == ColumnKind::Numeric)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Whether any column has at least one missing cell.
    pub fn has_missing(&self) -> bool {
        self.total_missing > 0
    }

    /// Look up a column profile by name.
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.column_profiles.iter().find(|c| c.name == name)
    }
}

// =============================================================================
// Plan types
// =============================================================================

/// Where a plan came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    /// Deterministic rule table
    Rules,
    /// External planning oracle
    Oracle,
}

/// One planned operation with its parameters and justification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    /// Name of the operation in the registry
    pub operation: String,
    /// Operation parameters
    #[serde(default)]
    pub parameters: Map<String, Value>,
    /// Human-readable justification for this step
    #[serde(default)]
    pub reason: String,
}

impl PlanStep {
    pub fn new(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            parameters: Map::new(),
            reason: reason.into(),
        }
    }

    /// Attach a parameter, builder-style.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

/// An ordered sequence of steps. Immutable once produced; the agent only
/// executes steps the plan already contains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
    /// Where the plan came from
    pub source: PlanSource,
    /// Warnings recorded while validating the plan (e.g., discarded steps)
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Plan {
    pub fn new(steps: Vec<PlanStep>, source: PlanSource) -> Self {
        Self {
            steps,
            source,
            warnings: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

// =============================================================================
// Execution types
// =============================================================================

/// Result of applying one cleaning operation.
///
/// The dataset is a new value; operations never mutate their input. A
/// `success` of `false` means the operation could not proceed given the data
/// (an expected condition, not an error).
#[derive(Debug)]
pub struct Outcome {
    /// Resulting dataset
    pub dataset: DataFrame,
    /// Whether the operation ran to a useful result
    pub success: bool,
    /// Description of what was done (or why nothing was)
    pub message: String,
    /// Additional structured information
    pub metadata: Map<String, Value>,
}

impl Outcome {
    /// A successful outcome (including "nothing to do" results).
    pub fn success(dataset: DataFrame, message: impl Into<String>) -> Self {
        Self {
            dataset,
            success: true,
            message: message.into(),
            metadata: Map::new(),
        }
    }

    /// An outcome for an operation that could not proceed given the data.
    /// The dataset passes through unchanged.
    pub fn skipped(dataset: DataFrame, message: impl Into<String>) -> Self {
        Self {
            dataset,
            success: false,
            message: message.into(),
            metadata: Map::new(),
        }
    }

    /// Attach a metadata entry, builder-style.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Audit-log entry for one applied step. Append-only; records form the
/// agent's memory and the verbatim source of the report's action list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// 1-based index of the step within the run
    pub iteration: usize,
    /// Operation name
    pub operation: String,
    /// Whether the operation ran to a useful result
    pub success: bool,
    /// Operation message
    pub message: String,
    /// Operation metadata
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// RFC 3339 timestamp of when the record was appended
    pub timestamp: String,
}

impl ExecutionRecord {
    pub fn new(
        iteration: usize,
        operation: impl Into<String>,
        success: bool,
        message: impl Into<String>,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            iteration,
            operation: operation.into(),
            success,
            message: message.into(),
            metadata,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

// =============================================================================
// Report types
// =============================================================================

/// Compact shape/quality summary of a dataset, used for before/after
/// comparison in the report and in oracle prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: usize,
    pub missing_cells: usize,
    pub duplicate_rows: usize,
}

impl DatasetSummary {
    /// Summarize a dataset.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        Ok(Self {
            rows: df.height(),
            columns: df.width(),
            missing_cells: utils::total_missing(df),
            duplicate_rows: utils::duplicate_row_count(df)?,
        })
    }
}

/// Quality verdict produced by a validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// Quality score, always within [1, 10]
    pub score: u8,
    /// Human-readable feedback
    pub feedback: String,
    /// Improvement suggestions
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl QualityAssessment {
    /// Clamp an arbitrary score into the valid [1, 10] range.
    pub fn clamp_score(score: i64) -> u8 {
        score.clamp(1, 10) as u8
    }
}

/// Final report of a cleaning run. Produced exactly once per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Quality score in [1, 10]
    pub quality_score: u8,
    /// Validator feedback
    pub feedback: String,
    /// Ordered action messages, verbatim from the execution records
    pub actions: Vec<String>,
    /// Dataset summary before cleaning
    pub before: DatasetSummary,
    /// Dataset summary after cleaning
    pub after: DatasetSummary,
    /// Improvement suggestions from the validator
    pub suggestions: Vec<String>,
    /// Warnings collected during the run (e.g., discarded plan steps)
    pub warnings: Vec<String>,
    /// Number of steps executed
    pub iterations: usize,
    /// RFC 3339 timestamp of report generation
    pub timestamp: String,
}

/// Everything a run hands back: the cleaned dataset, the report, and the
/// full execution log.
#[derive(Debug)]
pub struct CleaningOutcome {
    pub dataset: DataFrame,
    pub report: CleaningReport,
    pub records: Vec<ExecutionRecord>,
}
