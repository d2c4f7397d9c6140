//! Tabular Data Cleaning Agent
//!
//! An AI-optional cleaning agent for tabular data built with Rust and Polars.
//!
//! # Overview
//!
//! The agent runs a fixed cycle over a dataset: inspect, plan, execute,
//! validate, report. Capabilities include:
//!
//! - **Inspection**: per-column profiling with kind inference (numeric,
//!   categorical, identifier), missingness and duplicate counts
//! - **Column name standardization**: lower-case snake_case with collision
//!   handling
//! - **Duplicate removal**: whole-row or subset-keyed, keep first or last
//! - **Missing value handling**: KNN imputation for numeric columns, mode
//!   fill for categorical ones, dropping columns past a missing threshold
//! - **Outlier detection**: seeded isolation forest, flagging by default
//!   with opt-in removal
//! - **AI-delegated planning and scoring**: optional oracle integration
//!   with validation of every oracle reply and rule-based failover
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use datasweep::{AgentConfig, CleaningAgent};
//! use datasweep::oracle::OpenAiOracle;
//! use polars::prelude::*;
//! use std::sync::Arc;
//!
//! let df = CsvReadOptions::default()
//!     .with_has_header(true)
//!     .try_into_reader_with_file_path(Some("data.csv".into()))?
//!     .finish()?;
//!
//! // Option 1: rule-based only (no AI required)
//! let agent = CleaningAgent::with_defaults()?;
//! let outcome = agent.run(&df)?;
//! println!("score: {}/10", outcome.report.quality_score);
//!
//! // Option 2: with AI-delegated planning and scoring
//! let config = AgentConfig::builder()
//!     .use_delegated_planner(true)
//!     .use_delegated_validator(true)
//!     .build()?;
//!
//! let agent = CleaningAgent::builder()
//!     .config(config)
//!     .oracle(Arc::new(OpenAiOracle::new(api_key)?))
//!     .build()?;
//! let outcome = agent.run(&df)?;
//! ```
//!
//! # Oracles
//!
//! Delegated planning and scoring go through the [`oracle::Oracle`] trait.
//! [`oracle::OpenAiOracle`] talks to any OpenAI-compatible chat-completions
//! endpoint (compiled with the "ai" feature, on by default). Oracle replies
//! are never trusted blindly: plans are validated step by step against the
//! operation registry and scores are clamped into range, and both fail over
//! to the rule-based strategies when the oracle is unreachable or its reply
//! is unusable.
//!
//! # Configuration
//!
//! Use [`AgentConfig`] to customize a run:
//!
//! ```rust,ignore
//! use datasweep::config::*;
//!
//! let config = AgentConfig::builder()
//!     .missing_value_threshold(0.6)   // drop columns with >=60% missing
//!     .knn_neighbors(3)
//!     .outlier_contamination(0.05)
//!     .remove_outliers(false)         // flag only
//!     .duplicate_keep(DuplicateKeep::First)
//!     .max_iterations(5)
//!     .build()?;
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod imputers;
pub mod ops;
pub mod oracle;
pub mod planner;
pub mod profiler;
pub mod report;
pub mod types;
pub mod utils;
pub mod validator;

// Re-exports for convenient access
pub use agent::{AgentState, CleaningAgent, CleaningAgentBuilder};
pub use config::{AgentConfig, AgentConfigBuilder, ConfigValidationError, DuplicateKeep};
pub use error::{Result, ResultExt, SweepError};
pub use imputers::KnnImputer;
pub use ops::{
    CleaningOperation, DetectOutliers, HandleMissingValues, InspectData, OperationRegistry,
    RemoveDuplicates, StandardizeColumnNames,
};
pub use oracle::Oracle;
pub use planner::{DelegatedPlanner, Planner, RuleBasedPlanner};
pub use profiler::DataProfiler;
pub use types::{
    CleaningOutcome, CleaningReport, ColumnKind, ColumnProfile, DatasetProfile, DatasetSummary,
    ExecutionRecord, Outcome, Plan, PlanSource, PlanStep, QualityAssessment,
};
pub use validator::{DelegatedValidator, RuleBasedValidator, ScoringWeights, Validator};
