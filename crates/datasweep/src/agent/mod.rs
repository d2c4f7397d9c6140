//! The cleaning agent run loop.
//!
//! A run moves through a fixed sequence of phases: inspect the dataset,
//! build a plan, execute its steps one at a time, validate the result,
//! and assemble the report. Each executed step appends an
//! [`ExecutionRecord`]; the log is append-only and survives into the
//! final outcome. A step that cannot proceed given the data is recorded
//! with `success = false` and the run continues; only engine failures
//! abort a run.

use std::fmt;
use std::sync::Arc;

use polars::prelude::DataFrame;
use serde_json::Map;
use static_assertions::assert_impl_all;
use tracing::{info, warn};

use crate::config::AgentConfig;
use crate::error::{Result, SweepError};
use crate::ops::OperationRegistry;
use crate::oracle::Oracle;
use crate::planner::{DelegatedPlanner, Planner, RuleBasedPlanner};
use crate::profiler::DataProfiler;
use crate::report;
use crate::types::{CleaningOutcome, ExecutionRecord};
use crate::validator::{DelegatedValidator, RuleBasedValidator, Validator};

/// Phase of a cleaning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Idle,
    Inspecting,
    Planning,
    Executing,
    Validating,
    Done,
    Failed,
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Inspecting => "inspecting",
            Self::Planning => "planning",
            Self::Executing => "executing",
            Self::Validating => "validating",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Orchestrates a full cleaning run: inspect, plan, execute, validate,
/// report.
///
/// # Example
///
/// ```rust,ignore
/// use datasweep::agent::CleaningAgent;
/// use datasweep::config::AgentConfig;
///
/// let agent = CleaningAgent::builder()
///     .config(AgentConfig::default())
///     .build()?;
/// let outcome = agent.run(&df)?;
/// println!("score: {}/10", outcome.report.quality_score);
/// ```
pub struct CleaningAgent {
    config: AgentConfig,
    registry: Arc<OperationRegistry>,
    planner: Box<dyn Planner>,
    validator: Box<dyn Validator>,
}

assert_impl_all!(CleaningAgent: Send, Sync);

impl CleaningAgent {
    /// Create a builder for configuring an agent.
    pub fn builder() -> CleaningAgentBuilder {
        CleaningAgentBuilder::default()
    }

    /// Agent with default configuration and rule-based strategies.
    pub fn with_defaults() -> Result<Self> {
        Self::builder().build()
    }

    /// Run a full cleaning cycle on a dataset.
    ///
    /// The input is never mutated; the cleaned dataset comes back inside
    /// the [`CleaningOutcome`] together with the report and the full
    /// execution log.
    ///
    /// # Errors
    ///
    /// Returns an error only for engine failures (an operation raising an
    /// internal error, profiling failing). Expected data conditions are
    /// recorded as unsuccessful steps and the run continues.
    pub fn run(&self, df: &DataFrame) -> Result<CleaningOutcome> {
        let mut state = AgentState::Idle;
        info!(
            state = %state,
            rows = df.height(),
            columns = df.width(),
            "Starting cleaning run"
        );

        state = AgentState::Inspecting;
        info!(state = %state, "Inspecting dataset");
        let profile = DataProfiler::profile(df).map_err(|e| {
            SweepError::ProfilingFailed(e.to_string())
        })?;

        state = AgentState::Planning;
        info!(state = %state, "Building plan");
        let plan = self.planner.plan(&profile)?;
        let mut warnings = plan.warnings.clone();
        info!(steps = plan.len(), source = ?plan.source, "Plan ready");

        state = AgentState::Executing;
        let mut current = df.clone();
        let mut records: Vec<ExecutionRecord> = Vec::new();

        for (index, step) in plan.steps.iter().enumerate() {
            if index >= self.config.max_iterations {
                let skipped = plan.len() - index;
                warn!(
                    cap = self.config.max_iterations,
                    skipped, "Iteration cap reached, remaining steps skipped"
                );
                warnings.push(format!(
                    "Iteration cap of {} reached, {} planned steps skipped",
                    self.config.max_iterations, skipped
                ));
                break;
            }

            let iteration = index + 1;
            let Some(op) = self.registry.get(&step.operation) else {
                warn!(operation = %step.operation, "Plan step names an unknown operation");
                records.push(ExecutionRecord::new(
                    iteration,
                    step.operation.clone(),
                    false,
                    format!("Unknown operation '{}', skipped", step.operation),
                    Map::new(),
                ));
                continue;
            };

            info!(state = %state, iteration, operation = %step.operation, "Executing step");
            match op.execute(&current, &step.parameters) {
                Ok(outcome) => {
                    info!(
                        iteration,
                        operation = %step.operation,
                        success = outcome.success,
                        "{}", outcome.message
                    );
                    records.push(ExecutionRecord::new(
                        iteration,
                        step.operation.clone(),
                        outcome.success,
                        outcome.message,
                        outcome.metadata,
                    ));
                    current = outcome.dataset;
                }
                Err(e) => {
                    state = AgentState::Failed;
                    warn!(state = %state, operation = %step.operation, error = %e, "Run aborted");
                    return Err(SweepError::OperationFailed {
                        operation: step.operation.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        state = AgentState::Validating;
        info!(state = %state, "Scoring result");
        let assessment = self.validator.validate(df, &current, &records)?;

        let report = report::build_report(df, &current, &records, &assessment, warnings)?;

        state = AgentState::Done;
        info!(
            state = %state,
            score = report.quality_score,
            iterations = report.iterations,
            "Cleaning run complete"
        );

        Ok(CleaningOutcome {
            dataset: current,
            report,
            records,
        })
    }
}

/// Builder for [`CleaningAgent`].
///
/// Wires the delegated planner and validator when the config asks for them
/// and an oracle is present; otherwise the rule-based strategies are used.
/// A custom planner or validator set explicitly wins over both.
#[derive(Default)]
pub struct CleaningAgentBuilder {
    config: Option<AgentConfig>,
    oracle: Option<Arc<dyn Oracle>>,
    planner: Option<Box<dyn Planner>>,
    validator: Option<Box<dyn Validator>>,
}

impl CleaningAgentBuilder {
    /// Set the run configuration.
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Provide an oracle for delegated planning and validation.
    pub fn oracle(mut self, oracle: Arc<dyn Oracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Override the planner entirely.
    pub fn planner(mut self, planner: Box<dyn Planner>) -> Self {
        self.planner = Some(planner);
        self
    }

    /// Override the validator entirely.
    pub fn validator(mut self, validator: Box<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Build the agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn build(self) -> Result<CleaningAgent> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|e| SweepError::InvalidConfig(e.to_string()))?;

        let registry = Arc::new(OperationRegistry::with_defaults());

        let planner: Box<dyn Planner> = match (self.planner, &self.oracle) {
            (Some(planner), _) => planner,
            (None, Some(oracle)) if config.use_delegated_planner => Box::new(
                DelegatedPlanner::new(Arc::clone(oracle), Arc::clone(&registry), config.clone()),
            ),
            (None, _) => {
                if config.use_delegated_planner {
                    warn!("Delegated planner requested but no oracle provided, using rules");
                }
                Box::new(RuleBasedPlanner::new(config.clone()))
            }
        };

        let validator: Box<dyn Validator> = match (self.validator, &self.oracle) {
            (Some(validator), _) => validator,
            (None, Some(oracle)) if config.use_delegated_validator => {
                Box::new(DelegatedValidator::new(Arc::clone(oracle)))
            }
            (None, _) => {
                if config.use_delegated_validator {
                    warn!("Delegated validator requested but no oracle provided, using rules");
                }
                Box::new(RuleBasedValidator::new())
            }
        };

        Ok(CleaningAgent {
            config,
            registry,
            planner,
            validator,
        })
    }
}
