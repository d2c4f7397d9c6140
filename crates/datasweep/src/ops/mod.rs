//! Cleaning operations and the operation registry.
//!
//! Every operation implements [`CleaningOperation`]: a pure transformation
//! from one dataset value to the next. Operations never mutate their input
//! and never return `Err` for expected data conditions; those become
//! [`Outcome`]s with an explanatory message instead. `Err` is reserved for
//! engine failures and programming errors.

mod dedup;
mod inspect;
mod missing;
mod outliers;
mod standardize;

pub use dedup::RemoveDuplicates;
pub use inspect::InspectData;
pub use missing::HandleMissingValues;
pub use outliers::DetectOutliers;
pub use standardize::StandardizeColumnNames;

use std::collections::HashMap;
use std::sync::Arc;

use polars::prelude::DataFrame;
use serde_json::{Map, Value, json};

use crate::error::Result;
use crate::types::Outcome;

/// One cleaning operation: `(dataset, parameters) -> Outcome`.
pub trait CleaningOperation: Send + Sync {
    /// Registry name of this operation.
    fn name(&self) -> &'static str;

    /// One-line description, also shown to the planning oracle.
    fn description(&self) -> &'static str;

    /// Check that a parameter map is well-typed for this operation.
    ///
    /// Unknown keys are ignored; only wrong types or out-of-range values
    /// are rejected. Used by planners to validate oracle-produced steps.
    fn validate_params(&self, params: &Map<String, Value>) -> std::result::Result<(), String> {
        let _ = params;
        Ok(())
    }

    /// Apply the operation. The input dataset is never mutated.
    fn execute(&self, df: &DataFrame, params: &Map<String, Value>) -> Result<Outcome>;
}

/// Fixed mapping from operation name to operation instance, shared
/// read-only by all planners and the agent.
pub struct OperationRegistry {
    ops: HashMap<&'static str, Arc<dyn CleaningOperation>>,
    order: Vec<&'static str>,
}

impl OperationRegistry {
    /// Registry with all five built-in operations.
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            ops: HashMap::new(),
            order: Vec::new(),
        };
        registry.register(Arc::new(InspectData));
        registry.register(Arc::new(StandardizeColumnNames));
        registry.register(Arc::new(RemoveDuplicates));
        registry.register(Arc::new(HandleMissingValues));
        registry.register(Arc::new(DetectOutliers));
        registry
    }

    /// Register an operation under its own name.
    pub fn register(&mut self, op: Arc<dyn CleaningOperation>) {
        let name = op.name();
        if self.ops.insert(name, op).is_none() {
            self.order.push(name);
        }
    }

    /// Look up an operation by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn CleaningOperation>> {
        self.ops.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    /// Operation names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.order.clone()
    }

    /// Name/description pairs for the planning oracle prompt.
    pub fn schemas(&self) -> Vec<Value> {
        self.order
            .iter()
            .filter_map(|name| self.ops.get(name))
            .map(|op| {
                json!({
                    "operation": op.name(),
                    "description": op.description(),
                })
            })
            .collect()
    }
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// =============================================================================
// Parameter extraction helpers
// =============================================================================

pub(crate) fn param_f64(params: &Map<String, Value>, key: &str) -> Option<f64> {
    params.get(key).and_then(Value::as_f64)
}

pub(crate) fn param_usize(params: &Map<String, Value>, key: &str) -> Option<usize> {
    params.get(key).and_then(Value::as_u64).map(|v| v as usize)
}

pub(crate) fn param_u64(params: &Map<String, Value>, key: &str) -> Option<u64> {
    params.get(key).and_then(Value::as_u64)
}

pub(crate) fn param_bool(params: &Map<String, Value>, key: &str) -> Option<bool> {
    params.get(key).and_then(Value::as_bool)
}

pub(crate) fn param_str<'a>(params: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}

pub(crate) fn param_str_list(params: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    params.get(key).and_then(Value::as_array).map(|arr| {
        arr.iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_contains_all_operations() {
        let registry = OperationRegistry::with_defaults();
        for name in [
            "inspect",
            "standardize_column_names",
            "remove_duplicates",
            "handle_missing_values",
            "detect_outliers",
        ] {
            assert!(registry.contains(name), "missing operation: {}", name);
        }
        assert!(!registry.contains("drop_everything"));
    }

    #[test]
    fn test_registry_names_keep_registration_order() {
        let registry = OperationRegistry::with_defaults();
        assert_eq!(registry.names()[0], "inspect");
        assert_eq!(registry.names().len(), 5);
    }

    #[test]
    fn test_registry_schemas() {
        let registry = OperationRegistry::with_defaults();
        let schemas = registry.schemas();
        assert_eq!(schemas.len(), 5);
        assert!(schemas[0]["description"].as_str().unwrap().len() > 10);
    }

    #[test]
    fn test_param_helpers() {
        let params: Map<String, Value> = serde_json::from_str(
            r#"{"threshold": 0.5, "k": 5, "remove": true, "keep": "last", "subset": ["a", "b"]}"#,
        )
        .unwrap();

        assert_eq!(param_f64(&params, "threshold"), Some(0.5));
        assert_eq!(param_usize(&params, "k"), Some(5));
        assert_eq!(param_bool(&params, "remove"), Some(true));
        assert_eq!(param_str(&params, "keep"), Some("last"));
        assert_eq!(
            param_str_list(&params, "subset"),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(param_f64(&params, "absent"), None);
    }
}
