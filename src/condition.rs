//! Conditional predicates gating fields and effects.
//!
//! A `dependsOn` list is an implicit AND of all its conditions; an empty
//! list is vacuously true.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;
use crate::path::{self, PathContext};
use crate::types::{display_string, json_type_name};

/// Closed operator vocabulary.
///
/// Legacy wire forms `"="` and `"matches()"` are accepted on input. Any
/// other token deserializes to [`Operator::Unknown`], whose evaluation
/// fails fast: an unrecognized operator is an authoring defect, not a
/// user-facing condition, and must not be swallowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    /// Strict equality, including `undefined === undefined`.
    #[serde(alias = "=")]
    Equals,
    /// Pipe-delimited alternation treated as a regular expression.
    #[serde(alias = "matches()")]
    Matches,
    /// Convenience alias for `EQUALS` against the undefined sentinel.
    IsUndefined,
    #[serde(other)]
    Unknown,
}

/// A single predicate over one resolved field value.
///
/// A missing `inputValue` is the undefined sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub input_field: String,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_value: Option<Value>,
}

impl Condition {
    pub fn equals(input_field: &str, input_value: impl Into<Value>) -> Self {
        Self {
            input_field: input_field.to_string(),
            operator: Operator::Equals,
            input_value: Some(input_value.into()),
        }
    }

    pub fn matches(input_field: &str, alternation: &str) -> Self {
        Self {
            input_field: input_field.to_string(),
            operator: Operator::Matches,
            input_value: Some(Value::String(alternation.to_string())),
        }
    }

    pub fn is_undefined(input_field: &str) -> Self {
        Self {
            input_field: input_field.to_string(),
            operator: Operator::IsUndefined,
            input_value: None,
        }
    }

    /// Evaluate against an already-resolved value (`None` = undefined).
    ///
    /// # Errors
    ///
    /// [`SchemaError::UnknownOperator`] for an unrecognized operator and
    /// [`SchemaError::InvalidPattern`] for a `MATCHES` pattern that is not
    /// a string or does not compile.
    pub fn evaluate(&self, resolved: Option<&Value>) -> Result<bool, SchemaError> {
        match self.operator {
            Operator::Equals => Ok(resolved == self.input_value.as_ref()),
            Operator::IsUndefined => Ok(resolved.is_none()),
            Operator::Matches => {
                let pattern = match &self.input_value {
                    Some(Value::String(s)) => s,
                    Some(other) => {
                        return Err(SchemaError::InvalidPattern {
                            pattern: other.to_string(),
                            message: format!("expected string, got {}", json_type_name(other)),
                        })
                    }
                    None => {
                        return Err(SchemaError::InvalidPattern {
                            pattern: String::new(),
                            message: "pattern is missing".to_string(),
                        })
                    }
                };
                let Some(value) = resolved else {
                    return Ok(false);
                };
                let regex = Regex::new(pattern).map_err(|e| SchemaError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
                Ok(regex.is_match(&display_string(value)))
            }
            Operator::Unknown => Err(SchemaError::UnknownOperator {
                input_field: self.input_field.clone(),
            }),
        }
    }

    /// Resolve `inputField` in `ctx`, then evaluate.
    pub fn evaluate_in(&self, ctx: &PathContext) -> Result<bool, SchemaError> {
        let resolved = path::resolve(&self.input_field, ctx)?;
        self.evaluate(resolved.as_ref())
    }
}

/// True iff every condition holds (empty slice is vacuously true).
pub fn evaluate_all(conditions: &[Condition], ctx: &PathContext) -> Result<bool, SchemaError> {
    for condition in conditions {
        if !condition.evaluate_in(ctx)? {
            return Ok(false);
        }
    }
    Ok(true)
}
