//! Conditional default-value effects and `{{Path}}` template resolution.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::{evaluate_all, Condition};
use crate::error::SchemaError;
use crate::path::{self, PathContext};
use crate::types::display_string;

/// A rule that writes `outputValue` into `outputField` when its conditions
/// hold.
///
/// `outputValue` may be a literal or a template string containing
/// `{{Path}}` placeholders. Within one definition, when two effects share
/// an `outputField` and both match, the later one in array order wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    #[serde(default)]
    pub depends_on: Vec<Condition>,
    pub output_field: String,
    pub output_value: Value,
}

impl Effect {
    pub fn new(
        depends_on: Vec<Condition>,
        output_field: &str,
        output_value: impl Into<Value>,
    ) -> Self {
        Self {
            depends_on,
            output_field: output_field.to_string(),
            output_value: output_value.into(),
        }
    }

    /// True iff every `dependsOn` condition holds in `ctx`.
    pub fn applies(&self, ctx: &PathContext) -> Result<bool, SchemaError> {
        evaluate_all(&self.depends_on, ctx)
    }

    /// Compute the output value for a matched effect.
    ///
    /// Literals (non-strings, or strings without `{{`) are returned as-is.
    /// Template strings get a single left-to-right substitution pass, no
    /// recursive re-substitution: each `{{Path}}` is replaced by the
    /// resolved value's display string, or by the empty string when the
    /// path resolves to nothing.
    pub fn resolve_output(&self, ctx: &PathContext) -> Result<Value, SchemaError> {
        let Value::String(template) = &self.output_value else {
            return Ok(self.output_value.clone());
        };
        if !template.contains("{{") {
            return Ok(self.output_value.clone());
        }

        let regex = placeholder_regex();
        let mut output = String::new();
        let mut cursor = 0;

        for caps in regex.captures_iter(template) {
            let whole = caps.get(0).expect("capture 0 always present");
            output.push_str(&template[cursor..whole.start()]);

            let placeholder_path = caps[1].trim();
            if let Some(value) = path::resolve(placeholder_path, ctx)? {
                output.push_str(&display_string(&value));
            }
            cursor = whole.end();
        }
        output.push_str(&template[cursor..]);

        Ok(Value::String(output))
    }
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("placeholder pattern"))
}
