//! Error types for schema assembly, path resolution and migration.

use thiserror::Error;

/// Fatal author-time defects in rule definitions or engine input.
///
/// These indicate a bug in the rule tables or a corrupt document header,
/// not a user-data condition. They abort the operation that raised them.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unrecognized condition operator for input field \"{input_field}\"")]
    UnknownOperator { input_field: String },

    #[error("malformed path \"{path}\": {message}")]
    MalformedPath { path: String, message: String },

    #[error("invalid match pattern \"{pattern}\": {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("template field \"{field}\" cannot exist for owner kind {owner}")]
    UnknownTemplateField { field: String, owner: String },

    #[error("invalid version \"{value}\": {message}")]
    InvalidVersion { value: String, message: String },
}

/// A path hop that walked above the tree root.
///
/// Distinct from [`SchemaError`]: the lenient resolver treats this as
/// resolution to `undefined` (absence is data), while malformed path
/// syntax escalates to `SchemaError::MalformedPath`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("path \"{path}\" walks above the tree root")]
pub struct PathError {
    /// The full path whose `parent` hops ran out of ancestors.
    pub path: String,
}

impl SchemaError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        // All variants are schema/data defects, never I/O.
        2
    }
}
