//! Fraymakers Metadata Engine
//!
//! Context-sensitive metadata schemas and version-gated migrations for
//! Fraymakers asset documents.
//!
//! The library has two halves. The schema assembler turns an asset's
//! current classification into an ordered list of [`MetadataDefinition`]
//! records: editable fields plus conditional default-value effects, with
//! user-authored presets folded in as the final fragments. The migration
//! engines bring stale documents and plugin configurations forward to the
//! current version through ordered, version-gated rewrite steps, emitting
//! whole replacement nodes instead of mutating their input.
//!
//! # Example
//!
//! ```
//! use fray_metadata::{EngineConfig, PresetRegistry, SchemaAssembler};
//! use serde_json::json;
//!
//! let asset = json!({
//!     "pluginMetadata": {
//!         "com.fraymakers.FraymakersMetadata": { "objectType": "CHARACTER" }
//!     }
//! });
//!
//! let config = EngineConfig::default();
//! let registry = PresetRegistry::new();
//! let definitions = SchemaAssembler::new(&config, &registry)
//!     .definitions(&asset)
//!     .unwrap();
//!
//! // Characters get collision-box layer rules on top of the universal set
//! assert!(definitions
//!     .iter()
//!     .any(|d| d.fields.iter().any(|f| f.name == "collisionBoxType")));
//! ```
//!
//! # Condition Operators
//!
//! | Operator | Semantics |
//! |----------------|-------------------------------------------------|
//! | `EQUALS` | Strict equality, including the undefined sentinel |
//! | `MATCHES` | Regex over the value's display string |
//! | `IS_UNDEFINED` | True iff the path resolves to nothing |
//!
//! Legacy documents spell these `"="` and `"matches()"`; both forms
//! deserialize to the same operators.

mod assembler;
mod condition;
mod config;
mod effect;
mod error;
mod migrate;
pub mod path;
mod presets;
mod types;
mod version;

pub use assembler::{validate_definitions, SchemaAssembler};
pub use condition::{evaluate_all, Condition, Operator};
pub use config::{ConfigMigrationEngine, ConfigOutcome, PluginConfig};
pub use effect::Effect;
pub use error::{PathError, SchemaError};
pub use migrate::{Changeset, MigrationEngine, MigrationOutcome};
pub use presets::{
    parse_numeric, BodyFields, BodyPreset, BoxKind, BoxPreset, BoxStyle, PresetFragment,
    PresetRegistry, BODY_PRESET_FIELD,
};
pub use types::{
    display_string, DropdownOption, EngineConfig, FieldDefinition, FieldType, MetadataDefinition,
    ObjectType, OwnerKind, DEFAULT_PLUGIN_ID,
};
pub use version::{compare, compare_declared, parse_version, VersionSpan};
