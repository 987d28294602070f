//! Plugin-level configuration record and its migration chain.
//!
//! The configuration is a flat record: a version string plus the two
//! preset collections. Its migration shares the document engine's shape
//! (ordered steps gated by half-open version spans, forced convergence)
//! but rewrites the record in place on a clone rather than emitting
//! per-node deltas.

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::presets::{BodyPreset, BoxPreset, PresetRegistry};
use crate::types::EngineConfig;
use crate::version::{self, VersionSpan};

/// The persisted plugin configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub collision_body_layer_presets: Vec<BodyPreset>,
    #[serde(default)]
    pub active_collision_box_layer_preset: Option<String>,
    #[serde(default)]
    pub collision_box_layer_presets: Vec<BoxPreset>,
}

impl PluginConfig {
    /// Build the session registry backing schema assembly.
    pub fn registry(&self) -> PresetRegistry {
        PresetRegistry::from_parts(
            self.collision_body_layer_presets.clone(),
            self.collision_box_layer_presets.clone(),
            self.active_collision_box_layer_preset.clone(),
        )
    }
}

/// Result of one configuration migration pass.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigOutcome {
    UpToDate,
    Migrated(PluginConfig),
}

struct ConfigStep {
    span: VersionSpan,
    target: Version,
    apply: fn(&mut PluginConfig),
}

/// Applies the ordered configuration migration chain.
pub struct ConfigMigrationEngine {
    config: EngineConfig,
    steps: Vec<ConfigStep>,
}

impl ConfigMigrationEngine {
    pub fn new(config: EngineConfig) -> Self {
        let steps = vec![
            // Body presets predate 0.0.12; anything older starts empty
            ConfigStep {
                span: VersionSpan::below(Version::new(0, 0, 12)),
                target: Version::new(0, 0, 12),
                apply: |c| c.collision_body_layer_presets = Vec::new(),
            },
            // Box presets were restructured at 0.0.20
            ConfigStep {
                span: VersionSpan::below(Version::new(0, 0, 20)),
                target: Version::new(0, 0, 20),
                apply: |c| {
                    c.active_collision_box_layer_preset = None;
                    c.collision_box_layer_presets = Vec::new();
                },
            },
            // The holdbox kind was retired at 0.1.1
            ConfigStep {
                span: VersionSpan::below(Version::new(0, 1, 1)),
                target: Version::new(0, 1, 1),
                apply: |c| {
                    for preset in &mut c.collision_box_layer_presets {
                        preset.styles.remove("holdbox");
                    }
                },
            },
        ];
        Self { config, steps }
    }

    /// Migrate a configuration record, clone-on-write.
    ///
    /// # Errors
    ///
    /// [`SchemaError::InvalidVersion`] when the record declares a version
    /// that is not `MAJOR.MINOR.PATCH`.
    pub fn migrate(&self, input: &PluginConfig) -> Result<ConfigOutcome, SchemaError> {
        let declared = input
            .version
            .as_deref()
            .map(version::parse_version)
            .transpose()?;

        if declared.as_ref() == Some(&self.config.current_version) {
            return Ok(ConfigOutcome::UpToDate);
        }

        let mut migrated = input.clone();
        let mut logical = declared;

        for step in &self.steps {
            if step.span.contains(logical.as_ref()) {
                (step.apply)(&mut migrated);
                logical = Some(step.target.clone());
            }
        }

        migrated.version = Some(self.config.current_version.to_string());
        Ok(ConfigOutcome::Migrated(migrated))
    }
}
