//! Version-gated document migration over asset metadata trees.
//!
//! The engine walks a document's `layers`/`keyframes`/`symbols`
//! collections and produces whole replacement nodes, clone-on-write; the
//! input tree is never mutated. Steps run in ascending version order, each
//! gated by a half-open [`VersionSpan`] checked against the *logical*
//! version, which advances as steps fire. Step predicates always read the
//! original tree, never each other's deltas.

use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::SchemaError;
use crate::types::EngineConfig;
use crate::version::{self, VersionSpan};

/// Whole replacement nodes to splice back into the host's document store,
/// plus the document's new root plugin block.
///
/// Empty collections are omitted on the wire; the host splices by node id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Changeset {
    pub version: String,
    /// Root `pluginMetadata` mapping with the migrated block inside.
    pub plugin_metadata: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub updated_layers: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub updated_keyframes: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub updated_symbols: Vec<Value>,
}

/// Result of one migration pass.
///
/// A document already at the target version yields [`UpToDate`], never an
/// empty changeset; the two are distinguishable to the caller.
///
/// [`UpToDate`]: MigrationOutcome::UpToDate
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationOutcome {
    UpToDate,
    Migrated(Changeset),
}

struct MigrationStep {
    span: VersionSpan,
    target: Version,
    apply: fn(&mut StepContext, &mut Deltas),
}

struct StepContext<'a> {
    asset: &'a Value,
    plugin_id: &'a str,
    /// The document's root plugin block, migrated in place across steps.
    plugin_block: Map<String, Value>,
}

impl StepContext<'_> {
    fn nodes<'v>(&self, asset: &'v Value, collection: &str) -> &'v [Value] {
        // Missing collections are skipped silently; not every document
        // ever had the feature being migrated.
        asset
            .get(collection)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn block<'v>(&self, node: &'v Value) -> Option<&'v Value> {
        node.get("pluginMetadata")?.get(self.plugin_id)
    }

    fn block_mut<'v>(&self, node: &'v mut Value) -> Option<&'v mut Map<String, Value>> {
        node.get_mut("pluginMetadata")?
            .get_mut(self.plugin_id)?
            .as_object_mut()
    }
}

#[derive(Default)]
struct Deltas {
    layers: Vec<Value>,
    keyframes: Vec<Value>,
    symbols: Vec<Value>,
}

/// Replace an earlier delta for the same node, keyed by `$id`; a later
/// step that re-touches a node wins wholesale.
fn push_update(deltas: &mut Vec<Value>, node: Value) {
    let id = node.get("$id").cloned();
    if let Some(existing) = deltas
        .iter_mut()
        .find(|n| id.is_some() && n.get("$id") == id.as_ref())
    {
        *existing = node;
    } else {
        deltas.push(node);
    }
}

/// Applies the ordered document migration chain.
pub struct MigrationEngine {
    config: EngineConfig,
    steps: Vec<MigrationStep>,
}

impl MigrationEngine {
    pub fn new(config: EngineConfig) -> Self {
        let steps = vec![
            MigrationStep {
                span: VersionSpan::new(Some(Version::new(0, 0, 1)), Version::new(0, 0, 7)),
                target: Version::new(0, 0, 8),
                apply: strip_sprite_type_and_symbol_object_type,
            },
            MigrationStep {
                span: VersionSpan::new(Some(Version::new(0, 0, 8)), Version::new(0, 0, 10)),
                target: Version::new(0, 0, 10),
                apply: strip_shadow_light_point_index,
            },
            MigrationStep {
                span: VersionSpan::new(Some(Version::new(0, 0, 10)), Version::new(0, 0, 14)),
                target: Version::new(0, 0, 14),
                apply: rename_container_types,
            },
            MigrationStep {
                span: VersionSpan::below(Version::new(0, 0, 19)),
                target: Version::new(0, 0, 19),
                apply: shadow_layer_index_to_ids,
            },
            MigrationStep {
                span: VersionSpan::below(Version::new(0, 0, 22)),
                target: Version::new(0, 0, 22),
                apply: holdboxes_to_grab_hold_points,
            },
        ];
        Self { config, steps }
    }

    /// One full synchronous pass over the document.
    ///
    /// Returns [`MigrationOutcome::UpToDate`] when the declared version
    /// already equals the target. Otherwise runs every step whose span
    /// contains the current logical version and returns the accumulated
    /// changeset with the version forced to the target, whether or not
    /// any step fired.
    ///
    /// # Errors
    ///
    /// [`SchemaError::InvalidVersion`] when the document declares a
    /// version that is not `MAJOR.MINOR.PATCH`.
    pub fn migrate(&self, asset: &Value) -> Result<MigrationOutcome, SchemaError> {
        let plugin_block = asset
            .get("pluginMetadata")
            .and_then(|m| m.get(&self.config.plugin_id))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let declared = plugin_block
            .get("version")
            .and_then(Value::as_str)
            .map(version::parse_version)
            .transpose()?;

        if declared.as_ref() == Some(&self.config.current_version) {
            return Ok(MigrationOutcome::UpToDate);
        }

        let mut ctx = StepContext {
            asset,
            plugin_id: &self.config.plugin_id,
            plugin_block,
        };
        let mut deltas = Deltas::default();
        let mut logical = declared;

        for step in &self.steps {
            if step.span.contains(logical.as_ref()) {
                (step.apply)(&mut ctx, &mut deltas);
                logical = Some(step.target.clone());
            }
        }

        // Converge regardless of how many steps fired
        let target = self.config.current_version.to_string();
        ctx.plugin_block
            .insert("version".to_string(), Value::String(target.clone()));

        // Carry sibling plugins' root blocks through untouched; only this
        // engine's block is rewritten.
        let mut root = asset
            .get("pluginMetadata")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        root.insert(self.config.plugin_id.clone(), Value::Object(ctx.plugin_block));

        Ok(MigrationOutcome::Migrated(Changeset {
            version: target,
            plugin_metadata: Value::Object(root),
            updated_layers: deltas.layers,
            updated_keyframes: deltas.keyframes,
            updated_symbols: deltas.symbols,
        }))
    }
}

/// 0.0.8: drop the retired root `spriteType` field and `objectType` from
/// symbol blocks; classification lives on the asset alone now.
fn strip_sprite_type_and_symbol_object_type(ctx: &mut StepContext, deltas: &mut Deltas) {
    ctx.plugin_block.remove("spriteType");
    for symbol in ctx.nodes(ctx.asset, "symbols") {
        let has_object_type = ctx
            .block(symbol)
            .map(|b| b.get("objectType").is_some())
            .unwrap_or(false);
        if has_object_type {
            let mut clone = symbol.clone();
            if let Some(block) = ctx.block_mut(&mut clone) {
                block.remove("objectType");
            }
            push_update(&mut deltas.symbols, clone);
        }
    }
}

/// 0.0.10: shadow light points no longer carry an index.
fn strip_shadow_light_point_index(ctx: &mut StepContext, deltas: &mut Deltas) {
    for layer in ctx.nodes(ctx.asset, "layers") {
        let is_shadow_point = layer.get("type") == Some(&json!("POINT"))
            && ctx
                .block(layer)
                .map(|b| b.get("pointType") == Some(&json!("SHADOW_LIGHT_POINT")))
                .unwrap_or(false);
        if is_shadow_point {
            let mut clone = layer.clone();
            if let Some(block) = ctx.block_mut(&mut clone) {
                block.remove("index");
            }
            push_update(&mut deltas.layers, clone);
        }
    }
}

/// 0.0.14: the old coarse container types split into the finer set.
fn rename_container_types(ctx: &mut StepContext, deltas: &mut Deltas) {
    let renames = [
        ("BACKGROUND_CONTAINER", "BACKGROUND_EFFECTS_CONTAINER", "Background Effects"),
        ("OBJECTS_CONTAINER", "CHARACTERS_CONTAINER", "Characters"),
        ("FOREGROUND_CONTAINER", "FOREGROUND_EFFECTS_CONTAINER", "Foreground Effects"),
    ];

    for layer in ctx.nodes(ctx.asset, "layers") {
        if layer.get("type") != Some(&json!("CONTAINER")) {
            continue;
        }
        let Some(container_type) = ctx
            .block(layer)
            .and_then(|b| b.get("containerType"))
            .and_then(Value::as_str)
        else {
            continue;
        };
        if let Some((_, new_type, new_name)) =
            renames.iter().find(|(old, _, _)| *old == container_type)
        {
            let mut clone = layer.clone();
            clone["name"] = json!(new_name);
            if let Some(block) = ctx.block_mut(&mut clone) {
                block.insert("containerType".to_string(), json!(new_type));
            }
            push_update(&mut deltas.layers, clone);
        }
    }
}

/// 0.0.19: single `shadowLayerIndex` becomes the `shadowLayerIds` list.
fn shadow_layer_index_to_ids(ctx: &mut StepContext, deltas: &mut Deltas) {
    for layer in ctx.nodes(ctx.asset, "layers") {
        if layer.get("type") != Some(&json!("POINT")) {
            continue;
        }
        let Some(index) = ctx.block(layer).and_then(|b| b.get("shadowLayerIndex")) else {
            continue;
        };
        let ids = match index.as_f64() {
            Some(i) if i >= 0.0 => json!([crate::types::display_string(index)]),
            _ => json!([]),
        };
        let mut clone = layer.clone();
        if let Some(block) = ctx.block_mut(&mut clone) {
            block.insert("shadowLayerIds".to_string(), ids);
            block.remove("shadowLayerIndex");
        }
        push_update(&mut deltas.layers, clone);
    }
}

/// 0.0.22: holdbox collision-box layers become grab hold points.
///
/// Cascades through the layer's keyframes to their symbols: each symbol
/// collapses from a scaled box to a point at the box center.
fn holdboxes_to_grab_hold_points(ctx: &mut StepContext, deltas: &mut Deltas) {
    let holdbox_name = regex::Regex::new(r"^holdbox\d+").expect("holdbox pattern");
    let mut keyframe_ids = Vec::new();

    for layer in ctx.nodes(ctx.asset, "layers") {
        let is_holdbox = layer.get("type") == Some(&json!("COLLISION_BOX"))
            && layer
                .get("name")
                .and_then(Value::as_str)
                .map(|name| holdbox_name.is_match(name))
                .unwrap_or(false);
        if !is_holdbox {
            continue;
        }

        let mut clone = layer.clone();
        clone["type"] = json!("POINT");
        if let Some(name) = layer.get("name").and_then(Value::as_str) {
            clone["name"] = json!(name.replacen("holdbox", "grabholdpoint", 1));
        }
        if let Some(block) = ctx.block_mut(&mut clone) {
            if block.remove("collisionBoxType").is_some() {
                block.insert("pointType".to_string(), json!("GRAB_HOLD_POINT"));
            }
        }
        if let Some(obj) = clone.as_object_mut() {
            obj.remove("defaultAlpha");
            obj.remove("defaultColor");
        }

        if let Some(ids) = layer.get("keyframes").and_then(Value::as_array) {
            keyframe_ids.extend(ids.iter().cloned());
        }
        push_update(&mut deltas.layers, clone);
    }

    let mut symbol_ids = Vec::new();
    for keyframe in ctx.nodes(ctx.asset, "keyframes") {
        let is_holdbox_keyframe = keyframe.get("type") == Some(&json!("COLLISION_BOX"))
            && keyframe
                .get("$id")
                .map(|id| keyframe_ids.contains(id))
                .unwrap_or(false);
        if !is_holdbox_keyframe {
            continue;
        }

        let mut clone = keyframe.clone();
        clone["type"] = json!("POINT");
        if let Some(symbol) = keyframe.get("symbol") {
            symbol_ids.push(symbol.clone());
        }
        push_update(&mut deltas.keyframes, clone);
    }

    for symbol in ctx.nodes(ctx.asset, "symbols") {
        let is_holdbox_symbol = symbol.get("type") == Some(&json!("COLLISION_BOX"))
            && symbol
                .get("$id")
                .map(|id| symbol_ids.contains(id))
                .unwrap_or(false);
        if !is_holdbox_symbol {
            continue;
        }

        let mut clone = symbol.clone();
        clone["type"] = json!("POINT");

        let x = clone.get("x").and_then(Value::as_f64).unwrap_or(0.0);
        let y = clone.get("y").and_then(Value::as_f64).unwrap_or(0.0);
        let scale_x = clone.get("scaleX").and_then(Value::as_f64).unwrap_or(0.0);
        let scale_y = clone.get("scaleY").and_then(Value::as_f64).unwrap_or(0.0);
        clone["x"] = json!(x + scale_x / 2.0);
        clone["y"] = json!(y + scale_y / 2.0);

        if let Some(obj) = clone.as_object_mut() {
            obj.remove("pivotX");
            obj.remove("pivotY");
            obj.remove("scaleX");
            obj.remove("scaleY");
        }
        push_update(&mut deltas.symbols, clone);
    }
}
