//! Integration tests for document and configuration migration.

use fray_metadata::{
    ConfigMigrationEngine, ConfigOutcome, EngineConfig, MigrationEngine, MigrationOutcome,
    PluginConfig, DEFAULT_PLUGIN_ID,
};
use serde_json::{json, Value};

fn engine() -> MigrationEngine {
    MigrationEngine::new(EngineConfig::default())
}

fn migrated(asset: &Value) -> fray_metadata::Changeset {
    match engine().migrate(asset).unwrap() {
        MigrationOutcome::Migrated(changeset) => changeset,
        MigrationOutcome::UpToDate => panic!("expected a changeset"),
    }
}

/// Splice a changeset back into a document the way the host store does:
/// replace nodes by `$id` and overwrite the root plugin block.
fn splice(asset: &Value, changeset: &fray_metadata::Changeset) -> Value {
    let mut result = asset.clone();
    result["pluginMetadata"] = changeset.plugin_metadata.clone();
    for (collection, updates) in [
        ("layers", &changeset.updated_layers),
        ("keyframes", &changeset.updated_keyframes),
        ("symbols", &changeset.updated_symbols),
    ] {
        let Some(nodes) = result.get_mut(collection).and_then(Value::as_array_mut) else {
            continue;
        };
        for update in updates {
            if let Some(slot) = nodes.iter_mut().find(|n| n.get("$id") == update.get("$id")) {
                *slot = update.clone();
            }
        }
    }
    result
}

// === Document Migration Tests ===

mod document {
    use super::*;

    #[test]
    fn holdbox_document_migrates_end_to_end() {
        // A 0.0.5 document crosses every unbounded-below step on its way
        // to the current version.
        let asset = json!({
            "pluginMetadata": { DEFAULT_PLUGIN_ID: { "version": "0.0.5" } },
            "layers": [{
                "$id": "layer-1",
                "type": "COLLISION_BOX",
                "name": "holdbox0",
                "keyframes": ["kf-1"],
                "pluginMetadata": { DEFAULT_PLUGIN_ID: { "collisionBoxType": "HOLD_BOX" } }
            }],
            "keyframes": [{ "$id": "kf-1", "type": "COLLISION_BOX", "symbol": "sym-1" }],
            "symbols": [{
                "$id": "sym-1",
                "type": "COLLISION_BOX",
                "x": 0.0, "y": 0.0,
                "scaleX": 50.0, "scaleY": 80.0,
                "pivotX": 0.0, "pivotY": 0.0
            }]
        });

        let changeset = migrated(&asset);

        let layer = &changeset.updated_layers[0];
        assert_eq!(layer["type"], json!("POINT"));
        assert_eq!(layer["name"], json!("grabholdpoint0"));
        let block = &layer["pluginMetadata"][DEFAULT_PLUGIN_ID];
        assert_eq!(block.get("collisionBoxType"), None);
        assert_eq!(block["pointType"], json!("GRAB_HOLD_POINT"));

        let symbol = &changeset.updated_symbols[0];
        assert_eq!(symbol["x"], json!(25.0));
        assert_eq!(symbol["y"], json!(40.0));

        assert_eq!(changeset.version, "0.1.2");
    }

    #[test]
    fn rerun_after_splice_is_up_to_date() {
        let asset = json!({
            "pluginMetadata": { DEFAULT_PLUGIN_ID: { "version": "0.0.5" } },
            "layers": [{
                "$id": "layer-1",
                "type": "COLLISION_BOX",
                "name": "holdbox0",
                "keyframes": [],
                "pluginMetadata": { DEFAULT_PLUGIN_ID: { "collisionBoxType": "HOLD_BOX" } }
            }],
            "keyframes": [],
            "symbols": []
        });

        let changeset = migrated(&asset);
        let spliced = splice(&asset, &changeset);

        assert_eq!(
            engine().migrate(&spliced).unwrap(),
            MigrationOutcome::UpToDate
        );
        // The input tree was never touched
        assert_eq!(asset["layers"][0]["type"], json!("COLLISION_BOX"));
    }

    #[test]
    fn middle_chain_entry_skips_earlier_steps() {
        // 0.0.15 is past the shadow-light-index strip; only the
        // shadowLayerIndex swap applies to this layer.
        let asset = json!({
            "pluginMetadata": { DEFAULT_PLUGIN_ID: { "version": "0.0.15" } },
            "layers": [{
                "$id": "layer-1",
                "type": "POINT",
                "name": "light",
                "pluginMetadata": { DEFAULT_PLUGIN_ID: {
                    "pointType": "SHADOW_LIGHT_POINT",
                    "index": 4,
                    "shadowLayerIndex": 2
                } }
            }]
        });

        let changeset = migrated(&asset);
        let block = &changeset.updated_layers[0]["pluginMetadata"][DEFAULT_PLUGIN_ID];
        assert_eq!(block["index"], json!(4));
        assert_eq!(block["shadowLayerIds"], json!(["2"]));
        assert_eq!(block.get("shadowLayerIndex"), None);
    }

    #[test]
    fn very_old_document_runs_the_full_chain() {
        let asset = json!({
            "pluginMetadata": { DEFAULT_PLUGIN_ID: {
                "version": "0.0.1",
                "spriteType": "CHARACTER"
            } },
            "layers": [{
                "$id": "layer-1",
                "type": "CONTAINER",
                "name": "Objects",
                "pluginMetadata": { DEFAULT_PLUGIN_ID: { "containerType": "OBJECTS_CONTAINER" } }
            }],
            "symbols": [{
                "$id": "sym-1",
                "type": "IMAGE",
                "pluginMetadata": { DEFAULT_PLUGIN_ID: { "objectType": "CHARACTER" } }
            }]
        });

        let changeset = migrated(&asset);

        assert_eq!(
            changeset.plugin_metadata[DEFAULT_PLUGIN_ID].get("spriteType"),
            None
        );
        assert_eq!(
            changeset.updated_symbols[0]["pluginMetadata"][DEFAULT_PLUGIN_ID].get("objectType"),
            None
        );
        assert_eq!(changeset.updated_layers[0]["name"], json!("Characters"));
        assert_eq!(changeset.version, "0.1.2");
    }

    #[test]
    fn changeset_wire_format_omits_empty_collections() {
        let asset = json!({
            "pluginMetadata": { DEFAULT_PLUGIN_ID: { "version": "0.1.0" } }
        });
        let changeset = migrated(&asset);
        let value = serde_json::to_value(&changeset).unwrap();
        assert_eq!(value["version"], json!("0.1.2"));
        assert_eq!(value.get("updatedLayers"), None);
        assert_eq!(value.get("updatedKeyframes"), None);
        assert_eq!(value.get("updatedSymbols"), None);
    }
}

// === Configuration Migration Tests ===

mod configuration {
    use super::*;

    #[test]
    fn stale_config_converges_and_reruns_clean() {
        let config: PluginConfig = serde_json::from_value(json!({
            "version": "0.0.18",
            "collisionBodyLayerPresets": [{
                "id": "b1", "name": "Tall",
                "foot": 0.0, "head": 120.0,
                "hipWidth": 40.0, "hipXOffset": 0.0, "hipYOffset": 0.0
            }]
        }))
        .unwrap();

        let engine = ConfigMigrationEngine::new(EngineConfig::default());
        let ConfigOutcome::Migrated(first) = engine.migrate(&config).unwrap() else {
            panic!("expected a migrated config");
        };
        // 0.0.18 predates the box-preset reset but not the body reset
        assert_eq!(first.collision_body_layer_presets.len(), 1);
        assert!(first.collision_box_layer_presets.is_empty());
        assert_eq!(first.version.as_deref(), Some("0.1.2"));

        assert_eq!(engine.migrate(&first).unwrap(), ConfigOutcome::UpToDate);
    }

    #[test]
    fn defaults_deserialize_from_empty_record() {
        let config: PluginConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config.version, None);
        assert!(config.collision_body_layer_presets.is_empty());
        assert!(config.collision_box_layer_presets.is_empty());
        assert_eq!(config.active_collision_box_layer_preset, None);
    }
}
