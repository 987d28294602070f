//! Integration tests for schema assembly and effect evaluation.

use fray_metadata::path::PathContext;
use fray_metadata::{
    Condition, EngineConfig, MetadataDefinition, Operator, OwnerKind, PresetRegistry,
    SchemaAssembler, DEFAULT_PLUGIN_ID,
};
use serde_json::{json, Map, Value};

fn asset(object_type: &str) -> Value {
    json!({
        "pluginMetadata": { DEFAULT_PLUGIN_ID: { "objectType": object_type } }
    })
}

fn assemble(registry: &PresetRegistry, asset: &Value) -> Vec<MetadataDefinition> {
    let config = EngineConfig::default();
    SchemaAssembler::new(&config, registry)
        .definitions(asset)
        .unwrap()
}

fn definition_for(definitions: &[MetadataDefinition], owner: OwnerKind) -> MetadataDefinition {
    definitions
        .iter()
        .find(|d| d.owner_types.contains(&owner))
        .cloned()
        .unwrap_or_else(|| panic!("no definition for {}", owner.as_str()))
}

/// Apply a definition's effects to a node the way the host does: for
/// every effect whose conditions hold, write the resolved output into the
/// field map. Later effects overwrite earlier ones.
fn apply_effects(definition: &MetadataDefinition, ctx: &PathContext) -> Map<String, Value> {
    let mut outputs = Map::new();
    for effect in &definition.effects {
        if effect.applies(ctx).unwrap() {
            outputs.insert(
                effect.output_field.clone(),
                effect.resolve_output(ctx).unwrap(),
            );
        }
    }
    outputs
}

// === Composition Tests ===

mod composition {
    use super::*;

    #[test]
    fn every_classification_starts_with_universal_fragments() {
        let registry = PresetRegistry::new();
        for object_type in ["CHARACTER", "STAGE", "MATCH_RULES", "COLLISION_AREA"] {
            let definitions = assemble(&registry, &asset(object_type));
            assert_eq!(
                definitions[0].owner_types,
                vec![OwnerKind::SpriteEntityAssetMetadata]
            );
            assert_eq!(
                definitions[1].owner_types,
                vec![OwnerKind::ScriptAssetMetadata]
            );
        }
    }

    #[test]
    fn all_game_object_kinds_share_layer_rules() {
        let registry = PresetRegistry::new();
        for object_type in [
            "CHARACTER",
            "PROJECTILE",
            "ASSIST",
            "ENTITY",
            "CUSTOM_GAME_OBJECT",
        ] {
            let definitions = assemble(&registry, &asset(object_type));
            let kinds: Vec<OwnerKind> = definitions
                .iter()
                .flat_map(|d| d.owner_types.iter().copied())
                .collect();
            assert!(kinds.contains(&OwnerKind::CollisionBoxLayerMetadata));
            assert!(kinds.contains(&OwnerKind::PointLayerMetadata));
            assert!(kinds.contains(&OwnerKind::CollisionBodyLayerMetadata));
        }
    }

    #[test]
    fn match_rules_gets_no_layer_rules() {
        let registry = PresetRegistry::new();
        let definitions = assemble(&registry, &asset("MATCH_RULES"));
        assert_eq!(definitions.len(), 5);
    }

    #[test]
    fn stage_box_layer_offers_death_and_camera_boxes() {
        let registry = PresetRegistry::new();
        let definitions = assemble(&registry, &asset("STAGE"));
        let box_def = definition_for(&definitions, OwnerKind::CollisionBoxLayerMetadata);
        let labels: Vec<&str> = box_def.fields[0]
            .options
            .as_ref()
            .unwrap()
            .iter()
            .map(|o| o.label.as_str())
            .collect();
        assert_eq!(
            labels,
            [
                "None",
                "Death Box",
                "Camera Box",
                "Rect Collision Area",
                "Rect Structure"
            ]
        );
    }

    #[test]
    fn container_options_and_names_stay_in_sync() {
        let registry = PresetRegistry::new();
        let definitions = assemble(&registry, &asset("STAGE"));
        let containers = definition_for(&definitions, OwnerKind::ContainerLayerMetadata);

        let options = containers.fields[0].options.as_ref().unwrap();
        // "None" plus one naming effect per concrete container type
        assert_eq!(options.len(), containers.effects.len() + 1);
    }
}

// === Effect Evaluation Tests ===

mod effect_evaluation {
    use super::*;

    fn layer(block: Value) -> Value {
        json!({
            "name": "layer",
            "pluginMetadata": { DEFAULT_PLUGIN_ID: block }
        })
    }

    #[test]
    fn hitbox_layer_gets_name_color_and_alpha() {
        let registry = PresetRegistry::new();
        let definitions = assemble(&registry, &asset("CHARACTER"));
        let box_def = definition_for(&definitions, OwnerKind::CollisionBoxLayerMetadata);

        let node = layer(json!({ "collisionBoxType": "HIT_BOX", "index": 2 }));
        let ctx = PathContext::root(&node, DEFAULT_PLUGIN_ID);
        let outputs = apply_effects(&box_def, &ctx);

        assert_eq!(outputs["name"], json!("hitbox2"));
        assert_eq!(outputs["defaultColor"], json!("0xff0000"));
        assert_eq!(outputs["defaultAlpha"], json!(0.5));
    }

    #[test]
    fn missing_index_is_ensured_before_naming() {
        let registry = PresetRegistry::new();
        let definitions = assemble(&registry, &asset("CHARACTER"));
        let box_def = definition_for(&definitions, OwnerKind::CollisionBoxLayerMetadata);

        let node = layer(json!({ "collisionBoxType": "HURT_BOX" }));
        let ctx = PathContext::root(&node, DEFAULT_PLUGIN_ID);
        let outputs = apply_effects(&box_def, &ctx);

        // The index-ensure effect fires; the template still reads the
        // original tree, where the index is absent.
        assert_eq!(outputs["pluginMetadata[].index"], json!(0));
        assert_eq!(outputs["name"], json!("hurtbox"));
    }

    #[test]
    fn later_effect_wins_on_shared_output_field() {
        let registry = PresetRegistry::new();
        let definitions = assemble(&registry, &asset("STAGE"));
        let box_def = definition_for(&definitions, OwnerKind::CollisionBoxLayerMetadata);

        // RECT_STRUCTURE matches an early per-kind color effect and the
        // later structure-specific one; array order decides.
        let node = layer(json!({ "collisionBoxType": "RECT_STRUCTURE" }));
        let ctx = PathContext::root(&node, DEFAULT_PLUGIN_ID);
        let outputs = apply_effects(&box_def, &ctx);

        assert_eq!(outputs["defaultColor"], json!("0x00ff00"));
        assert_eq!(outputs["defaultAlpha"], json!(0.5));
    }

    #[test]
    fn floor_color_flips_when_drop_through() {
        let registry = PresetRegistry::new();
        let definitions = assemble(&registry, &asset("STAGE"));
        let symbol_def = definition_for(&definitions, OwnerKind::LineSegmentSymbolMetadata);

        let ancestors = vec![
            json!({ "name": "keyframe" }),
            json!({
                "name": "layer",
                "pluginMetadata": { DEFAULT_PLUGIN_ID: { "lineSegmentType": "LINE_SEGMENT_STRUCTURE" } }
            }),
        ];

        let solid = layer(json!({ "structureType": "FLOOR" }));
        let ctx = PathContext::new(&solid, &ancestors, DEFAULT_PLUGIN_ID);
        assert_eq!(apply_effects(&symbol_def, &ctx)["color"], json!("0xeeeeee"));

        let drop_through = layer(json!({ "structureType": "FLOOR", "dropThrough": true }));
        let ctx = PathContext::new(&drop_through, &ancestors, DEFAULT_PLUGIN_ID);
        assert_eq!(apply_effects(&symbol_def, &ctx)["color"], json!("0x0000ff"));
    }

    #[test]
    fn structure_rules_need_the_governing_ancestor() {
        let registry = PresetRegistry::new();
        let definitions = assemble(&registry, &asset("STAGE"));
        let symbol_def = definition_for(&definitions, OwnerKind::LineSegmentSymbolMetadata);

        // Without a line-segment-structure grandparent nothing fires;
        // the parent hop above the root is absence, not an error.
        let node = layer(json!({ "structureType": "FLOOR" }));
        let ctx = PathContext::root(&node, DEFAULT_PLUGIN_ID);
        assert!(apply_effects(&symbol_def, &ctx).is_empty());
    }

    #[test]
    fn stage_point_names_interpolate_index() {
        let registry = PresetRegistry::new();
        let definitions = assemble(&registry, &asset("STAGE"));
        let point_def = definition_for(&definitions, OwnerKind::PointLayerMetadata);

        let node = layer(json!({ "pointType": "ENTRANCE_POINT", "index": 1 }));
        let ctx = PathContext::root(&node, DEFAULT_PLUGIN_ID);
        assert_eq!(apply_effects(&point_def, &ctx)["name"], json!("Entrance 1"));

        let node = layer(json!({ "pointType": "RESPAWN_POINT", "index": 0 }));
        let ctx = PathContext::root(&node, DEFAULT_PLUGIN_ID);
        assert_eq!(apply_effects(&point_def, &ctx)["name"], json!("Respawn 0"));
    }
}

// === Preset Integration Tests ===

mod presets {
    use super::*;

    #[test]
    fn body_preset_effects_fire_only_for_selected_preset() {
        let config = EngineConfig::default();
        let mut registry = PresetRegistry::new();
        let tall = registry.add_body("Tall").unwrap().id.clone();
        let short = registry.add_body("Short").unwrap().id.clone();

        let definitions = SchemaAssembler::new(&config, &registry)
            .definitions(&asset("CHARACTER"))
            .unwrap();
        let body_def = definition_for(&definitions, OwnerKind::CollisionBodyLayerMetadata);

        let node = json!({
            "pluginMetadata": { DEFAULT_PLUGIN_ID: { "collisionBodyLayerPresets": tall } }
        });
        let ctx = PathContext::root(&node, DEFAULT_PLUGIN_ID);
        let outputs = apply_effects(&body_def, &ctx);
        assert_eq!(outputs["defaultHead"], json!(100.0));
        assert_eq!(outputs["defaultHipWidth"], json!(50.0));

        // An unselected preset contributes nothing
        let node = json!({
            "pluginMetadata": { DEFAULT_PLUGIN_ID: { "collisionBodyLayerPresets": "NONE" } }
        });
        let ctx = PathContext::root(&node, DEFAULT_PLUGIN_ID);
        assert!(apply_effects(&body_def, &ctx).is_empty());
        let _ = short;
    }

    #[test]
    fn preset_round_trip_restores_definition_output() {
        let config = EngineConfig::default();
        let mut registry = PresetRegistry::new();
        registry.add_body("A");

        let before = SchemaAssembler::new(&config, &registry)
            .definitions(&asset("CHARACTER"))
            .unwrap();

        let id = registry.add_body("Tall").unwrap().id.clone();
        registry.remove_body(&id);

        let after = SchemaAssembler::new(&config, &registry)
            .definitions(&asset("CHARACTER"))
            .unwrap();
        assert_eq!(before, after);
    }
}

// === Wire Format Tests ===

mod wire_format {
    use super::*;

    #[test]
    fn definitions_serialize_with_camel_case_fields() {
        let registry = PresetRegistry::new();
        let definitions = assemble(&registry, &asset("CHARACTER"));
        let box_def = definition_for(&definitions, OwnerKind::CollisionBoxLayerMetadata);

        let value = serde_json::to_value(&box_def).unwrap();
        assert_eq!(
            value["ownerTypes"],
            json!(["COLLISION_BOX_LAYER_METADATA"])
        );
        assert_eq!(value["fields"][0]["name"], json!("collisionBoxType"));
        assert_eq!(value["fields"][0]["type"], json!("DROPDOWN"));
        assert_eq!(
            value["effects"][0]["outputField"],
            json!("pluginMetadata[].index")
        );
        assert_eq!(
            value["effects"][0]["dependsOn"][0]["operator"],
            json!("MATCHES")
        );
    }

    #[test]
    fn legacy_operator_spellings_deserialize() {
        let condition: Condition = serde_json::from_value(json!({
            "inputField": "pluginMetadata[].collisionBoxType",
            "operator": "=",
            "inputValue": "HIT_BOX"
        }))
        .unwrap();
        assert_eq!(condition.operator, Operator::Equals);
    }
}
