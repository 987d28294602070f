//! Schema assembly: composes the ordered definition list for an asset's
//! current classification.
//!
//! Composition is pure concatenation with fixed precedence: universal
//! fragments first, classification-gated fragments in declaration order,
//! preset-derived fragments last so presets take final-write priority
//! under last-match-wins effect ordering. The assembler is a pure function
//! of (asset classification, preset registry contents); it keeps no state
//! across calls.

use serde_json::Value;

use crate::condition::{Condition, Operator};
use crate::effect::Effect;
use crate::error::SchemaError;
use crate::path::{self, Segment};
use crate::presets::{BoxKind, PresetRegistry, BODY_PRESET_FIELD};
use crate::types::{
    DropdownOption, EngineConfig, FieldDefinition, MetadataDefinition, ObjectType, OwnerKind,
};

const BOX_TYPE_PATH: &str = "pluginMetadata[].collisionBoxType";
const POINT_TYPE_PATH: &str = "pluginMetadata[].pointType";
const INDEX_PATH: &str = "pluginMetadata[].index";
const CONTAINER_TYPE_PATH: &str = "pluginMetadata[].containerType";
const LINE_TYPE_PATH: &str = "pluginMetadata[].lineSegmentType";
const STRUCTURE_TYPE_PATH: &str = "pluginMetadata[].structureType";
const PARENT_BOX_TYPE_PATH: &str = "parent.parent.pluginMetadata[].collisionBoxType";
const PARENT_LINE_TYPE_PATH: &str = "parent.parent.pluginMetadata[].lineSegmentType";

/// Builds metadata definitions for whatever the asset currently is.
pub struct SchemaAssembler<'a> {
    config: &'a EngineConfig,
    registry: &'a PresetRegistry,
}

impl<'a> SchemaAssembler<'a> {
    pub fn new(config: &'a EngineConfig, registry: &'a PresetRegistry) -> Self {
        Self { config, registry }
    }

    /// Assemble the full ordered definition list for this asset.
    ///
    /// The classification is read from the asset's own plugin-metadata
    /// block; assets without one only receive the universal fragments.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the composed definitions fail the
    /// author-time validation pass; assembly aborts rather than shipping a
    /// defective rule set.
    pub fn definitions(&self, asset: &Value) -> Result<Vec<MetadataDefinition>, SchemaError> {
        let mut definitions = universal_definitions();

        if let Some(object_type) = ObjectType::of(asset, &self.config.plugin_id) {
            if object_type.is_game_object() {
                definitions.extend(self.game_object_definitions());
            }
            match object_type {
                ObjectType::Stage => definitions.extend(self.stage_definitions()),
                ObjectType::RectCollisionArea => {
                    definitions.push(rect_collision_area_definition());
                }
                ObjectType::RectStructure => {
                    definitions.push(rect_structure_definition());
                    definitions.push(collision_box_symbol_structure_definition());
                }
                ObjectType::LineSegmentStructure => {
                    definitions.push(line_segment_layer_definition());
                    definitions.push(line_segment_symbol_structure_definition());
                }
                _ => {}
            }
        }

        validate_definitions(&definitions)?;
        Ok(definitions)
    }

    /// Layer rules shared by every playable game object classification.
    fn game_object_definitions(&self) -> Vec<MetadataDefinition> {
        vec![
            self.collision_box_layer_definition(),
            game_object_point_layer_definition(),
            self.collision_body_layer_definition(),
            collision_body_symbol_definition(),
        ]
    }

    fn collision_box_layer_definition(&self) -> MetadataDefinition {
        let alternation = box_alternation();

        let mut options = vec![DropdownOption::new("None", "NONE")];
        options.extend(
            BoxKind::ALL
                .iter()
                .map(|kind| DropdownOption::new(kind.label(), kind.metadata_value())),
        );

        let mut effects = vec![
            // Index must exist before the naming templates below read it
            Effect::new(
                vec![
                    Condition::matches(BOX_TYPE_PATH, &alternation),
                    Condition::is_undefined(INDEX_PATH),
                ],
                INDEX_PATH,
                0,
            ),
        ];
        for kind in BoxKind::ALL {
            let style = self.registry.active_box_style(kind);
            let gate = vec![Condition::equals(BOX_TYPE_PATH, kind.metadata_value())];
            effects.push(Effect::new(gate.clone(), "defaultAlpha", style.alpha));
            effects.push(Effect::new(gate, "defaultColor", style.engine_color()));
        }
        for kind in BoxKind::ALL {
            effects.push(Effect::new(
                vec![Condition::equals(BOX_TYPE_PATH, kind.metadata_value())],
                "name",
                format!("{}{{{{{INDEX_PATH}}}}}", kind.key()),
            ));
        }

        MetadataDefinition::new(
            vec![OwnerKind::CollisionBoxLayerMetadata],
            vec![
                FieldDefinition::dropdown("collisionBoxType", "Collision Box Type", "NONE", options),
                FieldDefinition::integer("index", "Index", 0)
                    .depends_on(vec![Condition::matches(BOX_TYPE_PATH, &alternation)]),
            ],
            effects,
        )
    }

    fn collision_body_layer_definition(&self) -> MetadataDefinition {
        let fragment = self.registry.body_fragment();
        MetadataDefinition::new(
            vec![OwnerKind::CollisionBodyLayerMetadata],
            vec![FieldDefinition::dropdown(
                BODY_PRESET_FIELD,
                "ECB Preset",
                "NONE",
                fragment.options,
            )],
            fragment.effects,
        )
    }

    /// Stage rules: death/camera boxes, structure boxes, stage points,
    /// line segments and container layers.
    fn stage_definitions(&self) -> Vec<MetadataDefinition> {
        vec![
            stage_collision_box_layer_definition(),
            collision_box_symbol_structure_definition(),
            stage_point_layer_definition(),
            line_segment_layer_definition(),
            line_segment_symbol_structure_definition(),
            container_layer_definition(),
        ]
    }
}

/// Fragments every asset receives regardless of classification.
fn universal_definitions() -> Vec<MetadataDefinition> {
    vec![
        MetadataDefinition::new(
            vec![OwnerKind::SpriteEntityAssetMetadata],
            vec![
                FieldDefinition::dropdown("objectType", "Object Type", "NONE", object_type_options()),
                FieldDefinition::text("spritesheetGroup", "Spritesheet Group", ""),
            ],
            vec![],
        ),
        MetadataDefinition::new(
            vec![OwnerKind::ScriptAssetMetadata],
            vec![FieldDefinition::dropdown(
                "objectType",
                "Object Type",
                "NONE",
                object_type_options(),
            )],
            vec![],
        ),
        MetadataDefinition::new(
            vec![OwnerKind::AudioAssetMetadata],
            vec![FieldDefinition::tags("categories", "Categories")],
            vec![],
        ),
        MetadataDefinition::new(
            vec![OwnerKind::NineSliceAssetMetadata],
            vec![FieldDefinition::text("spritesheetGroup", "Spritesheet Group", "")],
            vec![],
        ),
        MetadataDefinition::new(
            vec![OwnerKind::PaletteMapMetadata],
            vec![
                FieldDefinition::boolean("isBase", "Base Costume", false),
                FieldDefinition::dropdown(
                    "teamColor",
                    "Team Color",
                    "NONE",
                    vec![
                        DropdownOption::new("None", "NONE"),
                        DropdownOption::new("Red", "RED"),
                        DropdownOption::new("Green", "GREEN"),
                        DropdownOption::new("Blue", "BLUE"),
                    ],
                ),
            ],
            vec![],
        ),
    ]
}

fn object_type_options() -> Vec<DropdownOption> {
    let mut options = vec![
        DropdownOption::new("None", "NONE"),
        DropdownOption::new("Character", "CHARACTER"),
        DropdownOption::new("Projectile", "PROJECTILE"),
        DropdownOption::new("Assist", "ASSIST"),
        DropdownOption::new("Stage", "STAGE"),
        DropdownOption::new("Collision Area", "COLLISION_AREA"),
    ];
    options.extend(rect_collision_area_options());
    options.extend(rect_structure_options());
    options.extend(line_segment_structure_options());
    options.push(DropdownOption::new("Match Rules", "MATCH_RULES"));
    options.push(DropdownOption::new("Custom Game Object", "CUSTOM_GAME_OBJECT"));
    options
}

fn rect_collision_area_options() -> Vec<DropdownOption> {
    vec![DropdownOption::new("Rect Collision Area", "RECT_COLLISION_AREA")]
}

fn rect_structure_options() -> Vec<DropdownOption> {
    vec![DropdownOption::new("Rect Structure", "RECT_STRUCTURE")]
}

fn line_segment_structure_options() -> Vec<DropdownOption> {
    vec![DropdownOption::new("Line Segment Structure", "LINE_SEGMENT_STRUCTURE")]
}

fn rect_collision_area_effects() -> Vec<Effect> {
    let gate = || vec![Condition::equals(BOX_TYPE_PATH, "RECT_COLLISION_AREA")];
    vec![
        Effect::new(gate(), "defaultAlpha", 0.5),
        Effect::new(gate(), "defaultColor", "0xff8585"),
    ]
}

fn rect_structure_effects() -> Vec<Effect> {
    let gate = || vec![Condition::equals(BOX_TYPE_PATH, "RECT_STRUCTURE")];
    vec![
        Effect::new(gate(), "defaultAlpha", 0.5),
        Effect::new(gate(), "defaultColor", "0x00ff00"),
    ]
}

fn rect_collision_area_definition() -> MetadataDefinition {
    let mut options = vec![DropdownOption::new("None", "NONE")];
    options.extend(rect_collision_area_options());
    MetadataDefinition::new(
        vec![OwnerKind::CollisionBoxLayerMetadata],
        vec![FieldDefinition::dropdown(
            "collisionBoxType",
            "Collision Box Type",
            "NONE",
            options,
        )],
        rect_collision_area_effects(),
    )
}

fn rect_structure_definition() -> MetadataDefinition {
    let mut options = vec![DropdownOption::new("None", "NONE")];
    options.extend(rect_structure_options());
    MetadataDefinition::new(
        vec![OwnerKind::CollisionBoxLayerMetadata],
        vec![FieldDefinition::dropdown(
            "collisionBoxType",
            "Collision Box Type",
            "NONE",
            options,
        )],
        rect_structure_effects(),
    )
}

fn game_object_point_layer_definition() -> MetadataDefinition {
    const CUSTOM_ALTERNATION: &str = "CUSTOM_BOX_A|CUSTOM_BOX_B|CUSTOM_BOX_C";

    let named_points = [
        ("GRAB_HOLD_POINT", "grabholdpoint0"),
        ("LEDGE_HOLD_POINT", "ledgeholdpoint0"),
        ("PIVOT_POINT", "pivotpoint0"),
        ("AUTOLINK_POINT", "autolinkpoint0"),
    ];
    let custom_points = [
        ("CUSTOM_BOX_A", "customboxa"),
        ("CUSTOM_BOX_B", "customboxb"),
        ("CUSTOM_BOX_C", "customboxc"),
    ];

    let mut effects = vec![Effect::new(
        vec![
            Condition::matches(POINT_TYPE_PATH, CUSTOM_ALTERNATION),
            Condition::is_undefined(INDEX_PATH),
        ],
        INDEX_PATH,
        0,
    )];
    for (value, name) in named_points {
        effects.push(Effect::new(
            vec![Condition::equals(POINT_TYPE_PATH, value)],
            "name",
            name,
        ));
    }
    for (value, prefix) in custom_points {
        effects.push(Effect::new(
            vec![Condition::equals(POINT_TYPE_PATH, value)],
            "name",
            format!("{prefix}{{{{{INDEX_PATH}}}}}"),
        ));
    }

    MetadataDefinition::new(
        vec![OwnerKind::PointLayerMetadata],
        vec![
            FieldDefinition::dropdown(
                "pointType",
                "Point Type",
                "NONE",
                vec![
                    DropdownOption::new("None", "NONE"),
                    DropdownOption::new("Grab Hold Point", "GRAB_HOLD_POINT"),
                    DropdownOption::new("Ledge Hold Point", "LEDGE_HOLD_POINT"),
                    DropdownOption::new("Pivot Point", "PIVOT_POINT"),
                    DropdownOption::new("Autolink Point", "AUTOLINK_POINT"),
                    DropdownOption::new("Custom Box A", "CUSTOM_BOX_A"),
                    DropdownOption::new("Custom Box B", "CUSTOM_BOX_B"),
                    DropdownOption::new("Custom Box C", "CUSTOM_BOX_C"),
                ],
            ),
            FieldDefinition::integer("index", "Index", 0)
                .depends_on(vec![Condition::matches(POINT_TYPE_PATH, CUSTOM_ALTERNATION)]),
        ],
        effects,
    )
}

fn collision_body_symbol_definition() -> MetadataDefinition {
    MetadataDefinition::new(
        vec![OwnerKind::CollisionBodySymbolMetadata],
        vec![],
        // The engine cannot offset a collision body horizontally, so pin it
        vec![Effect::new(vec![], "x", 0)],
    )
}

fn stage_collision_box_layer_definition() -> MetadataDefinition {
    let mut options = vec![
        DropdownOption::new("None", "NONE"),
        DropdownOption::new("Death Box", "DEATH_BOX"),
        DropdownOption::new("Camera Box", "CAMERA_BOX"),
    ];
    options.extend(rect_collision_area_options());
    options.extend(rect_structure_options());

    let mut effects = rect_collision_area_effects();
    effects.extend(rect_structure_effects());
    effects.push(Effect::new(
        vec![Condition::matches(
            BOX_TYPE_PATH,
            "DEATH_BOX|CAMERA_BOX|RECT_COLLISION_AREA|RECT_STRUCTURE",
        )],
        "defaultAlpha",
        0.5,
    ));
    effects.push(Effect::new(
        vec![Condition::equals(BOX_TYPE_PATH, "RECT_COLLISION_AREA")],
        "defaultColor",
        "0xff8585",
    ));
    effects.push(Effect::new(
        vec![Condition::equals(BOX_TYPE_PATH, "RECT_STRUCTURE")],
        "defaultColor",
        "0x00ff00",
    ));
    for (value, name) in [("DEATH_BOX", "Death Box"), ("CAMERA_BOX", "Camera Box")] {
        effects.push(Effect::new(
            vec![Condition::equals(BOX_TYPE_PATH, value)],
            "name",
            name,
        ));
        effects.push(Effect::new(
            vec![Condition::equals(BOX_TYPE_PATH, value)],
            "defaultColor",
            "0xd1d1d1",
        ));
    }

    MetadataDefinition::new(
        vec![OwnerKind::CollisionBoxLayerMetadata],
        vec![FieldDefinition::dropdown(
            "collisionBoxType",
            "Collision Box Type",
            "NONE",
            options,
        )],
        effects,
    )
}

fn stage_point_layer_definition() -> MetadataDefinition {
    const SHADOW_GATE: &str = "SHADOW_LIGHT_POINT";

    let shadow = || vec![Condition::matches(POINT_TYPE_PATH, SHADOW_GATE)];

    MetadataDefinition::new(
        vec![OwnerKind::PointLayerMetadata],
        vec![
            FieldDefinition::dropdown(
                "pointType",
                "Point Type",
                "NONE",
                vec![
                    DropdownOption::new("None", "NONE"),
                    DropdownOption::new("Entrance Point", "ENTRANCE_POINT"),
                    DropdownOption::new("Respawn Point", "RESPAWN_POINT"),
                    DropdownOption::new("Shadow Light Point", "SHADOW_LIGHT_POINT"),
                ],
            ),
            FieldDefinition::integer("index", "Index", 0).depends_on(vec![Condition::matches(
                POINT_TYPE_PATH,
                "ENTRANCE_POINT|RESPAWN_POINT",
            )]),
            FieldDefinition::tags("shadowLayerIds", "Shadow Layer Ids").depends_on(shadow()),
            FieldDefinition::float("shadowHeightMultiplier", "Shadow Height Multiplier", 0.25)
                .depends_on(shadow()),
            FieldDefinition::float("shadowFadeStartRadius", "Shadow Fade Start Radius", 0.0)
                .depends_on(shadow()),
            FieldDefinition::float("shadowFadeEndRadius", "Shadow Fade End Radius", -1.0)
                .depends_on(shadow()),
        ],
        vec![
            Effect::new(
                vec![
                    Condition::matches(
                        POINT_TYPE_PATH,
                        "ENTRANCE_POINT|RESPAWN_POINT|SHADOW_LIGHT_POINT",
                    ),
                    Condition::is_undefined(INDEX_PATH),
                ],
                INDEX_PATH,
                0,
            ),
            Effect::new(
                vec![Condition::equals(POINT_TYPE_PATH, "ENTRANCE_POINT")],
                "name",
                format!("Entrance {{{{{INDEX_PATH}}}}}"),
            ),
            Effect::new(
                vec![Condition::equals(POINT_TYPE_PATH, "RESPAWN_POINT")],
                "name",
                format!("Respawn {{{{{INDEX_PATH}}}}}"),
            ),
        ],
    )
}

fn line_segment_layer_definition() -> MetadataDefinition {
    let mut options = vec![DropdownOption::new("None", "NONE")];
    options.extend(line_segment_structure_options());
    MetadataDefinition::new(
        vec![OwnerKind::LineSegmentLayerMetadata],
        vec![FieldDefinition::dropdown(
            "lineSegmentType",
            "Line Segment Type",
            "NONE",
            options,
        )],
        vec![],
    )
}

/// Ledge flags on collision box symbols under a rect structure layer.
fn collision_box_symbol_structure_definition() -> MetadataDefinition {
    let structure = || vec![Condition::equals(PARENT_BOX_TYPE_PATH, "RECT_STRUCTURE")];
    MetadataDefinition::new(
        vec![OwnerKind::CollisionBoxSymbolMetadata],
        vec![
            FieldDefinition::boolean("leftLedge", "Left Ledge", true).depends_on(structure()),
            FieldDefinition::boolean("rightLedge", "Right Ledge", true).depends_on(structure()),
        ],
        vec![],
    )
}

fn line_segment_symbol_structure_definition() -> MetadataDefinition {
    let structure =
        || Condition::equals(PARENT_LINE_TYPE_PATH, "LINE_SEGMENT_STRUCTURE");
    let floor = || {
        vec![
            structure(),
            Condition::equals(STRUCTURE_TYPE_PATH, "FLOOR"),
        ]
    };

    let mut effects = vec![
        Effect::new(floor(), "color", "0xeeeeee"),
        Effect::new(
            vec![
                structure(),
                Condition::equals(STRUCTURE_TYPE_PATH, "FLOOR"),
                Condition::equals("pluginMetadata[].dropThrough", true),
            ],
            "color",
            "0x0000ff",
        ),
    ];
    for (value, color) in [
        ("CEILING", "0xf1948a"),
        ("LEFT_WALL", "0x0099ff"),
        ("RIGHT_WALL", "0x66bb6a"),
    ] {
        effects.push(Effect::new(
            vec![structure(), Condition::equals(STRUCTURE_TYPE_PATH, value)],
            "color",
            color,
        ));
    }

    MetadataDefinition::new(
        vec![OwnerKind::LineSegmentSymbolMetadata],
        vec![
            FieldDefinition::dropdown(
                "structureType",
                "Structure Type",
                "NONE",
                vec![
                    DropdownOption::new("None", "NONE"),
                    DropdownOption::new("Floor", "FLOOR"),
                    DropdownOption::new("Left Wall", "LEFT_WALL"),
                    DropdownOption::new("Right Wall", "RIGHT_WALL"),
                    DropdownOption::new("Ceiling", "CEILING"),
                ],
            )
            .depends_on(vec![structure()]),
            FieldDefinition::boolean("dropThrough", "Drop Through", false).depends_on(floor()),
            FieldDefinition::boolean("leftLedge", "Left Ledge", true).depends_on(floor()),
            FieldDefinition::boolean("rightLedge", "Right Ledge", true).depends_on(floor()),
        ],
        effects,
    )
}

fn container_layer_definition() -> MetadataDefinition {
    let containers = [
        ("BACKGROUND_BEHIND_CONTAINER", "Background Behind", "Background Behind"),
        ("BACKGROUND_STRUCTURES_CONTAINER", "Background Structures", "Background Structures"),
        ("BACKGROUND_SHADOWS_CONTAINER", "Background Shadows", "Background Shadows"),
        ("BACKGROUND_EFFECTS_CONTAINER", "Background Effects", "Background Effects"),
        ("CHARACTERS_BACK_CONTAINER", "Characters Back", "Characters Back"),
        ("CHARACTERS_CONTAINER", "Characters", "Characters Container"),
        ("CHARACTERS_FRONT_CONTAINER", "Characters Front", "Characters Front"),
        ("FOREGROUND_STRUCTURES_CONTAINER", "Foreground Structures", "Foreground Structures"),
        ("FOREGROUND_SHADOWS_CONTAINER", "Foreground Shadows", "Foreground Shadows"),
        ("FOREGROUND_EFFECTS_CONTAINER", "Foreground Effects", "Foreground Effects"),
        ("FOREGROUND_FRONT_CONTAINER", "Foreground Front", "Foreground Front"),
    ];

    let mut options = vec![DropdownOption::new("None", "NONE")];
    let mut effects = Vec::new();
    for (value, label, name) in containers {
        options.push(DropdownOption::new(label, value));
        effects.push(Effect::new(
            vec![Condition::equals(CONTAINER_TYPE_PATH, value)],
            "name",
            name,
        ));
    }

    MetadataDefinition::new(
        vec![OwnerKind::ContainerLayerMetadata],
        vec![FieldDefinition::dropdown(
            "containerType",
            "Container Type",
            "NONE",
            options,
        )],
        effects,
    )
}

fn box_alternation() -> String {
    BoxKind::ALL
        .iter()
        .map(|kind| kind.metadata_value())
        .collect::<Vec<_>>()
        .join("|")
}

/// Author-time validation over a composed definition list.
///
/// Checks the defects [`SchemaError`] names: unrecognized operators,
/// malformed condition/effect/template paths, and template placeholders
/// that reference owner-block fields the definition does not declare.
pub fn validate_definitions(definitions: &[MetadataDefinition]) -> Result<(), SchemaError> {
    for definition in definitions {
        let field_names: Vec<&str> = definition
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .collect();

        for field in &definition.fields {
            validate_conditions(&field.depends_on)?;
        }
        for effect in &definition.effects {
            validate_conditions(&effect.depends_on)?;
            path::parse(&effect.output_field)?;
            if let Value::String(template) = &effect.output_value {
                validate_template(template, definition, &field_names)?;
            }
        }
    }
    Ok(())
}

fn validate_conditions(conditions: &[Condition]) -> Result<(), SchemaError> {
    for condition in conditions {
        if condition.operator == Operator::Unknown {
            return Err(SchemaError::UnknownOperator {
                input_field: condition.input_field.clone(),
            });
        }
        path::parse(&condition.input_field)?;
    }
    Ok(())
}

fn validate_template(
    template: &str,
    definition: &MetadataDefinition,
    field_names: &[&str],
) -> Result<(), SchemaError> {
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let Some(end) = rest[start + 2..].find("}}") else {
            break;
        };
        let placeholder = rest[start + 2..start + 2 + end].trim();
        let segments = path::parse(placeholder)?;

        // An owner-block placeholder must name a field this definition
        // actually declares, otherwise it can never resolve at runtime.
        if let [Segment::OwnerBlock, Segment::Key(key)] = segments.as_slice() {
            if !field_names.contains(&key.as_str()) {
                let owner = definition
                    .owner_types
                    .first()
                    .map(OwnerKind::as_str)
                    .unwrap_or("UNKNOWN");
                return Err(SchemaError::UnknownTemplateField {
                    field: key.clone(),
                    owner: owner.to_string(),
                });
            }
        }
        rest = &rest[start + 2 + end + 2..];
    }
    Ok(())
}
