//! Core schema records: field definitions, owner kinds and engine configuration.

use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::Condition;
use crate::effect::Effect;

/// Plugin owner id used by default; every node's metadata block for this
/// engine lives under this key in `pluginMetadata`.
pub const DEFAULT_PLUGIN_ID: &str = "com.fraymakers.FraymakersMetadata";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Coerce a resolved value to the string form used by `MATCHES` and by
/// `{{Path}}` template substitution.
///
/// Strings render bare, numbers and booleans via their JSON form; `null`
/// renders empty, same as an unresolved placeholder. Integral floats
/// render without the fraction, so `3.0` reads `"3"`.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.is_finite() => {
                format!("{f:.0}")
            }
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Explicit engine configuration; replaces ambient manifest globals.
///
/// Both the schema assembler and the migration engines are constructed
/// from one of these, so the target version and plugin owner id are data,
/// not environment.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// The version documents converge to after migration.
    pub current_version: Version,
    /// Key of this engine's block inside every node's `pluginMetadata`.
    pub plugin_id: String,
}

impl EngineConfig {
    pub fn new(current_version: Version, plugin_id: impl Into<String>) -> Self {
        Self {
            current_version,
            plugin_id: plugin_id.into(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(Version::new(0, 1, 2), DEFAULT_PLUGIN_ID)
    }
}

/// Editable field kinds the host form renderer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    Text,
    Dropdown,
    Boolean,
    Integer,
    Float,
    Tags,
}

/// Structural role of a tree node that a [`MetadataDefinition`] applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OwnerKind {
    SpriteEntityAssetMetadata,
    ScriptAssetMetadata,
    AudioAssetMetadata,
    NineSliceAssetMetadata,
    PaletteMapMetadata,
    CollisionBoxLayerMetadata,
    CollisionBodyLayerMetadata,
    CollisionBodySymbolMetadata,
    CollisionBoxSymbolMetadata,
    PointLayerMetadata,
    LineSegmentLayerMetadata,
    LineSegmentSymbolMetadata,
    ContainerLayerMetadata,
}

impl OwnerKind {
    /// Wire name, as used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerKind::SpriteEntityAssetMetadata => "SPRITE_ENTITY_ASSET_METADATA",
            OwnerKind::ScriptAssetMetadata => "SCRIPT_ASSET_METADATA",
            OwnerKind::AudioAssetMetadata => "AUDIO_ASSET_METADATA",
            OwnerKind::NineSliceAssetMetadata => "NINE_SLICE_ASSET_METADATA",
            OwnerKind::PaletteMapMetadata => "PALETTE_MAP_METADATA",
            OwnerKind::CollisionBoxLayerMetadata => "COLLISION_BOX_LAYER_METADATA",
            OwnerKind::CollisionBodyLayerMetadata => "COLLISION_BODY_LAYER_METADATA",
            OwnerKind::CollisionBodySymbolMetadata => "COLLISION_BODY_SYMBOL_METADATA",
            OwnerKind::CollisionBoxSymbolMetadata => "COLLISION_BOX_SYMBOL_METADATA",
            OwnerKind::PointLayerMetadata => "POINT_LAYER_METADATA",
            OwnerKind::LineSegmentLayerMetadata => "LINE_SEGMENT_LAYER_METADATA",
            OwnerKind::LineSegmentSymbolMetadata => "LINE_SEGMENT_SYMBOL_METADATA",
            OwnerKind::ContainerLayerMetadata => "CONTAINER_LAYER_METADATA",
        }
    }
}

/// Asset classification stored in the asset's own plugin block as `objectType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectType {
    None,
    Entity,
    Character,
    Projectile,
    Assist,
    CustomGameObject,
    Stage,
    CollisionArea,
    RectCollisionArea,
    RectStructure,
    LineSegmentStructure,
    MatchRules,
}

impl ObjectType {
    /// Reads the classification from an asset's plugin-metadata block.
    ///
    /// Returns `None` when the block or the field is absent, or when the
    /// stored value is not a known classification.
    pub fn of(asset: &Value, plugin_id: &str) -> Option<ObjectType> {
        let raw = asset
            .get("pluginMetadata")?
            .get(plugin_id)?
            .get("objectType")?;
        serde_json::from_value(raw.clone()).ok()
    }

    /// True for the classifications that carry game-object layer rules
    /// (collision boxes, points, collision bodies).
    pub fn is_game_object(&self) -> bool {
        matches!(
            self,
            ObjectType::Character
                | ObjectType::Projectile
                | ObjectType::Assist
                | ObjectType::CustomGameObject
                | ObjectType::Entity
        )
    }
}

/// One entry in a dropdown field's option list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropdownOption {
    pub label: String,
    pub value: Value,
}

impl DropdownOption {
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A single editable field, gated by its `dependsOn` conditions.
///
/// Identity is `name`, unique within one [`MetadataDefinition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub default_value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<DropdownOption>>,
    #[serde(default)]
    pub depends_on: Vec<Condition>,
}

impl FieldDefinition {
    fn new(
        name: &str,
        label: &str,
        field_type: FieldType,
        default_value: impl Into<Value>,
    ) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            field_type,
            default_value: default_value.into(),
            options: None,
            depends_on: Vec::new(),
        }
    }

    pub fn text(name: &str, label: &str, default_value: &str) -> Self {
        Self::new(name, label, FieldType::Text, default_value)
    }

    pub fn boolean(name: &str, label: &str, default_value: bool) -> Self {
        Self::new(name, label, FieldType::Boolean, default_value)
    }

    pub fn integer(name: &str, label: &str, default_value: i64) -> Self {
        Self::new(name, label, FieldType::Integer, default_value)
    }

    pub fn float(name: &str, label: &str, default_value: f64) -> Self {
        Self::new(name, label, FieldType::Float, default_value)
    }

    pub fn tags(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldType::Tags, Value::Array(Vec::new()))
    }

    pub fn dropdown(
        name: &str,
        label: &str,
        default_value: &str,
        options: Vec<DropdownOption>,
    ) -> Self {
        let mut field = Self::new(name, label, FieldType::Dropdown, default_value);
        field.options = Some(options);
        field
    }

    /// Builder-style condition gate.
    pub fn depends_on(mut self, conditions: Vec<Condition>) -> Self {
        self.depends_on = conditions;
        self
    }
}

/// The unit the schema assembler emits: an ordered set of fields and
/// effects applying to a set of owner kinds.
///
/// Field and effect order is significant: when two effects share an
/// `outputField` and their conditions both hold, the later one wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDefinition {
    pub owner_types: Vec<OwnerKind>,
    pub fields: Vec<FieldDefinition>,
    pub effects: Vec<Effect>,
}

impl MetadataDefinition {
    pub fn new(
        owner_types: Vec<OwnerKind>,
        fields: Vec<FieldDefinition>,
        effects: Vec<Effect>,
    ) -> Self {
        Self {
            owner_types,
            fields,
            effects,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_string_renders_integral_floats_without_fraction() {
        assert_eq!(display_string(&json!(3.0)), "3");
        assert_eq!(display_string(&json!(-1.0)), "-1");
        assert_eq!(display_string(&json!(3)), "3");
        assert_eq!(display_string(&json!(2.5)), "2.5");
        assert_eq!(display_string(&json!("0.0")), "0.0");
        assert_eq!(display_string(&Value::Null), "");
    }

    #[test]
    fn owner_kind_wire_names() {
        let kind: OwnerKind = serde_json::from_value(json!("POINT_LAYER_METADATA")).unwrap();
        assert_eq!(kind, OwnerKind::PointLayerMetadata);
        assert_eq!(kind.as_str(), "POINT_LAYER_METADATA");
        assert_eq!(
            serde_json::to_value(OwnerKind::CollisionBoxLayerMetadata).unwrap(),
            json!("COLLISION_BOX_LAYER_METADATA")
        );
    }

    #[test]
    fn object_type_read_from_plugin_block() {
        let asset = json!({
            "pluginMetadata": {
                DEFAULT_PLUGIN_ID: { "objectType": "CHARACTER" }
            }
        });
        assert_eq!(
            ObjectType::of(&asset, DEFAULT_PLUGIN_ID),
            Some(ObjectType::Character)
        );
        assert!(ObjectType::Character.is_game_object());
        assert!(!ObjectType::Stage.is_game_object());
    }

    #[test]
    fn object_type_absent_or_unknown() {
        assert_eq!(ObjectType::of(&json!({}), DEFAULT_PLUGIN_ID), None);

        let asset = json!({
            "pluginMetadata": { DEFAULT_PLUGIN_ID: { "objectType": "SOMETHING_NEW" } }
        });
        assert_eq!(ObjectType::of(&asset, DEFAULT_PLUGIN_ID), None);
    }

    #[test]
    fn field_definition_serializes_camel_case() {
        let field = FieldDefinition::dropdown(
            "objectType",
            "Object Type",
            "NONE",
            vec![DropdownOption::new("None", "NONE")],
        );
        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(value["type"], json!("DROPDOWN"));
        assert_eq!(value["defaultValue"], json!("NONE"));
        assert_eq!(value["dependsOn"], json!([]));
        assert_eq!(value["options"][0]["label"], json!("None"));
    }
}
