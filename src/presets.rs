//! User-defined named presets and their schema fragments.
//!
//! Two preset families exist: collision-body presets (five numeric layer
//! defaults) and collision-box style presets (color + alpha per box kind).
//! The registry owns both collections for the host session driving the
//! editor; it converts the body collection into a dropdown-plus-effects
//! fragment, and the active box preset into per-kind layer styles.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::condition::Condition;
use crate::effect::Effect;
use crate::types::DropdownOption;

/// Field name of the body-preset selector dropdown on collision-body
/// layers; preset effects gate on its value.
pub const BODY_PRESET_FIELD: &str = "collisionBodyLayerPresets";

/// The fixed set of collision box kinds a style preset covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BoxKind {
    Hurt,
    Hit,
    Grab,
    LedgeGrab,
    Reflect,
    Absorb,
    Counter,
    CustomA,
    CustomB,
    CustomC,
}

impl BoxKind {
    /// Dropdown/effect order: Hurt first, then Hit, then the rest.
    pub const ALL: [BoxKind; 10] = [
        BoxKind::Hurt,
        BoxKind::Hit,
        BoxKind::Grab,
        BoxKind::LedgeGrab,
        BoxKind::Reflect,
        BoxKind::Absorb,
        BoxKind::Counter,
        BoxKind::CustomA,
        BoxKind::CustomB,
        BoxKind::CustomC,
    ];

    /// Key under which a preset stores this kind's style, also the layer
    /// name prefix ("hitbox0", "customboxa2", ...).
    pub fn key(&self) -> &'static str {
        match self {
            BoxKind::Hurt => "hurtbox",
            BoxKind::Hit => "hitbox",
            BoxKind::Grab => "grabbox",
            BoxKind::LedgeGrab => "ledgegrabbox",
            BoxKind::Reflect => "reflectbox",
            BoxKind::Absorb => "absorbbox",
            BoxKind::Counter => "counterbox",
            BoxKind::CustomA => "customboxa",
            BoxKind::CustomB => "customboxb",
            BoxKind::CustomC => "customboxc",
        }
    }

    /// Metadata value stored in `collisionBoxType`.
    pub fn metadata_value(&self) -> &'static str {
        match self {
            BoxKind::Hurt => "HURT_BOX",
            BoxKind::Hit => "HIT_BOX",
            BoxKind::Grab => "GRAB_BOX",
            BoxKind::LedgeGrab => "LEDGE_GRAB_BOX",
            BoxKind::Reflect => "REFLECT_BOX",
            BoxKind::Absorb => "ABSORB_BOX",
            BoxKind::Counter => "COUNTER_BOX",
            BoxKind::CustomA => "CUSTOM_BOX_A",
            BoxKind::CustomB => "CUSTOM_BOX_B",
            BoxKind::CustomC => "CUSTOM_BOX_C",
        }
    }

    /// Dropdown label.
    pub fn label(&self) -> &'static str {
        match self {
            BoxKind::Hurt => "Hurt Box",
            BoxKind::Hit => "Hit Box",
            BoxKind::Grab => "Grab Box",
            BoxKind::LedgeGrab => "Ledge Grab Box",
            BoxKind::Reflect => "Reflect Box",
            BoxKind::Absorb => "Absorb Box",
            BoxKind::Counter => "Counter Box",
            BoxKind::CustomA => "Custom Box A",
            BoxKind::CustomB => "Custom Box B",
            BoxKind::CustomC => "Custom Box C",
        }
    }

    fn default_color(&self) -> &'static str {
        match self {
            BoxKind::Hurt => "#f5e042",
            BoxKind::Hit => "#ff0000",
            BoxKind::Grab => "#ff00ff",
            BoxKind::LedgeGrab => "#bababa",
            BoxKind::Reflect => "#48f748",
            BoxKind::Absorb => "#d1d1d1",
            BoxKind::Counter => "#42ecff",
            BoxKind::CustomA | BoxKind::CustomB | BoxKind::CustomC => "#d1d1d1",
        }
    }
}

/// Display style for one box kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStyle {
    /// `#rrggbb` as presented by the editor.
    pub color: String,
    pub alpha: f64,
}

impl BoxStyle {
    pub fn default_for(kind: BoxKind) -> Self {
        Self {
            color: kind.default_color().to_string(),
            alpha: 0.5,
        }
    }

    /// Color in the `0xrrggbb` form layer effects expect.
    pub fn engine_color(&self) -> String {
        match self.color.strip_prefix('#') {
            Some(rest) => format!("0x{rest}"),
            None => self.color.clone(),
        }
    }
}

/// A named collision-box style preset covering all box kinds.
///
/// `id` is opaque and stable; uniqueness is by id, never by name. The
/// style map is keyed by [`BoxKind::key`] strings so legacy entries from
/// retired kinds survive deserialization until a migration strips them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxPreset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub styles: BTreeMap<String, BoxStyle>,
}

impl BoxPreset {
    fn with_defaults(name: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            styles: BoxKind::ALL
                .iter()
                .map(|kind| (kind.key().to_string(), BoxStyle::default_for(*kind)))
                .collect(),
        }
    }

    /// Style for a kind, falling back to the kind's default.
    pub fn style(&self, kind: BoxKind) -> BoxStyle {
        self.styles
            .get(kind.key())
            .cloned()
            .unwrap_or_else(|| BoxStyle::default_for(kind))
    }
}

/// A named collision-body preset: five numeric layer defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyPreset {
    pub id: String,
    pub name: String,
    pub foot: f64,
    pub head: f64,
    pub hip_width: f64,
    pub hip_x_offset: f64,
    pub hip_y_offset: f64,
}

/// The editable numeric fields of a body preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyFields {
    pub foot: f64,
    pub head: f64,
    pub hip_width: f64,
    pub hip_x_offset: f64,
    pub hip_y_offset: f64,
}

impl Default for BodyFields {
    fn default() -> Self {
        Self {
            foot: 0.0,
            head: 100.0,
            hip_width: 50.0,
            hip_x_offset: 0.0,
            hip_y_offset: 0.0,
        }
    }
}

/// Parse a numeric field from its presented text form.
///
/// Malformed input yields `NaN` rather than an error; user data entry is
/// never a system failure, and the caller may re-display the invalid
/// value uncorrected.
pub fn parse_numeric(text: &str) -> f64 {
    text.trim().parse().unwrap_or(f64::NAN)
}

/// Preset-derived schema fragment: dropdown options plus gating effects.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetFragment {
    pub options: Vec<DropdownOption>,
    pub effects: Vec<Effect>,
}

/// Owns the session's preset collections.
#[derive(Debug, Clone, Default)]
pub struct PresetRegistry {
    body: Vec<BodyPreset>,
    boxes: Vec<BoxPreset>,
    active_box: Option<String>,
}

impl PresetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        body: Vec<BodyPreset>,
        boxes: Vec<BoxPreset>,
        active_box: Option<String>,
    ) -> Self {
        Self {
            body,
            boxes,
            active_box,
        }
    }

    pub fn body_presets(&self) -> &[BodyPreset] {
        &self.body
    }

    pub fn box_presets(&self) -> &[BoxPreset] {
        &self.boxes
    }

    pub fn active_box_id(&self) -> Option<&str> {
        self.active_box.as_deref()
    }

    /// Add a body preset with default fields and a fresh id.
    ///
    /// No-ops on an empty name.
    pub fn add_body(&mut self, name: &str) -> Option<&BodyPreset> {
        if name.is_empty() {
            return None;
        }
        let defaults = BodyFields::default();
        self.body.push(BodyPreset {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            foot: defaults.foot,
            head: defaults.head,
            hip_width: defaults.hip_width,
            hip_x_offset: defaults.hip_x_offset,
            hip_y_offset: defaults.hip_y_offset,
        });
        self.body.last()
    }

    /// Replace every field of a body preset except its id.
    pub fn update_body(&mut self, id: &str, name: &str, fields: BodyFields) -> Option<&BodyPreset> {
        let preset = self.body.iter_mut().find(|p| p.id == id)?;
        preset.name = name.to_string();
        preset.foot = fields.foot;
        preset.head = fields.head;
        preset.hip_width = fields.hip_width;
        preset.hip_x_offset = fields.hip_x_offset;
        preset.hip_y_offset = fields.hip_y_offset;
        Some(preset)
    }

    /// Remove by id; absent ids are a no-op.
    pub fn remove_body(&mut self, id: &str) {
        self.body.retain(|p| p.id != id);
    }

    /// Add a box preset with default styles and a fresh id.
    ///
    /// No-ops on an empty name.
    pub fn add_box(&mut self, name: &str) -> Option<&BoxPreset> {
        if name.is_empty() {
            return None;
        }
        self.boxes.push(BoxPreset::with_defaults(name));
        self.boxes.last()
    }

    /// Replace a box preset's name and styles, keeping its id.
    pub fn update_box(
        &mut self,
        id: &str,
        name: &str,
        styles: BTreeMap<String, BoxStyle>,
    ) -> Option<&BoxPreset> {
        let preset = self.boxes.iter_mut().find(|p| p.id == id)?;
        preset.name = name.to_string();
        preset.styles = styles;
        Some(preset)
    }

    /// Remove by id; clears the active selection if it pointed here.
    pub fn remove_box(&mut self, id: &str) {
        self.boxes.retain(|p| p.id != id);
        if self.active_box.as_deref() == Some(id) {
            self.active_box = None;
        }
    }

    /// Select which box preset drives layer colors, or `None` for defaults.
    pub fn set_active_box(&mut self, id: Option<&str>) {
        self.active_box = id.map(str::to_string);
    }

    /// Style for a box kind from the active preset, or the kind default
    /// when no preset is active (or the active id no longer exists).
    pub fn active_box_style(&self, kind: BoxKind) -> BoxStyle {
        self.active_box
            .as_deref()
            .and_then(|id| self.boxes.iter().find(|p| p.id == id))
            .map(|preset| preset.style(kind))
            .unwrap_or_else(|| BoxStyle::default_for(kind))
    }

    /// Convert the body collection into its schema fragment: dropdown
    /// options (a fixed "None" option first, then insertion order) and one
    /// effect per numeric field of every preset, each gated on the
    /// selector equalling that preset's id.
    pub fn body_fragment(&self) -> PresetFragment {
        let mut options = vec![DropdownOption::new("None", "NONE")];
        let mut effects = Vec::new();
        let selector = format!("pluginMetadata[].{BODY_PRESET_FIELD}");

        for preset in &self.body {
            options.push(DropdownOption::new(preset.name.clone(), preset.id.clone()));

            let gate = vec![Condition::equals(&selector, preset.id.clone())];
            effects.push(Effect::new(gate.clone(), "defaultHead", preset.head));
            effects.push(Effect::new(gate.clone(), "defaultFoot", preset.foot));
            effects.push(Effect::new(gate.clone(), "defaultHipWidth", preset.hip_width));
            effects.push(Effect::new(
                gate.clone(),
                "defaultHipXOffset",
                preset.hip_x_offset,
            ));
            effects.push(Effect::new(gate, "defaultHipYOffset", preset.hip_y_offset));
        }

        PresetFragment { options, effects }
    }
}
