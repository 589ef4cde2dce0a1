//! Color entity
//!
//! A `Color` pairs a hex code with a material name. The material is the
//! natural de-duplication key: the composite save workflow looks colors up
//! by (hexcode, material) and reuses an existing row instead of inserting a
//! duplicate, and the schema enforces material uniqueness as the last line
//! of defense against concurrent find-or-create races.

use serde::{Deserialize, Serialize};

/// Color entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Unique identifier
    pub id: i64,
    /// Optional display name
    pub name: Option<String>,
    /// Hex color code, e.g. "#ff0000"
    pub hexcode: String,
    /// Material name (unique)
    pub material: String,
}

/// Input for creating a color through the CRUD endpoint.
///
/// `name` is required here even though the column is nullable: colors
/// created internally by the save-model workflow carry no name, but the
/// public create contract demands one.
#[derive(Debug, Clone, Deserialize)]
pub struct NewColor {
    pub name: String,
    pub hexcode: String,
    pub material: String,
}

/// Patchable color columns.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColorPatch {
    pub name: Option<String>,
    pub hexcode: Option<String>,
    pub material: Option<String>,
}

impl ColorPatch {
    /// Overwrite the entity's columns with the fields present in the patch.
    pub fn apply(&self, color: &mut Color) {
        if let Some(name) = &self.name {
            color.name = Some(name.clone());
        }
        if let Some(hexcode) = &self.hexcode {
            color.hexcode = hexcode.clone();
        }
        if let Some(material) = &self.material {
            color.material = material.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_apply() {
        let mut color = Color {
            id: 1,
            name: None,
            hexcode: "#ff0000".to_string(),
            material: "scale".to_string(),
        };
        let patch = ColorPatch {
            hexcode: Some("#00ff00".to_string()),
            ..Default::default()
        };
        patch.apply(&mut color);

        assert_eq!(color.hexcode, "#00ff00");
        assert_eq!(color.material, "scale");
        assert!(color.name.is_none());
    }

    #[test]
    fn test_patch_rejects_unknown_fields() {
        let result: Result<ColorPatch, _> = serde_json::from_str(r#"{"id": 3}"#);
        assert!(result.is_err());
    }
}
