//! Painted model association
//!
//! A `PaintedModel` row records that one material region of a model is
//! painted with a given color. Both references are plain integer columns:
//! deleting a model or a color leaves its associations behind, and the
//! repaint workflow repairs dangling color references when it encounters
//! them.

use serde::{Deserialize, Serialize};

/// Join row linking a model to a color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaintedModel {
    /// Unique identifier
    pub id: i64,
    /// Referenced model
    pub model_id: i64,
    /// Referenced color
    pub color_id: i64,
}

/// Input for creating a painted model association.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPaintedModel {
    pub model_id: i64,
    pub color_id: i64,
}

/// Patchable association columns.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaintedModelPatch {
    pub model_id: Option<i64>,
    pub color_id: Option<i64>,
}

impl PaintedModelPatch {
    /// Overwrite the entity's columns with the fields present in the patch.
    pub fn apply(&self, painted: &mut PaintedModel) {
        if let Some(model_id) = self.model_id {
            painted.model_id = model_id;
        }
        if let Some(color_id) = self.color_id {
            painted.color_id = color_id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_apply() {
        let mut painted = PaintedModel {
            id: 1,
            model_id: 2,
            color_id: 3,
        };
        let patch = PaintedModelPatch {
            color_id: Some(7),
            ..Default::default()
        };
        patch.apply(&mut painted);

        assert_eq!(painted.model_id, 2);
        assert_eq!(painted.color_id, 7);
    }

    #[test]
    fn test_patch_rejects_unknown_fields() {
        let result: Result<PaintedModelPatch, _> = serde_json::from_str(r#"{"color": 1}"#);
        assert!(result.is_err());
    }
}
