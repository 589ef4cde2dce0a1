//! 3D model entity
//!
//! A `Model` is a record of an uploaded 3D asset. Its `mesh` column stores
//! the model's mesh identifiers as a single comma-joined string, exactly as
//! clients submitted them. `user_id` is the optional owning account: models
//! created through the composite save endpoint belong to the session user,
//! models created through the plain CRUD endpoint are ownerless.

use serde::{Deserialize, Serialize};

/// 3D model entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Path of the model asset
    pub filepath: String,
    /// Comma-joined mesh identifiers
    pub mesh: String,
    /// Owning user, if any
    pub user_id: Option<i64>,
}

impl Model {
    /// Join a sequence of mesh identifiers into the stored form.
    pub fn join_meshes(meshes: &[String]) -> String {
        meshes.join(",")
    }

    /// Split the stored mesh string back into identifiers.
    ///
    /// An empty column yields an empty list, not a single empty entry.
    pub fn mesh_list(&self) -> Vec<&str> {
        if self.mesh.is_empty() {
            Vec::new()
        } else {
            self.mesh.split(',').collect()
        }
    }
}

/// Input for creating a model; every field is required.
#[derive(Debug, Clone, Deserialize)]
pub struct NewModel {
    pub name: String,
    pub filepath: String,
    pub mesh: String,
}

/// Patchable model columns.
///
/// Only these columns may be overwritten through `PATCH /models/{id}`;
/// anything else in the body (including `user_id` and `id`) is rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelPatch {
    pub name: Option<String>,
    pub filepath: Option<String>,
    pub mesh: Option<String>,
}

impl ModelPatch {
    /// Overwrite the entity's columns with the fields present in the patch.
    pub fn apply(&self, model: &mut Model) {
        if let Some(name) = &self.name {
            model.name = name.clone();
        }
        if let Some(filepath) = &self.filepath {
            model.filepath = filepath.clone();
        }
        if let Some(mesh) = &self.mesh {
            model.mesh = mesh.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Model {
        Model {
            id: 1,
            name: "Dragon".to_string(),
            filepath: "/m/dragon.gltf".to_string(),
            mesh: "head,body".to_string(),
            user_id: None,
        }
    }

    #[test]
    fn test_join_meshes() {
        let meshes = vec!["head".to_string(), "body".to_string()];
        assert_eq!(Model::join_meshes(&meshes), "head,body");
        assert_eq!(Model::join_meshes(&[]), "");
    }

    #[test]
    fn test_mesh_list() {
        assert_eq!(sample().mesh_list(), vec!["head", "body"]);
    }

    #[test]
    fn test_mesh_list_empty() {
        let mut model = sample();
        model.mesh = String::new();
        assert!(model.mesh_list().is_empty());
    }

    #[test]
    fn test_patch_applies_present_fields_only() {
        let mut model = sample();
        let patch = ModelPatch {
            name: Some("Wyvern".to_string()),
            ..Default::default()
        };
        patch.apply(&mut model);

        assert_eq!(model.name, "Wyvern");
        assert_eq!(model.filepath, "/m/dragon.gltf");
        assert_eq!(model.mesh, "head,body");
    }

    #[test]
    fn test_patch_rejects_unknown_fields() {
        let result: Result<ModelPatch, _> = serde_json::from_str(r#"{"user_id": 9}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_model_requires_all_fields() {
        let result: Result<NewModel, _> =
            serde_json::from_str(r#"{"name": "Dragon", "filepath": "/m/dragon.gltf"}"#);
        assert!(result.is_err());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Joining and re-splitting mesh identifiers is lossless as long as
        /// the identifiers themselves contain no comma.
        #[test]
        fn mesh_join_split_roundtrip(meshes in prop::collection::vec("[a-z0-9_]{1,12}", 0..8)) {
            let model = Model {
                id: 1,
                name: "m".to_string(),
                filepath: "/m".to_string(),
                mesh: Model::join_meshes(&meshes),
                user_id: None,
            };
            let split: Vec<String> = model.mesh_list().iter().map(|s| s.to_string()).collect();
            prop_assert_eq!(split, meshes);
        }
    }
}
