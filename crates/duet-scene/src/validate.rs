use std::collections::HashSet;

use crate::collection::SceneCollection;
use duet_core::DuetError;

/// Validate a scene collection for structural correctness.
pub fn validate_collection(collection: &SceneCollection) -> Result<(), Vec<DuetError>> {
    let mut errors = Vec::new();

    let mut scene_ids = HashSet::new();
    let mut item_ids = HashSet::new();
    for scene in &collection.scenes {
        if !scene_ids.insert(&scene.id) {
            errors.push(DuetError::InvalidArgument(format!(
                "duplicate scene id: {}",
                scene.id
            )));
        }

        // Item ids are global: node maps key on them across scenes.
        for item in &scene.items {
            if !item_ids.insert(&item.id) {
                errors.push(DuetError::InvalidArgument(format!(
                    "duplicate scene item id '{}' in scene '{}'",
                    item.id, scene.id
                )));
            }
        }
    }

    if let Some(active) = &collection.active_scene {
        if !scene_ids.contains(active) {
            errors.push(DuetError::SceneNotFound(active.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CollectionBuilder;

    #[test]
    fn test_validate_valid_collection() {
        let collection = CollectionBuilder::new("c")
            .scene("main", &[("a", "cam")])
            .scene("brb", &[("b", "card")])
            .build();
        assert!(validate_collection(&collection).is_ok());
    }

    #[test]
    fn test_validate_duplicate_item_across_scenes() {
        let collection = CollectionBuilder::new("c")
            .scene("main", &[("a", "cam")])
            .scene("brb", &[("a", "card")])
            .build();
        let errors = validate_collection(&collection).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_validate_missing_active_scene() {
        let collection = CollectionBuilder::new("c")
            .scene("main", &[])
            .active("gone")
            .build();
        assert!(validate_collection(&collection).is_err());
    }

    #[test]
    fn test_validate_empty_collection_is_fine() {
        assert!(validate_collection(&CollectionBuilder::new("empty").build()).is_ok());
    }
}
