use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use duet_core::{DisplayType, SceneId, SceneItemId};

/// Canonical scene item id -> id rendered on one display.
pub type NodeMap = BTreeMap<SceneItemId, SceneItemId>;

/// Per-display node maps for exactly one scene.
///
/// The horizontal map is the identity on canonical ids; secondary maps
/// point at duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMaps {
    scene: Option<SceneId>,
    maps: BTreeMap<DisplayType, NodeMap>,
}

impl NodeMaps {
    pub fn new(scene: Option<SceneId>) -> Self {
        Self {
            scene,
            maps: BTreeMap::new(),
        }
    }

    /// Scene these maps were built for.
    pub fn scene(&self) -> Option<&SceneId> {
        self.scene.as_ref()
    }

    /// Start an empty map for `display`, replacing any existing one.
    pub fn set_empty(&mut self, display: DisplayType) {
        self.maps.insert(display, NodeMap::new());
    }

    pub fn put(&mut self, display: DisplayType, canonical: SceneItemId, id: SceneItemId) {
        self.maps.entry(display).or_default().insert(canonical, id);
    }

    /// Drop `canonical` from every display. Returns the removed entries.
    pub fn remove(&mut self, canonical: &SceneItemId) -> Vec<(DisplayType, SceneItemId)> {
        self.maps
            .iter_mut()
            .filter_map(|(display, map)| map.remove(canonical).map(|id| (*display, id)))
            .collect()
    }

    /// Put back entries previously returned by [`NodeMaps::remove`].
    pub fn restore_entries(&mut self, canonical: &SceneItemId, entries: &[(DisplayType, SceneItemId)]) {
        for (display, id) in entries {
            self.put(*display, canonical.clone(), id.clone());
        }
    }

    pub fn get(&self, display: DisplayType, canonical: &SceneItemId) -> Option<&SceneItemId> {
        self.maps.get(&display).and_then(|m| m.get(canonical))
    }

    /// Display-specific id, or `canonical` itself while it is not mapped yet.
    pub fn resolve(&self, display: DisplayType, canonical: &SceneItemId) -> SceneItemId {
        self.get(display, canonical)
            .cloned()
            .unwrap_or_else(|| canonical.clone())
    }

    pub fn map(&self, display: DisplayType) -> Option<&NodeMap> {
        self.maps.get(&display)
    }

    pub fn displays(&self) -> impl Iterator<Item = DisplayType> + '_ {
        self.maps.keys().copied()
    }

    /// Horizontal and vertical ids for one canonical item.
    pub fn pair(&self, canonical: &SceneItemId) -> Option<(SceneItemId, SceneItemId)> {
        Some((
            self.get(DisplayType::Horizontal, canonical)?.clone(),
            self.get(DisplayType::Vertical, canonical)?.clone(),
        ))
    }

    /// Every mapped id on the listed displays.
    pub fn display_ids(&self, displays: &[DisplayType]) -> Vec<SceneItemId> {
        displays
            .iter()
            .filter_map(|d| self.maps.get(d))
            .flat_map(|m| m.values().cloned())
            .collect()
    }

    /// Items tracked as canonical: keys of `canonical_display`'s map, or of
    /// every map if that one was never built.
    pub fn canonical_ids(&self, canonical_display: DisplayType) -> BTreeSet<SceneItemId> {
        match self.maps.get(&canonical_display) {
            Some(map) => map.keys().cloned().collect(),
            None => self.maps.values().flat_map(|m| m.keys().cloned()).collect(),
        }
    }

    /// Ids that are duplicates, i.e. mapped on any display but `canonical_display`.
    pub fn duplicate_ids(&self, canonical_display: DisplayType) -> BTreeSet<SceneItemId> {
        self.maps
            .iter()
            .filter(|(display, _)| **display != canonical_display)
            .flat_map(|(_, m)| m.values().cloned())
            .collect()
    }

    /// Canonical ids with no entry on `display`.
    pub fn missing<'a>(
        &self,
        display: DisplayType,
        canonical: impl IntoIterator<Item = &'a SceneItemId>,
    ) -> Vec<SceneItemId> {
        canonical
            .into_iter()
            .filter(|id| self.get(display, id).is_none())
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.values().all(|m| m.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> SceneItemId {
        SceneItemId::new(s)
    }

    fn mapped() -> NodeMaps {
        let mut maps = NodeMaps::new(Some(SceneId::new("main")));
        for canonical in ["1", "2", "3"] {
            maps.put(DisplayType::Horizontal, id(canonical), id(canonical));
            maps.put(DisplayType::Vertical, id(canonical), id(&format!("v{canonical}")));
        }
        maps
    }

    #[test]
    fn test_resolve_falls_back_to_canonical() {
        let maps = mapped();
        assert_eq!(maps.resolve(DisplayType::Vertical, &id("2")), id("v2"));
        assert_eq!(maps.resolve(DisplayType::Vertical, &id("9")), id("9"));
        assert_eq!(NodeMaps::default().resolve(DisplayType::Vertical, &id("1")), id("1"));
    }

    #[test]
    fn test_remove_clears_every_display() {
        let mut maps = mapped();
        let removed = maps.remove(&id("2"));
        assert_eq!(removed.len(), 2);
        assert!(maps.get(DisplayType::Horizontal, &id("2")).is_none());
        assert!(maps.get(DisplayType::Vertical, &id("2")).is_none());

        maps.restore_entries(&id("2"), &removed);
        assert_eq!(maps.pair(&id("2")), Some((id("2"), id("v2"))));
    }

    #[test]
    fn test_duplicate_and_canonical_sets() {
        let maps = mapped();
        assert_eq!(maps.duplicate_ids(DisplayType::Horizontal).len(), 3);
        assert!(maps.duplicate_ids(DisplayType::Horizontal).contains(&id("v1")));
        assert!(maps.canonical_ids(DisplayType::Horizontal).contains(&id("1")));
        assert_eq!(maps.display_ids(&[DisplayType::Vertical]), vec![id("v1"), id("v2"), id("v3")]);
    }

    #[test]
    fn test_missing_entries() {
        let mut maps = mapped();
        maps.remove(&id("3"));
        let wanted = [id("1"), id("3")];
        assert_eq!(maps.missing(DisplayType::Vertical, wanted.iter()), vec![id("3")]);
    }

    #[test]
    fn test_set_empty_keeps_display_listed() {
        let mut maps = NodeMaps::new(None);
        maps.set_empty(DisplayType::Vertical);
        assert!(maps.is_empty());
        assert_eq!(maps.displays().collect::<Vec<_>>(), vec![DisplayType::Vertical]);
    }
}
