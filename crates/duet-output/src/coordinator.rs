//! The dual-output orchestrator.
//!
//! Drives mode toggling, scene-switch re-mapping and platform assignment.
//! It is the only component that mutates the scene graph on its own.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::backend::RenderBackend;
use crate::context::ContextStore;
use crate::node_map::NodeMaps;
use crate::state::{DualOutputState, SettingsStore};
use crate::synchronizer;
use duet_core::{
    ContextId, DisplayType, DuetConfig, DuetError, DuetResult, FormattedVideoSettings, PlatformId,
    RenderTarget, Resolution, SceneId, SceneItemId, SourceId, VideoContextSettings, VideoSetting,
};
use duet_scene::{SceneEvent, SceneGraph, SceneItem};

/// Coordinator state. `Mapping` and `Restoring` only exist inside a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Disabled,
    Mapping,
    Enabled,
    Restoring,
}

impl Phase {
    pub fn is_transient(&self) -> bool {
        matches!(self, Phase::Mapping | Phase::Restoring)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Disabled => write!(f, "disabled"),
            Phase::Mapping => write!(f, "mapping"),
            Phase::Enabled => write!(f, "enabled"),
            Phase::Restoring => write!(f, "restoring"),
        }
    }
}

/// Graph changes made during one mapping pass, undone on failure.
#[derive(Debug, Default)]
struct MappingJournal {
    created: Vec<SceneItemId>,
    retargeted: Vec<(SceneItemId, RenderTarget)>,
}

/// Owns the contexts, the persisted state and the scene graph handle.
///
/// One instance is built at startup and handed to the UI and streaming
/// layers. Every mutating call takes `&mut self`.
pub struct DualOutputCoordinator<G, B, S>
where
    G: SceneGraph,
    B: RenderBackend,
    S: SettingsStore,
{
    graph: G,
    contexts: ContextStore<B>,
    store: S,
    state: DualOutputState,
    displays: Vec<DisplayType>,
    phase: Phase,
}

impl<G, B, S> DualOutputCoordinator<G, B, S>
where
    G: SceneGraph,
    B: RenderBackend,
    S: SettingsStore,
{
    /// Load persisted state (or first-run defaults), bring up the contexts
    /// the state calls for, and process any events the graph queued while
    /// loading.
    pub fn new(graph: G, backend: B, store: S, config: &DuetConfig) -> DuetResult<Self> {
        config.validate()?;
        let state = match store.load()? {
            Some(state) => state,
            None => {
                tracing::info!("No dual output state found, starting with defaults");
                DualOutputState::from_config(config)
            }
        };

        let mut displays: Vec<DisplayType> = config
            .displays
            .enabled
            .iter()
            .copied()
            .filter(|d| d.is_canonical() || state.displays.contains(d))
            .collect();
        if displays.is_empty() {
            displays.push(DisplayType::canonical());
        }

        let phase = if state.mode_enabled {
            Phase::Enabled
        } else {
            Phase::Disabled
        };
        let mut coordinator = Self {
            graph,
            contexts: ContextStore::new(backend, config.displays.clone()),
            store,
            state,
            displays,
            phase,
        };

        coordinator.establish_display(DisplayType::canonical())?;
        if coordinator.state.mode_enabled {
            let secondary: Vec<DisplayType> = coordinator.secondary_displays().collect();
            for display in secondary {
                if let Err(e) = coordinator.establish_display(display) {
                    tracing::error!("Disabling dual output on startup: {}", e);
                    coordinator.disable();
                    break;
                }
            }
        }

        coordinator.process_scene_events()?;
        coordinator.persist()?;
        Ok(coordinator)
    }

    fn secondary_displays(&self) -> impl Iterator<Item = DisplayType> + '_ {
        self.displays.iter().copied().filter(|d| !d.is_canonical())
    }

    fn persist(&mut self) -> DuetResult<()> {
        self.store.save(&self.state)
    }

    /// Establish a context; a new secondary context is synced to horizontal timing.
    fn establish_display(&mut self, display: DisplayType) -> DuetResult<()> {
        let created = self.contexts.establish(display, &mut self.state)?;
        if created && !display.is_canonical() {
            synchronizer::sync_frame_rate_and_scale(&mut self.contexts, &mut self.state);
        }
        Ok(())
    }

    fn ensure_stable(&self) -> DuetResult<()> {
        if self.phase.is_transient() {
            return Err(DuetError::TransitionInProgress(self.phase.to_string()));
        }
        Ok(())
    }

    // ── Mode toggling ────────────────────────────────────────────────────

    /// Turn dual output on or off.
    ///
    /// Turning off never fails. Turning on either maps every item of the
    /// active scene for every display, or leaves the graph as it was.
    pub fn toggle(&mut self, on: bool) -> DuetResult<()> {
        self.ensure_stable()?;

        if !on {
            self.disable();
            return self.persist();
        }
        if self.state.mode_enabled {
            return Ok(());
        }

        let scene = self.graph.active_scene();
        let has_items = scene
            .as_ref()
            .map(|s| self.graph.has_items(s))
            .unwrap_or(false);

        self.phase = Phase::Mapping;
        let displays = self.displays.clone();
        let result = if has_items {
            self.map_scene_nodes(&displays, scene.as_ref())
        } else {
            self.empty_node_maps(&displays, scene)
        };

        match result {
            Ok(maps) => {
                self.state.node_maps = Some(maps);
                self.state.mode_enabled = true;
                self.phase = Phase::Enabled;
                tracing::info!("Dual output enabled for {} display(s)", displays.len());
                self.persist()
            }
            Err(e) => {
                self.phase = Phase::Disabled;
                tracing::error!("Error toggling dual output mode: {}", e);
                self.persist()?;
                Err(e)
            }
        }
    }

    /// Boolean façade for UI callers: returns whether the mode now matches `on`.
    pub fn toggle_dual_output_mode(&mut self, on: bool) -> bool {
        match self.toggle(on) {
            Ok(()) => true,
            // The mode changed but could not be saved.
            Err(e @ (DuetError::Io(_) | DuetError::Serialization(_))) => {
                tracing::error!("Dual output state was not saved: {}", e);
                self.state.mode_enabled == on
            }
            Err(e) => {
                tracing::warn!("Dual output could not be turned {}: {}", if on { "on" } else { "off" }, e);
                false
            }
        }
    }

    fn disable(&mut self) {
        self.teardown(DisplayType::canonical());
    }

    /// Undo the mapping and clear the mode flag in one step.
    fn teardown(&mut self, canonical: DisplayType) {
        self.phase = Phase::Restoring;
        self.undo_mapping(canonical);
        self.state.mode_enabled = false;
        self.phase = Phase::Disabled;
        tracing::info!("Dual output disabled");
    }

    fn empty_node_maps(&mut self, displays: &[DisplayType], scene: Option<SceneId>) -> DuetResult<NodeMaps> {
        let mut maps = NodeMaps::new(scene);
        for display in displays {
            if let Err(e) = self.establish_display(*display) {
                self.contexts.reset_to_default();
                return Err(e);
            }
            maps.set_empty(*display);
        }
        Ok(maps)
    }

    // ── Mapping ──────────────────────────────────────────────────────────

    /// Build node maps for `scene` across `displays` (canonical first).
    ///
    /// The first display's items are re-targeted in place with identity
    /// entries; every other display gets one duplicate per canonical item.
    /// All items are attempted; if any fails, every change made by this
    /// pass is undone and `DuetError::Mapping` is returned.
    pub fn map_scene_nodes(&mut self, displays: &[DisplayType], scene: Option<&SceneId>) -> DuetResult<NodeMaps> {
        let Some(scene) = scene else {
            return self.empty_node_maps(displays, None);
        };
        let canonical = self
            .graph
            .items_in_scene(scene)
            .ok_or_else(|| DuetError::SceneNotFound(scene.clone()))?;

        let mut journal = MappingJournal::default();
        let mut maps = NodeMaps::new(Some(scene.clone()));
        let mut failed: BTreeSet<SceneItemId> = BTreeSet::new();

        for (index, kind) in displays.iter().copied().enumerate() {
            if let Err(e) = self.establish_display(kind) {
                self.rollback(journal);
                return Err(e);
            }
            maps.set_empty(kind);

            let Some(context) = self.contexts.context(kind) else {
                failed.extend(canonical.iter().map(|item| item.id.clone()));
                continue;
            };

            for item in &canonical {
                let mapped = if index == 0 {
                    self.assign_in_place(item, context, &mut journal)
                } else {
                    self.duplicate_for(scene, item, context, &mut journal)
                };
                match mapped {
                    Ok(id) => {
                        tracing::debug!("Mapped {} -> {} on {}", item.id, id, kind);
                        maps.put(kind, item.id.clone(), id);
                    }
                    Err(e) => {
                        tracing::warn!("Could not map {} on {}: {}", item.id, kind, e);
                        failed.insert(item.id.clone());
                    }
                }
            }
        }

        for display in displays.iter().skip(1) {
            failed.extend(maps.missing(*display, canonical.iter().map(|item| &item.id)));
        }

        if !failed.is_empty() {
            self.rollback(journal);
            return Err(DuetError::Mapping {
                failed: failed.len(),
                total: canonical.len(),
            });
        }
        Ok(maps)
    }

    fn assign_in_place(
        &mut self,
        item: &SceneItem,
        context: ContextId,
        journal: &mut MappingJournal,
    ) -> DuetResult<SceneItemId> {
        self.graph
            .set_render_target(&item.id, RenderTarget::Context(context))?;
        journal.retargeted.push((item.id.clone(), item.output));
        Ok(item.id.clone())
    }

    fn duplicate_for(
        &mut self,
        scene: &SceneId,
        item: &SceneItem,
        context: ContextId,
        journal: &mut MappingJournal,
    ) -> DuetResult<SceneItemId> {
        let copy = self.graph.duplicate_item(scene, &item.id)?;
        journal.created.push(copy.clone());
        self.graph
            .set_render_target(&copy, RenderTarget::Context(context))?;
        Ok(copy)
    }

    fn rollback(&mut self, journal: MappingJournal) {
        tracing::warn!(
            "Rolling back dual output mapping ({} duplicates, {} re-targeted items)",
            journal.created.len(),
            journal.retargeted.len()
        );
        for id in journal.created.iter().rev() {
            if let Err(e) = self.graph.remove_item(id) {
                tracing::warn!("Could not remove duplicate {} during rollback: {}", id, e);
            }
        }
        for (id, previous) in journal.retargeted {
            if let Err(e) = self.graph.set_render_target(&id, previous) {
                tracing::warn!("Could not restore render target of {}: {}", id, e);
            }
        }
        self.contexts.reset_to_default();
    }

    // ── Restoring ────────────────────────────────────────────────────────

    /// Put the mapped scene back into single-output form and turn dual
    /// output off.
    ///
    /// Duplicates recorded in secondary maps are removed, items tracked as
    /// canonical in `canonical`'s map render into the default context again,
    /// secondary contexts are torn down and the node maps become absent
    /// together with the mode flag. Best-effort per item and safe to call
    /// repeatedly.
    pub fn restore_scene(&mut self, canonical: DisplayType) -> DuetResult<()> {
        self.ensure_stable()?;
        self.teardown(canonical);
        self.persist()
    }

    fn undo_mapping(&mut self, display: DisplayType) {
        if let Some(maps) = self.state.node_maps.take() {
            let items = maps.scene().and_then(|scene| self.graph.items_in_scene(scene));
            if let Some(items) = items {
                let duplicates = maps.duplicate_ids(display);
                let canonical = maps.canonical_ids(display);
                let mut removed = 0usize;
                for item in items {
                    if duplicates.contains(&item.id) {
                        match self.graph.remove_item(&item.id) {
                            Ok(()) => removed += 1,
                            Err(e) => tracing::warn!("Could not remove duplicate {}: {}", item.id, e),
                        }
                    } else if canonical.contains(&item.id) {
                        if let Err(e) = self.graph.set_render_target(&item.id, RenderTarget::Default) {
                            tracing::warn!("Could not reset render target of {}: {}", item.id, e);
                        }
                    }
                }
                tracing::debug!("Removed {} duplicate(s) while restoring", removed);
            }
        }
        self.contexts.reset_to_default();
    }

    // ── Scene graph events ───────────────────────────────────────────────

    /// Drain the graph's queued notifications and run the matching hooks.
    pub fn process_scene_events(&mut self) -> DuetResult<()> {
        for event in self.graph.take_events() {
            self.handle_event(event)?;
        }
        Ok(())
    }

    fn handle_event(&mut self, event: SceneEvent) -> DuetResult<()> {
        match event {
            SceneEvent::CollectionInitialized => {
                if self.state.mode_enabled {
                    let active = self.graph.active_scene();
                    self.remap(active);
                }
            }
            SceneEvent::SceneRemoved { scene, was_active } => {
                let mapped = self
                    .state
                    .node_maps
                    .as_ref()
                    .and_then(|m| m.scene())
                    .map(|s| s == &scene)
                    .unwrap_or(false);
                if was_active || mapped {
                    tracing::info!("Active scene {} removed, turning dual output off", scene);
                    self.disable();
                }
            }
            SceneEvent::SceneSwitched { current, .. } => {
                if self.state.mode_enabled && self.has_dual_output_scenes() {
                    self.remap(Some(current));
                }
            }
        }
        self.persist()
    }

    /// Replace the current mapping with a fresh one for `scene`.
    fn remap(&mut self, scene: Option<SceneId>) {
        self.phase = Phase::Restoring;
        self.undo_mapping(DisplayType::canonical());

        self.phase = Phase::Mapping;
        let displays = self.displays.clone();
        match self.map_scene_nodes(&displays, scene.as_ref()) {
            Ok(maps) => {
                self.state.node_maps = Some(maps);
                self.phase = Phase::Enabled;
            }
            Err(e) => {
                tracing::error!("Could not map scene for dual output, turning it off: {}", e);
                self.state.mode_enabled = false;
                self.phase = Phase::Disabled;
            }
        }
    }

    /// Make `scene` active and run the resulting hooks.
    pub fn switch_scene(&mut self, scene: &SceneId) -> DuetResult<()> {
        self.graph.set_active_scene(scene)?;
        self.process_scene_events()
    }

    /// Remove `scene` and run the resulting hooks.
    pub fn remove_scene(&mut self, scene: &SceneId) -> DuetResult<()> {
        self.graph.remove_scene(scene)?;
        self.process_scene_events()
    }

    // ── Scene item helpers ───────────────────────────────────────────────

    /// Add a canonical item for `source` to the active scene.
    ///
    /// In dual output mode every secondary display gets its duplicate in the
    /// same call; if any step fails the new item and its copies are removed.
    pub fn add_source(&mut self, source: &SourceId) -> DuetResult<SceneItemId> {
        let scene = self
            .graph
            .active_scene()
            .ok_or_else(|| DuetError::InvalidArgument("no active scene".into()))?;
        let id = self.graph.add_source(&scene, source)?;

        if self.state.mode_enabled {
            if let Err(e) = self.map_new_item(&scene, &id) {
                if let Err(cleanup) = self.graph.remove_item(&id) {
                    tracing::warn!("Could not remove {} after failed mapping: {}", id, cleanup);
                }
                return Err(e);
            }
        }

        self.persist()?;
        Ok(id)
    }

    fn map_new_item(&mut self, scene: &SceneId, id: &SceneItemId) -> DuetResult<()> {
        let item = self
            .graph
            .item(id)
            .ok_or_else(|| DuetError::ItemNotFound(id.clone()))?;
        let mut journal = MappingJournal::default();
        let mut entries = Vec::new();

        for (index, display) in self.displays.clone().into_iter().enumerate() {
            let mapped = match self.contexts.context(display) {
                None => Err(DuetError::allocation(display, "context is not established")),
                Some(context) if index == 0 => self.assign_in_place(&item, context, &mut journal),
                Some(context) => self.duplicate_for(scene, &item, context, &mut journal),
            };
            match mapped {
                Ok(mapped) => entries.push((display, mapped)),
                Err(e) => {
                    for copy in &journal.created {
                        self.graph.remove_item(copy).ok();
                    }
                    return Err(e);
                }
            }
        }

        let maps = self
            .state
            .node_maps
            .get_or_insert_with(|| NodeMaps::new(Some(scene.clone())));
        maps.restore_entries(id, &entries);
        Ok(())
    }

    /// Delete a canonical item together with every display's duplicate.
    ///
    /// Returns the node map entries that were dropped so an undo can hand
    /// them to [`DualOutputCoordinator::restore_nodes_to_map`].
    pub fn remove_canonical_item(&mut self, id: &SceneItemId) -> DuetResult<Vec<(DisplayType, SceneItemId)>> {
        if self.graph.item(id).is_none() {
            return Err(DuetError::ItemNotFound(id.clone()));
        }
        let is_duplicate = self
            .state
            .node_maps
            .as_ref()
            .map(|maps| maps.duplicate_ids(DisplayType::canonical()).contains(id))
            .unwrap_or(false);
        if is_duplicate {
            return Err(DuetError::InvalidArgument(format!(
                "{id} is a display duplicate; remove its canonical item instead"
            )));
        }

        self.graph.remove_item(id)?;
        let entries = match self.state.node_maps.as_mut() {
            Some(maps) => maps.remove(id),
            None => Vec::new(),
        };
        for (kind, copy) in &entries {
            if copy == id {
                continue;
            }
            if let Err(e) = self.graph.remove_item(copy) {
                tracing::warn!("Could not remove {} duplicate {}: {}", kind, copy, e);
            }
        }

        self.persist()?;
        Ok(entries)
    }

    /// Re-insert node map entries for `canonical`. Ignored while dual output is off.
    pub fn restore_nodes_to_map(
        &mut self,
        canonical: &SceneItemId,
        entries: &[(DisplayType, SceneItemId)],
    ) -> DuetResult<()> {
        if !self.state.mode_enabled {
            return Ok(());
        }
        let scene = self.graph.active_scene();
        self.state
            .node_maps
            .get_or_insert_with(|| NodeMaps::new(scene))
            .restore_entries(canonical, entries);
        self.persist()
    }

    // ── Settings ─────────────────────────────────────────────────────────

    pub fn set_video_setting(&mut self, display: DisplayType, setting: VideoSetting) -> DuetResult<VideoContextSettings> {
        self.set_video_settings(display, &[setting])
    }

    pub fn set_video_settings(
        &mut self,
        display: DisplayType,
        settings: &[VideoSetting],
    ) -> DuetResult<VideoContextSettings> {
        let committed = synchronizer::set_settings(display, settings, &mut self.contexts, &mut self.state);
        self.persist()?;
        Ok(committed)
    }

    /// Force vertical timing to match horizontal. Returns whether anything changed.
    pub fn sync_frame_rate_and_scale(&mut self) -> DuetResult<bool> {
        let changed = synchronizer::sync_frame_rate_and_scale(&mut self.contexts, &mut self.state);
        if changed {
            self.persist()?;
        }
        Ok(changed)
    }

    pub fn per_display_settings(&self, display: DisplayType) -> VideoContextSettings {
        synchronizer::resolve_settings(display, &self.state, &self.contexts).settings
    }

    pub fn formatted_settings(&self, display: DisplayType) -> FormattedVideoSettings {
        self.per_display_settings(display).formatted()
    }

    pub fn base_resolutions(&self) -> BTreeMap<DisplayType, Resolution> {
        DisplayType::ALL
            .iter()
            .map(|d| (*d, self.per_display_settings(*d).base))
            .collect()
    }

    // ── Platforms ────────────────────────────────────────────────────────

    pub fn assign_platform(&mut self, platform: PlatformId, target: DisplayType) -> DuetResult<()> {
        let active = self.active_displays();
        self.state.platform_assignments.assign(
            platform.clone(),
            target,
            &active,
            self.state.selective_recording,
        )?;
        tracing::info!("{} now streams the {} display", platform, target);
        self.persist()
    }

    /// Display a platform streams. Unassigned platforms, and platforms
    /// assigned to a display that is not active, stream horizontal.
    pub fn get_platform_display(&self, platform: &PlatformId) -> DisplayType {
        self.state
            .platform_assignments
            .get(platform)
            .filter(|d| self.active_displays().contains(d))
            .unwrap_or_else(DisplayType::canonical)
    }

    pub fn platform_context(&self, platform: &PlatformId) -> Option<ContextId> {
        self.contexts.context(self.get_platform_display(platform))
    }

    /// Display and numeric display id for the streaming layer.
    pub fn platform_context_data(&self, platform: &PlatformId) -> (DisplayType, usize) {
        let display = self.get_platform_display(platform);
        (display, display.index())
    }

    pub fn active_display_platforms(&self, enabled: &[PlatformId]) -> BTreeMap<DisplayType, Vec<PlatformId>> {
        self.state.platform_assignments.display_platforms(enabled)
    }

    pub fn set_selective_recording(&mut self, on: bool) -> DuetResult<()> {
        if on {
            self.state.platform_assignments.check_selective_recording()?;
        }
        self.state.selective_recording = on;
        self.persist()
    }

    // ── Views ────────────────────────────────────────────────────────────

    pub fn resolve_display_node_id(&self, display: DisplayType, canonical: &SceneItemId) -> SceneItemId {
        match &self.state.node_maps {
            Some(maps) => maps.resolve(display, canonical),
            None => canonical.clone(),
        }
    }

    pub fn is_node_visible(&self, display: DisplayType, canonical: &SceneItemId) -> bool {
        let id = self.resolve_display_node_id(display, canonical);
        self.graph.is_visible(&id).unwrap_or(false)
    }

    /// Displays currently rendering: all configured ones in dual output mode.
    pub fn active_displays(&self) -> BTreeSet<DisplayType> {
        if self.state.mode_enabled {
            self.displays.iter().copied().collect()
        } else {
            [DisplayType::canonical()].into_iter().collect()
        }
    }

    /// Every duplicate id on the secondary displays.
    pub fn dual_output_node_ids(&self) -> Vec<SceneItemId> {
        let secondary: Vec<DisplayType> = self.secondary_displays().collect();
        self.state
            .node_maps
            .as_ref()
            .map(|maps| maps.display_ids(&secondary))
            .unwrap_or_default()
    }

    pub fn dual_output_node_pair(&self, canonical: &SceneItemId) -> Option<(SceneItemId, SceneItemId)> {
        self.state.node_maps.as_ref()?.pair(canonical)
    }

    pub fn has_dual_output_scenes(&self) -> bool {
        self.state.node_maps.is_some()
    }

    pub fn show_dual_output_displays(&self) -> bool {
        self.state.mode_enabled && self.has_dual_output_scenes()
    }

    pub fn node_maps(&self) -> Option<&NodeMaps> {
        self.state.node_maps.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.state.mode_enabled
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &DualOutputState {
        &self.state
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Direct graph access. Call [`Self::process_scene_events`] afterwards.
    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    pub fn contexts(&self) -> &ContextStore<B> {
        &self.contexts
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Release every context (saving legacy settings) and persist.
    pub fn shutdown(&mut self) -> DuetResult<()> {
        self.contexts.shutdown();
        self.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use crate::state::MemoryStore;
    use duet_scene::{CollectionBuilder, SceneCollection};

    type TestCoordinator = DualOutputCoordinator<SceneCollection, HeadlessBackend, MemoryStore>;

    fn coordinator() -> TestCoordinator {
        let graph = CollectionBuilder::new("show")
            .scene("main", &[("1", "cam"), ("2", "mic"), ("3", "overlay")])
            .build();
        DualOutputCoordinator::new(graph, HeadlessBackend::default(), MemoryStore::new(), &DuetConfig::default())
            .unwrap()
    }

    #[test]
    fn test_starts_disabled_with_horizontal_context() {
        let c = coordinator();
        assert_eq!(c.phase(), Phase::Disabled);
        assert_eq!(c.contexts().established(), vec![DisplayType::Horizontal]);
        assert_eq!(c.active_displays().len(), 1);
        assert!(c.store().saved().is_some());
    }

    #[test]
    fn test_toggle_rejected_during_transition() {
        let mut c = coordinator();
        c.phase = Phase::Mapping;
        let err = c.toggle(true).unwrap_err();
        assert!(matches!(err, DuetError::TransitionInProgress(_)));
        assert!(!c.is_enabled());
        assert_eq!(c.graph().item_count(), 3);

        c.phase = Phase::Restoring;
        assert!(!c.toggle_dual_output_mode(false));
    }

    #[test]
    fn test_toggle_on_twice_does_not_duplicate_again() {
        let mut c = coordinator();
        c.toggle(true).unwrap();
        c.toggle(true).unwrap();
        assert_eq!(c.graph().item_count(), 6);
    }

    #[test]
    fn test_restore_scene_is_idempotent() {
        let mut c = coordinator();
        c.toggle(true).unwrap();
        c.restore_scene(DisplayType::Horizontal).unwrap();
        c.restore_scene(DisplayType::Horizontal).unwrap();
        assert_eq!(c.graph().item_count(), 3);
        assert!(c.node_maps().is_none());
    }

    #[test]
    fn test_restore_scene_turns_mode_off_with_maps() {
        let mut c = coordinator();
        c.toggle(true).unwrap();
        c.restore_scene(DisplayType::Horizontal).unwrap();

        assert!(!c.is_enabled());
        assert_eq!(c.phase(), Phase::Disabled);
        assert!(!c.contexts().is_established(DisplayType::Vertical));
        assert_eq!(c.active_displays().len(), 1);
        assert!(c.assign_platform(PlatformId::new("tiktok"), DisplayType::Vertical).is_err());
        assert!(!c.store().saved().unwrap().mode_enabled);

        let added = c.add_source(&SourceId::new("browser")).unwrap();
        assert!(c.dual_output_node_pair(&added).is_none());
    }

    #[test]
    fn test_restore_scene_rejected_during_transition() {
        let mut c = coordinator();
        c.toggle(true).unwrap();
        c.phase = Phase::Mapping;
        assert!(matches!(
            c.restore_scene(DisplayType::Horizontal),
            Err(DuetError::TransitionInProgress(_))
        ));
        assert!(c.node_maps().is_some());
    }

    /// Memory store whose saves can be made to fail.
    struct FailingStore {
        inner: MemoryStore,
        fail: bool,
    }

    impl SettingsStore for FailingStore {
        fn load(&self) -> DuetResult<Option<DualOutputState>> {
            self.inner.load()
        }

        fn save(&mut self, state: &DualOutputState) -> DuetResult<()> {
            if self.fail {
                return Err(DuetError::Io(std::io::Error::other("disk full")));
            }
            self.inner.save(state)
        }
    }

    #[test]
    fn test_toggle_facade_reports_mode_when_save_fails() {
        let graph = CollectionBuilder::new("show")
            .scene("main", &[("1", "cam")])
            .build();
        let store = FailingStore {
            inner: MemoryStore::new(),
            fail: false,
        };
        let mut c =
            DualOutputCoordinator::new(graph, HeadlessBackend::default(), store, &DuetConfig::default()).unwrap();
        c.store.fail = true;

        assert!(c.toggle_dual_output_mode(true));
        assert!(c.is_enabled());
        assert!(matches!(c.toggle(false), Err(DuetError::Io(_))));
        assert!(!c.is_enabled());
        assert!(c.toggle_dual_output_mode(false));
    }

    #[test]
    fn test_platform_display_falls_back_to_horizontal() {
        let mut c = coordinator();
        c.toggle(true).unwrap();
        c.assign_platform(PlatformId::new("tiktok"), DisplayType::Vertical).unwrap();
        assert_eq!(c.get_platform_display(&PlatformId::new("tiktok")), DisplayType::Vertical);
        assert_eq!(
            c.platform_context_data(&PlatformId::new("tiktok")),
            (DisplayType::Vertical, 1)
        );

        c.toggle(false).unwrap();
        assert_eq!(c.get_platform_display(&PlatformId::new("tiktok")), DisplayType::Horizontal);
        assert_eq!(c.get_platform_display(&PlatformId::new("unknown")), DisplayType::Horizontal);
    }
}
