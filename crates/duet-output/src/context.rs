use std::collections::BTreeMap;

use crate::backend::RenderBackend;
use crate::state::DualOutputState;
use crate::synchronizer;
use duet_core::{ContextId, DisplaysConfig, DisplayType, DuetResult, VideoContextSettings};

/// A live context and the settings last pushed into it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextHandle {
    pub id: ContextId,
    pub settings: VideoContextSettings,
}

/// Owns zero or one rendering context per display.
#[derive(Debug)]
pub struct ContextStore<B: RenderBackend> {
    backend: B,
    defaults: DisplaysConfig,
    handles: BTreeMap<DisplayType, ContextHandle>,
}

impl<B: RenderBackend> ContextStore<B> {
    pub fn new(backend: B, defaults: DisplaysConfig) -> Self {
        Self {
            backend,
            defaults,
            handles: BTreeMap::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Bring up the context for `kind`.
    ///
    /// Returns `Ok(false)` without touching anything if it already exists.
    /// A fresh context is seeded through [`synchronizer::migrate`]; the
    /// horizontal one is also mirrored as the backend's default context.
    pub fn establish(&mut self, kind: DisplayType, state: &mut DualOutputState) -> DuetResult<bool> {
        if self.handles.contains_key(&kind) {
            return Ok(false);
        }

        let id = self.backend.create_context(kind)?;
        let live = self
            .backend
            .context_settings(id)
            .unwrap_or_else(|| self.defaults.defaults_for(kind));
        self.handles.insert(kind, ContextHandle { id, settings: live });

        let resolved = synchronizer::migrate(kind, self, state);
        if kind.is_canonical() {
            self.backend.set_default_context(Some(id));
        }

        tracing::info!(
            "Established {} context {} ({} @ {}/{} fps, settings from {:?})",
            kind,
            id,
            resolved.settings.base,
            resolved.settings.fps_num,
            resolved.settings.fps_den,
            resolved.source
        );
        Ok(true)
    }

    /// Save the context's settings as legacy settings and release it.
    pub fn destroy(&mut self, kind: DisplayType) -> bool {
        let Some(handle) = self.handles.remove(&kind) else {
            return false;
        };
        self.backend.store_legacy_settings(kind, handle.settings);
        self.backend.destroy_context(handle.id);
        if kind.is_canonical() {
            self.backend.set_default_context(None);
        }
        tracing::info!("Destroyed {} context {}", kind, handle.id);
        true
    }

    /// Tear down every secondary context, keeping horizontal.
    pub fn reset_to_default(&mut self) {
        let secondary: Vec<DisplayType> = self
            .handles
            .keys()
            .copied()
            .filter(|d| !d.is_canonical())
            .collect();
        for display in secondary {
            self.destroy(display);
        }
    }

    pub fn shutdown(&mut self) {
        let all: Vec<DisplayType> = self.handles.keys().copied().collect();
        for display in all {
            self.destroy(display);
        }
    }

    pub fn context(&self, display: DisplayType) -> Option<ContextId> {
        self.handles.get(&display).map(|h| h.id)
    }

    pub fn settings(&self, display: DisplayType) -> Option<&VideoContextSettings> {
        self.handles.get(&display).map(|h| &h.settings)
    }

    pub fn is_established(&self, display: DisplayType) -> bool {
        self.handles.contains_key(&display)
    }

    pub fn established(&self) -> Vec<DisplayType> {
        self.handles.keys().copied().collect()
    }

    pub fn default_context(&self) -> Option<ContextId> {
        self.backend.default_context()
    }

    pub fn defaults_for(&self, display: DisplayType) -> VideoContextSettings {
        self.defaults.defaults_for(display)
    }

    pub fn legacy_settings(&self, display: DisplayType) -> Option<VideoContextSettings> {
        self.backend.legacy_settings(display)
    }

    /// Republish settings for single-context consumers.
    pub fn refresh_legacy(&mut self, display: DisplayType, settings: VideoContextSettings) {
        self.backend.store_legacy_settings(display, settings);
    }

    /// Push settings into the live context. Returns false if none exists.
    pub fn apply(&mut self, display: DisplayType, settings: &VideoContextSettings) -> bool {
        let Some(handle) = self.handles.get_mut(&display) else {
            return false;
        };
        handle.settings = *settings;
        self.backend.apply_settings(handle.id, settings);
        true
    }
}
