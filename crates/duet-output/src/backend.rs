use std::collections::{BTreeMap, BTreeSet};

use duet_core::{ContextId, DisplaysConfig, DisplayType, DuetError, DuetResult, VideoContextSettings};

/// The rendering subsystem that owns live video contexts.
pub trait RenderBackend {
    /// Allocate a context for `display`. Failure is fatal for that display.
    fn create_context(&mut self, display: DisplayType) -> DuetResult<ContextId>;

    /// Release a context. Unknown ids are ignored.
    fn destroy_context(&mut self, id: ContextId);

    /// Push settings into a live context.
    fn apply_settings(&mut self, id: ContextId, settings: &VideoContextSettings);

    /// Current settings of a live context.
    fn context_settings(&self, id: ContextId) -> Option<VideoContextSettings>;

    /// Settings saved by a previous single-context session.
    fn legacy_settings(&self, display: DisplayType) -> Option<VideoContextSettings>;

    fn store_legacy_settings(&mut self, display: DisplayType, settings: VideoContextSettings);

    /// Mirror a context as the process-wide default, or clear it.
    fn set_default_context(&mut self, id: Option<ContextId>);

    fn default_context(&self) -> Option<ContextId>;
}

/// In-memory backend: contexts are plain settings records.
#[derive(Debug, Clone)]
pub struct HeadlessBackend {
    next_id: u64,
    defaults: DisplaysConfig,
    contexts: BTreeMap<ContextId, VideoContextSettings>,
    legacy: BTreeMap<DisplayType, VideoContextSettings>,
    default_context: Option<ContextId>,
    refused: BTreeSet<DisplayType>,
    created: usize,
}

impl HeadlessBackend {
    pub fn new(defaults: DisplaysConfig) -> Self {
        Self {
            next_id: 1,
            defaults,
            contexts: BTreeMap::new(),
            legacy: BTreeMap::new(),
            default_context: None,
            refused: BTreeSet::new(),
            created: 0,
        }
    }

    /// Seed legacy settings as an older single-context install would have left them.
    pub fn with_legacy(mut self, display: DisplayType, settings: VideoContextSettings) -> Self {
        self.legacy.insert(display, settings);
        self
    }

    /// Make every future allocation for `display` fail.
    pub fn refuse_allocation(&mut self, display: DisplayType) {
        self.refused.insert(display);
    }

    pub fn allow_allocation(&mut self, display: DisplayType) {
        self.refused.remove(&display);
    }

    /// Number of contexts currently alive.
    pub fn live_contexts(&self) -> usize {
        self.contexts.len()
    }

    /// Number of contexts ever allocated.
    pub fn contexts_created(&self) -> usize {
        self.created
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(DisplaysConfig::default())
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_context(&mut self, display: DisplayType) -> DuetResult<ContextId> {
        if self.refused.contains(&display) {
            return Err(DuetError::allocation(display, "headless backend refused allocation"));
        }
        let id = ContextId(self.next_id);
        self.next_id += 1;
        self.created += 1;
        self.contexts.insert(id, self.defaults.defaults_for(display));
        Ok(id)
    }

    fn destroy_context(&mut self, id: ContextId) {
        self.contexts.remove(&id);
        if self.default_context == Some(id) {
            self.default_context = None;
        }
    }

    fn apply_settings(&mut self, id: ContextId, settings: &VideoContextSettings) {
        match self.contexts.get_mut(&id) {
            Some(live) => *live = *settings,
            None => tracing::warn!("Settings pushed to unknown context {}", id),
        }
    }

    fn context_settings(&self, id: ContextId) -> Option<VideoContextSettings> {
        self.contexts.get(&id).copied()
    }

    fn legacy_settings(&self, display: DisplayType) -> Option<VideoContextSettings> {
        self.legacy.get(&display).copied()
    }

    fn store_legacy_settings(&mut self, display: DisplayType, settings: VideoContextSettings) {
        self.legacy.insert(display, settings);
    }

    fn set_default_context(&mut self, id: Option<ContextId>) {
        self.default_context = id;
    }

    fn default_context(&self) -> Option<ContextId> {
        self.default_context
    }
}
