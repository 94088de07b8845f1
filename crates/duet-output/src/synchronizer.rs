//! Keeps per-display video settings populated and timing-consistent.
//!
//! Horizontal is authoritative for every timing field: two encoders fed
//! from one scene must agree on frame rate and scaling or stream duration
//! drifts.

use serde::{Deserialize, Serialize};

use crate::backend::RenderBackend;
use crate::context::ContextStore;
use crate::state::DualOutputState;
use duet_core::{DisplayType, VideoContextSettings, VideoSetting};

/// Where a display's settings were resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingsSource {
    /// Dual output state saved by a previous run.
    Persisted,
    /// Settings left by a single-context session.
    Legacy,
    /// Whatever the freshly allocated context started with.
    LiveContext,
    /// Configured defaults, when no context exists yet.
    Defaults,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedSettings {
    pub settings: VideoContextSettings,
    pub source: SettingsSource,
    pub frame_rate_corrected: bool,
}

/// Resolve settings for `display` in precedence order: persisted, legacy
/// (ignored when its base resolution is zeroed), live context, defaults.
pub fn resolve_settings<B: RenderBackend>(
    display: DisplayType,
    state: &DualOutputState,
    contexts: &ContextStore<B>,
) -> ResolvedSettings {
    let (settings, source) = if let Some(persisted) = state.per_display_settings.get(&display) {
        (*persisted, SettingsSource::Persisted)
    } else if let Some(legacy) = contexts
        .legacy_settings(display)
        .filter(|legacy| !legacy.base.is_zero())
    {
        (legacy, SettingsSource::Legacy)
    } else if let Some(live) = contexts.settings(display) {
        (*live, SettingsSource::LiveContext)
    } else {
        (contexts.defaults_for(display), SettingsSource::Defaults)
    };

    ResolvedSettings {
        settings,
        source,
        frame_rate_corrected: false,
    }
}

/// Seed a display's settings, correct an invalid frame rate, and commit the
/// result to both the live context and the persisted state.
pub fn migrate<B: RenderBackend>(
    kind: DisplayType,
    contexts: &mut ContextStore<B>,
    state: &mut DualOutputState,
) -> ResolvedSettings {
    let mut resolved = resolve_settings(kind, state, contexts);
    if resolved.settings.sanitize() {
        tracing::debug!(
            "Reset invalid {} frame rate to {}/{}",
            kind,
            resolved.settings.fps_num,
            resolved.settings.fps_den
        );
        resolved.frame_rate_corrected = true;
    }

    contexts.apply(kind, &resolved.settings);
    state.per_display_settings.insert(kind, resolved.settings);
    resolved
}

fn copy_timing(from: &VideoContextSettings, to: &mut VideoContextSettings) -> bool {
    if from.timing_matches(to) {
        return false;
    }
    to.scale_type = from.scale_type;
    to.fps_type = from.fps_type;
    to.fps_num = from.fps_num;
    to.fps_den = from.fps_den;
    true
}

/// Copy horizontal scale type, fps type and frame rate into vertical.
///
/// Returns whether any vertical field changed, persisted or live.
pub fn sync_frame_rate_and_scale<B: RenderBackend>(
    contexts: &mut ContextStore<B>,
    state: &mut DualOutputState,
) -> bool {
    let horizontal = contexts
        .settings(DisplayType::Horizontal)
        .copied()
        .or_else(|| state.per_display_settings.get(&DisplayType::Horizontal).copied());
    let Some(horizontal) = horizontal else {
        return false;
    };

    let mut changed = false;
    if let Some(vertical) = state.per_display_settings.get_mut(&DisplayType::Vertical) {
        changed |= copy_timing(&horizontal, vertical);
    }

    if let Some(mut live) = contexts.settings(DisplayType::Vertical).copied() {
        if copy_timing(&horizontal, &mut live) {
            contexts.apply(DisplayType::Vertical, &live);
            changed = true;
        }
    }

    if changed {
        tracing::debug!(
            "Vertical timing synced to horizontal ({:?}, {}/{})",
            horizontal.scale_type,
            horizontal.fps_num,
            horizontal.fps_den
        );
    }
    changed
}

/// Write several fields for `kind` at once.
///
/// The frame rate is validated after all fields are applied, so a fraction
/// such as 30000/1001 can be written in one call. Works before a context
/// exists; the write then lands in persisted state only.
pub fn set_settings<B: RenderBackend>(
    kind: DisplayType,
    writes: &[VideoSetting],
    contexts: &mut ContextStore<B>,
    state: &mut DualOutputState,
) -> VideoContextSettings {
    let mut settings = resolve_settings(kind, state, contexts).settings;
    for write in writes {
        settings.apply(*write);
    }
    if settings.sanitize() {
        tracing::debug!("Reset invalid {} frame rate to 30/1", kind);
    }

    state.per_display_settings.insert(kind, settings);
    contexts.apply(kind, &settings);

    if writes.iter().any(|w| w.key().is_timing()) {
        sync_frame_rate_and_scale(contexts, state);
    }

    let committed = state
        .per_display_settings
        .get(&kind)
        .copied()
        .unwrap_or(settings);
    if kind == DisplayType::Vertical {
        contexts.refresh_legacy(kind, committed);
    }
    committed
}

/// Write one field for `display`.
pub fn set_setting<B: RenderBackend>(
    display: DisplayType,
    write: VideoSetting,
    contexts: &mut ContextStore<B>,
    state: &mut DualOutputState,
) -> VideoContextSettings {
    set_settings(display, &[write], contexts, state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use duet_core::{DuetConfig, Resolution, ScaleType};

    fn fixture(backend: HeadlessBackend) -> (ContextStore<HeadlessBackend>, DualOutputState) {
        let config = DuetConfig::default();
        (
            ContextStore::new(backend, config.displays.clone()),
            DualOutputState::from_config(&config),
        )
    }

    #[test]
    fn test_migrate_prefers_legacy_on_first_run() {
        let legacy = VideoContextSettings {
            base: Resolution::new(2560, 1440),
            ..VideoContextSettings::default()
        };
        let (mut contexts, mut state) =
            fixture(HeadlessBackend::default().with_legacy(DisplayType::Horizontal, legacy));
        contexts.establish(DisplayType::Horizontal, &mut state).unwrap();

        let resolved = resolve_settings(DisplayType::Horizontal, &state, &contexts);
        assert_eq!(resolved.source, SettingsSource::Persisted);
        assert_eq!(state.per_display_settings[&DisplayType::Horizontal].base.width, 2560);
        assert_eq!(contexts.settings(DisplayType::Horizontal).unwrap().base.width, 2560);
    }

    #[test]
    fn test_zeroed_legacy_falls_back_to_live_context() {
        let zeroed = VideoContextSettings {
            base: Resolution::new(0, 0),
            ..VideoContextSettings::default()
        };
        let (mut contexts, mut state) =
            fixture(HeadlessBackend::default().with_legacy(DisplayType::Horizontal, zeroed));
        contexts.establish(DisplayType::Horizontal, &mut state).unwrap();
        assert_eq!(state.per_display_settings[&DisplayType::Horizontal].base.width, 1920);
    }

    #[test]
    fn test_resolution_order_without_context_is_defaults() {
        let (contexts, state) = fixture(HeadlessBackend::default());
        let resolved = resolve_settings(DisplayType::Vertical, &state, &contexts);
        assert_eq!(resolved.source, SettingsSource::Defaults);
        assert_eq!(resolved.settings.base, Resolution::new(720, 1280));
    }

    #[test]
    fn test_migrate_corrects_tiny_frame_rate() {
        let (mut contexts, mut state) = fixture(HeadlessBackend::default());
        state.per_display_settings.insert(
            DisplayType::Horizontal,
            VideoContextSettings {
                fps_num: 1,
                fps_den: 2000,
                ..VideoContextSettings::default()
            },
        );
        contexts.establish(DisplayType::Horizontal, &mut state).unwrap();
        let persisted = state.per_display_settings[&DisplayType::Horizontal];
        assert_eq!((persisted.fps_num, persisted.fps_den), (30, 1));
        assert_eq!(contexts.settings(DisplayType::Horizontal).unwrap().fps_num, 30);
    }

    #[test]
    fn test_sync_copies_horizontal_timing() {
        let (mut contexts, mut state) = fixture(HeadlessBackend::default());
        state.per_display_settings.insert(
            DisplayType::Horizontal,
            VideoContextSettings {
                scale_type: ScaleType::Lanczos,
                fps_num: 30,
                fps_den: 1,
                ..VideoContextSettings::landscape_1080p()
            },
        );
        state.per_display_settings.insert(
            DisplayType::Vertical,
            VideoContextSettings {
                scale_type: ScaleType::Bilinear,
                fps_num: 24,
                fps_den: 1,
                ..VideoContextSettings::portrait_720p()
            },
        );

        assert!(sync_frame_rate_and_scale(&mut contexts, &mut state));
        let h = state.per_display_settings[&DisplayType::Horizontal];
        let v = state.per_display_settings[&DisplayType::Vertical];
        assert!(h.timing_matches(&v));
        assert_eq!(v.base, Resolution::new(720, 1280));
        assert!(!sync_frame_rate_and_scale(&mut contexts, &mut state));
    }

    #[test]
    fn test_sync_updates_live_vertical_context() {
        let (mut contexts, mut state) = fixture(HeadlessBackend::default());
        contexts.establish(DisplayType::Horizontal, &mut state).unwrap();
        contexts.establish(DisplayType::Vertical, &mut state).unwrap();
        contexts.apply(
            DisplayType::Horizontal,
            &VideoContextSettings {
                fps_num: 60,
                ..VideoContextSettings::landscape_1080p()
            },
        );

        assert!(sync_frame_rate_and_scale(&mut contexts, &mut state));
        assert_eq!(contexts.settings(DisplayType::Vertical).unwrap().fps_num, 60);
        assert_eq!(state.per_display_settings[&DisplayType::Vertical].fps_num, 60);
    }

    #[test]
    fn test_set_setting_before_context_exists() {
        let (mut contexts, mut state) = fixture(HeadlessBackend::default());
        set_setting(
            DisplayType::Vertical,
            VideoSetting::BaseResolution(Resolution::new(1080, 1920)),
            &mut contexts,
            &mut state,
        );
        assert!(!contexts.is_established(DisplayType::Vertical));
        assert_eq!(
            state.per_display_settings[&DisplayType::Vertical].base,
            Resolution::new(1080, 1920)
        );
        assert_eq!(
            contexts.legacy_settings(DisplayType::Vertical).unwrap().base,
            Resolution::new(1080, 1920)
        );
    }

    #[test]
    fn test_set_settings_accepts_fractional_rate_in_one_call() {
        let (mut contexts, mut state) = fixture(HeadlessBackend::default());
        contexts.establish(DisplayType::Horizontal, &mut state).unwrap();
        let written = set_settings(
            DisplayType::Horizontal,
            &[VideoSetting::FpsNum(30000), VideoSetting::FpsDen(1001)],
            &mut contexts,
            &mut state,
        );
        assert_eq!((written.fps_num, written.fps_den), (30000, 1001));
    }

    #[test]
    fn test_invalid_single_write_resets_to_default_rate() {
        let (mut contexts, mut state) = fixture(HeadlessBackend::default());
        contexts.establish(DisplayType::Horizontal, &mut state).unwrap();
        let written = set_setting(
            DisplayType::Horizontal,
            VideoSetting::FpsNum(5000),
            &mut contexts,
            &mut state,
        );
        assert_eq!((written.fps_num, written.fps_den), (30, 1));
    }

    #[test]
    fn test_horizontal_fps_write_propagates_to_vertical() {
        let (mut contexts, mut state) = fixture(HeadlessBackend::default());
        contexts.establish(DisplayType::Horizontal, &mut state).unwrap();
        contexts.establish(DisplayType::Vertical, &mut state).unwrap();
        set_setting(DisplayType::Horizontal, VideoSetting::FpsNum(60), &mut contexts, &mut state);
        assert_eq!(contexts.settings(DisplayType::Vertical).unwrap().fps_num, 60);
    }

    #[test]
    fn test_vertical_timing_write_is_overridden_by_horizontal() {
        let (mut contexts, mut state) = fixture(HeadlessBackend::default());
        contexts.establish(DisplayType::Horizontal, &mut state).unwrap();
        contexts.establish(DisplayType::Vertical, &mut state).unwrap();
        let written = set_setting(DisplayType::Vertical, VideoSetting::FpsNum(24), &mut contexts, &mut state);
        assert_eq!(written.fps_num, 30);
    }
}
