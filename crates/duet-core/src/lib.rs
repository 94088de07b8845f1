//! # duet-core
//!
//! Core types and primitives for the Duet dual-output coordinator.
//! This crate contains the foundational types shared across all Duet crates:
//! display kinds, identifiers, render targets, per-display video settings,
//! configuration and error types.

pub mod config;
pub mod error;
pub mod types;
pub mod video;

pub use config::*;

pub use error::{DuetError, DuetResult};
pub use types::{ContextId, DisplayType, PlatformId, RenderTarget, SceneId, SceneItemId, SourceId};
pub use video::{
    FormattedVideoSettings, FpsType, Resolution, ScaleType, VideoContextSettings, VideoSetting,
    VideoSettingKey,
};
