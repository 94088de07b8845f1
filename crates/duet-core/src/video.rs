use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DuetError;
use crate::types::DisplayType;

/// Frame rate every invalid configuration is reset to.
pub const DEFAULT_FPS_NUM: u32 = 30;
pub const DEFAULT_FPS_DEN: u32 = 1;

/// Upper bound of the numerator/denominator ratio.
pub const MAX_FPS_RATIO: u64 = 1000;

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A zeroed resolution means "never configured".
    pub fn is_zero(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = DuetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once('x')
            .ok_or_else(|| DuetError::InvalidArgument(format!("resolution '{s}' is not WxH")))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|e| DuetError::InvalidArgument(format!("resolution '{s}': {e}")))
        };
        Ok(Resolution::new(parse(w)?, parse(h)?))
    }
}

/// Scaling algorithm used when base and output resolution differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleType {
    Disable,
    Point,
    Bicubic,
    Bilinear,
    Lanczos,
    Area,
}

impl Default for ScaleType {
    fn default() -> Self {
        ScaleType::Bicubic
    }
}

impl FromStr for ScaleType {
    type Err = DuetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "disable" => Ok(ScaleType::Disable),
            "point" => Ok(ScaleType::Point),
            "bicubic" => Ok(ScaleType::Bicubic),
            "bilinear" => Ok(ScaleType::Bilinear),
            "lanczos" => Ok(ScaleType::Lanczos),
            "area" => Ok(ScaleType::Area),
            other => Err(DuetError::InvalidArgument(format!("unknown scale type '{other}'"))),
        }
    }
}

/// How the frame rate was entered by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FpsType {
    Common,
    Integer,
    Fraction,
}

impl Default for FpsType {
    fn default() -> Self {
        FpsType::Common
    }
}

impl FromStr for FpsType {
    type Err = DuetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "common" => Ok(FpsType::Common),
            "integer" => Ok(FpsType::Integer),
            "fraction" => Ok(FpsType::Fraction),
            other => Err(DuetError::InvalidArgument(format!("unknown fps type '{other}'"))),
        }
    }
}

/// Video configuration of one display's rendering context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoContextSettings {
    pub base: Resolution,
    pub output: Resolution,
    pub scale_type: ScaleType,
    pub fps_type: FpsType,
    pub fps_num: u32,
    pub fps_den: u32,
}

impl VideoContextSettings {
    /// 1080p landscape at 30fps.
    pub fn landscape_1080p() -> Self {
        Self {
            base: Resolution::new(1920, 1080),
            output: Resolution::new(1920, 1080),
            scale_type: ScaleType::Bicubic,
            fps_type: FpsType::Common,
            fps_num: DEFAULT_FPS_NUM,
            fps_den: DEFAULT_FPS_DEN,
        }
    }

    /// 720x1280 portrait at 30fps.
    pub fn portrait_720p() -> Self {
        Self {
            base: Resolution::new(720, 1280),
            output: Resolution::new(720, 1280),
            ..Self::landscape_1080p()
        }
    }

    /// Built-in defaults for a display.
    pub fn defaults_for(display: DisplayType) -> Self {
        match display {
            DisplayType::Horizontal => Self::landscape_1080p(),
            DisplayType::Vertical => Self::portrait_720p(),
        }
    }

    /// Frame-rate ratio `fps_num / fps_den` must lie within `[1, 1000]`.
    pub fn has_valid_frame_rate(&self) -> bool {
        is_valid_frame_rate(self.fps_num, self.fps_den)
    }

    /// Reset an out-of-range frame rate to 30/1. Returns whether it changed.
    pub fn sanitize(&mut self) -> bool {
        if self.has_valid_frame_rate() {
            return false;
        }
        self.fps_num = DEFAULT_FPS_NUM;
        self.fps_den = DEFAULT_FPS_DEN;
        true
    }

    /// Whether scale and frame-rate fields agree with `other`.
    pub fn timing_matches(&self, other: &VideoContextSettings) -> bool {
        self.scale_type == other.scale_type
            && self.fps_type == other.fps_type
            && self.fps_num == other.fps_num
            && self.fps_den == other.fps_den
    }

    /// Write one field.
    pub fn apply(&mut self, setting: VideoSetting) {
        match setting {
            VideoSetting::BaseResolution(r) => self.base = r,
            VideoSetting::OutputResolution(r) => self.output = r,
            VideoSetting::ScaleType(s) => self.scale_type = s,
            VideoSetting::FpsType(t) => self.fps_type = t,
            VideoSetting::FpsNum(n) => self.fps_num = n,
            VideoSetting::FpsDen(d) => self.fps_den = d,
        }
    }

    /// Human readable form used by settings panels.
    pub fn formatted(&self) -> FormattedVideoSettings {
        FormattedVideoSettings {
            base_res: self.base.to_string(),
            output_res: self.output.to_string(),
            scale_type: self.scale_type,
            fps_type: self.fps_type,
            fps_com: format!("{}-{}", self.fps_num, self.fps_den),
            fps_num: self.fps_num,
            fps_den: self.fps_den,
            fps_int: self.fps_num,
        }
    }
}

impl Default for VideoContextSettings {
    fn default() -> Self {
        Self::landscape_1080p()
    }
}

/// Validate a frame-rate ratio without floating point.
pub fn is_valid_frame_rate(num: u32, den: u32) -> bool {
    if den == 0 {
        return false;
    }
    let (num, den) = (num as u64, den as u64);
    num >= den && num <= den * MAX_FPS_RATIO
}

/// Field names of [`VideoContextSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VideoSettingKey {
    BaseRes,
    OutputRes,
    ScaleType,
    FpsType,
    FpsNum,
    FpsDen,
}

impl VideoSettingKey {
    /// Keys that must agree between displays so encoder timing cannot drift.
    pub fn is_timing(&self) -> bool {
        matches!(
            self,
            VideoSettingKey::ScaleType
                | VideoSettingKey::FpsType
                | VideoSettingKey::FpsNum
                | VideoSettingKey::FpsDen
        )
    }
}

impl FromStr for VideoSettingKey {
    type Err = DuetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "baseRes" | "base_res" => Ok(VideoSettingKey::BaseRes),
            "outputRes" | "output_res" => Ok(VideoSettingKey::OutputRes),
            "scaleType" | "scale_type" => Ok(VideoSettingKey::ScaleType),
            "fpsType" | "fps_type" => Ok(VideoSettingKey::FpsType),
            "fpsNum" | "fps_num" => Ok(VideoSettingKey::FpsNum),
            "fpsDen" | "fps_den" => Ok(VideoSettingKey::FpsDen),
            other => Err(DuetError::InvalidArgument(format!("unknown video setting '{other}'"))),
        }
    }
}

/// One typed video setting write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoSetting {
    BaseResolution(Resolution),
    OutputResolution(Resolution),
    ScaleType(ScaleType),
    FpsType(FpsType),
    FpsNum(u32),
    FpsDen(u32),
}

impl VideoSetting {
    pub fn key(&self) -> VideoSettingKey {
        match self {
            VideoSetting::BaseResolution(_) => VideoSettingKey::BaseRes,
            VideoSetting::OutputResolution(_) => VideoSettingKey::OutputRes,
            VideoSetting::ScaleType(_) => VideoSettingKey::ScaleType,
            VideoSetting::FpsType(_) => VideoSettingKey::FpsType,
            VideoSetting::FpsNum(_) => VideoSettingKey::FpsNum,
            VideoSetting::FpsDen(_) => VideoSettingKey::FpsDen,
        }
    }

    /// Parse a value for `key`.
    pub fn parse(key: VideoSettingKey, value: &str) -> Result<Self, DuetError> {
        let number = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|e| DuetError::InvalidArgument(format!("{key:?} value '{v}': {e}")))
        };
        Ok(match key {
            VideoSettingKey::BaseRes => VideoSetting::BaseResolution(value.parse()?),
            VideoSettingKey::OutputRes => VideoSetting::OutputResolution(value.parse()?),
            VideoSettingKey::ScaleType => VideoSetting::ScaleType(value.parse()?),
            VideoSettingKey::FpsType => VideoSetting::FpsType(value.parse()?),
            VideoSettingKey::FpsNum => VideoSetting::FpsNum(number(value)?),
            VideoSettingKey::FpsDen => VideoSetting::FpsDen(number(value)?),
        })
    }
}

impl FromStr for VideoSetting {
    type Err = DuetError;

    /// Parses `key=value`, e.g. `fpsNum=60` or `baseRes=1080x1920`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| DuetError::InvalidArgument(format!("expected key=value, got '{s}'")))?;
        VideoSetting::parse(key.trim().parse()?, value)
    }
}

/// Display strings for a settings panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedVideoSettings {
    pub base_res: String,
    pub output_res: String,
    pub scale_type: ScaleType,
    pub fps_type: FpsType,
    pub fps_com: String,
    pub fps_num: u32,
    pub fps_den: u32,
    pub fps_int: u32,
}
