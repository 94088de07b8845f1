use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DuetError;

/// One independent output pipeline.
///
/// Horizontal is always the canonical display: its scene items are the
/// originals, every other display renders duplicates of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayType {
    Horizontal,
    Vertical,
}

impl DisplayType {
    /// Every display, canonical first.
    pub const ALL: [DisplayType; 2] = [DisplayType::Horizontal, DisplayType::Vertical];

    /// The canonical display.
    pub fn canonical() -> Self {
        DisplayType::Horizontal
    }

    pub fn is_canonical(&self) -> bool {
        *self == DisplayType::Horizontal
    }

    /// Numeric display id handed to the streaming layer.
    pub fn index(&self) -> usize {
        match self {
            DisplayType::Horizontal => 0,
            DisplayType::Vertical => 1,
        }
    }
}

impl Default for DisplayType {
    fn default() -> Self {
        DisplayType::Horizontal
    }
}

impl fmt::Display for DisplayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayType::Horizontal => write!(f, "horizontal"),
            DisplayType::Vertical => write!(f, "vertical"),
        }
    }
}

impl FromStr for DisplayType {
    type Err = DuetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal" => Ok(DisplayType::Horizontal),
            "vertical" => Ok(DisplayType::Vertical),
            other => Err(DuetError::InvalidArgument(format!(
                "unknown display '{other}' (expected horizontal or vertical)"
            ))),
        }
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Unique identifier for a scene.
    SceneId
);
string_id!(
    /// Unique identifier for a scene item (a node in the scene graph).
    SceneItemId
);
string_id!(
    /// Identifier of the source a scene item draws from. Duplicates share it.
    SourceId
);
string_id!(
    /// External streaming destination, e.g. `twitch`.
    PlatformId
);

/// Handle to one live rendering context owned by the render backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContextId(pub u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Where a scene item renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderTarget {
    /// The process-wide default context consumed by single-context callers.
    Default,
    /// A specific display context.
    Context(ContextId),
}

impl Default for RenderTarget {
    fn default() -> Self {
        RenderTarget::Default
    }
}
