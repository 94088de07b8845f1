/// Core error types for the Duet coordinator.
use crate::types::{DisplayType, SceneId, SceneItemId};

/// A specialized Result type for Duet operations.
pub type DuetResult<T> = Result<T, DuetError>;

/// Top-level error type encompassing all Duet subsystems.
#[derive(Debug, thiserror::Error)]
pub enum DuetError {
    #[error("could not allocate a {display} rendering context: {reason}")]
    ResourceAllocation { display: DisplayType, reason: String },

    #[error("dual output mapping failed for {failed} of {total} scene items")]
    Mapping { failed: usize, total: usize },

    #[error("platform assignment rejected: {0}")]
    AssignmentConflict(String),

    #[error("a dual output transition is already in progress ({0})")]
    TransitionInProgress(String),

    #[error("scene not found: {0}")]
    SceneNotFound(SceneId),

    #[error("scene item not found: {0}")]
    ItemNotFound(SceneItemId),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Other(String),
}

impl DuetError {
    /// Create a resource allocation error for a display.
    pub fn allocation(display: DisplayType, reason: impl Into<String>) -> Self {
        DuetError::ResourceAllocation {
            display,
            reason: reason.into(),
        }
    }

    /// Create an assignment conflict with a human readable reason.
    pub fn conflict(reason: impl Into<String>) -> Self {
        DuetError::AssignmentConflict(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_error_display() {
        let err = DuetError::allocation(DisplayType::Vertical, "out of video memory");
        assert_eq!(
            err.to_string(),
            "could not allocate a vertical rendering context: out of video memory"
        );
    }

    #[test]
    fn test_mapping_error_display() {
        let err = DuetError::Mapping { failed: 2, total: 5 };
        assert!(err.to_string().contains("2 of 5"));
    }
}
