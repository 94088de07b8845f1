use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use duet_core::{DisplayType, DuetError, DuetResult, PlatformId};

/// Which display each streaming destination draws from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformAssignments(BTreeMap<PlatformId, DisplayType>);

impl PlatformAssignments {
    pub fn new(assignments: BTreeMap<PlatformId, DisplayType>) -> Self {
        Self(assignments)
    }

    pub fn get(&self, platform: &PlatformId) -> Option<DisplayType> {
        self.0.get(platform).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlatformId, &DisplayType)> {
        self.0.iter()
    }

    /// Record `platform -> display`.
    ///
    /// The display must be active, and vertical is off limits while
    /// selective recording is on. A rejected assignment leaves the previous
    /// one in place.
    pub fn assign(
        &mut self,
        platform: PlatformId,
        display: DisplayType,
        active: &BTreeSet<DisplayType>,
        selective_recording: bool,
    ) -> DuetResult<()> {
        if !active.contains(&display) {
            return Err(DuetError::conflict(format!(
                "{platform} cannot stream the {display} display because it is not enabled"
            )));
        }
        if selective_recording && display == DisplayType::Vertical {
            return Err(DuetError::conflict(format!(
                "{platform} cannot stream the vertical display while selective recording is on"
            )));
        }
        self.0.insert(platform, display);
        Ok(())
    }

    /// Selective recording can only be switched on if nothing streams vertical.
    pub fn check_selective_recording(&self) -> DuetResult<()> {
        let vertical: Vec<String> = self
            .0
            .iter()
            .filter(|(_, display)| **display == DisplayType::Vertical)
            .map(|(platform, _)| platform.to_string())
            .collect();
        if vertical.is_empty() {
            Ok(())
        } else {
            Err(DuetError::conflict(format!(
                "selective recording is unavailable while {} stream the vertical display",
                vertical.join(", ")
            )))
        }
    }

    /// Group the enabled platforms by the display they stream.
    pub fn display_platforms(&self, enabled: &[PlatformId]) -> BTreeMap<DisplayType, Vec<PlatformId>> {
        let mut grouped: BTreeMap<DisplayType, Vec<PlatformId>> =
            DisplayType::ALL.iter().map(|d| (*d, Vec::new())).collect();
        for (platform, display) in &self.0 {
            if enabled.contains(platform) {
                grouped.entry(*display).or_default().push(platform.clone());
            }
        }
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn both() -> BTreeSet<DisplayType> {
        DisplayType::ALL.into_iter().collect()
    }

    #[test]
    fn test_assign_to_active_display() {
        let mut assignments = PlatformAssignments::default();
        assignments
            .assign(PlatformId::new("tiktok"), DisplayType::Vertical, &both(), false)
            .unwrap();
        assert_eq!(assignments.get(&PlatformId::new("tiktok")), Some(DisplayType::Vertical));
    }

    #[test]
    fn test_inactive_display_rejected() {
        let mut assignments = PlatformAssignments::default();
        let only_horizontal: BTreeSet<_> = [DisplayType::Horizontal].into_iter().collect();
        let err = assignments
            .assign(PlatformId::new("tiktok"), DisplayType::Vertical, &only_horizontal, false)
            .unwrap_err();
        assert!(matches!(err, DuetError::AssignmentConflict(_)));
        assert_eq!(assignments.get(&PlatformId::new("tiktok")), None);
    }

    #[test]
    fn test_selective_recording_blocks_vertical() {
        let mut assignments = PlatformAssignments::default();
        assignments
            .assign(PlatformId::new("twitch"), DisplayType::Horizontal, &both(), true)
            .unwrap();
        let err = assignments
            .assign(PlatformId::new("twitch"), DisplayType::Vertical, &both(), true)
            .unwrap_err();
        assert!(err.to_string().contains("selective recording"));
        assert_eq!(assignments.get(&PlatformId::new("twitch")), Some(DisplayType::Horizontal));
    }

    #[test]
    fn test_check_selective_recording() {
        let mut assignments = PlatformAssignments::default();
        assert!(assignments.check_selective_recording().is_ok());
        assignments
            .assign(PlatformId::new("tiktok"), DisplayType::Vertical, &both(), false)
            .unwrap();
        assert!(assignments.check_selective_recording().is_err());
    }

    #[test]
    fn test_display_platforms_only_lists_enabled() {
        let mut assignments = PlatformAssignments::default();
        assignments
            .assign(PlatformId::new("twitch"), DisplayType::Horizontal, &both(), false)
            .unwrap();
        assignments
            .assign(PlatformId::new("tiktok"), DisplayType::Vertical, &both(), false)
            .unwrap();
        assignments
            .assign(PlatformId::new("youtube"), DisplayType::Horizontal, &both(), false)
            .unwrap();

        let grouped = assignments.display_platforms(&[PlatformId::new("twitch"), PlatformId::new("tiktok")]);
        assert_eq!(grouped[&DisplayType::Horizontal], vec![PlatformId::new("twitch")]);
        assert_eq!(grouped[&DisplayType::Vertical], vec![PlatformId::new("tiktok")]);
    }
}
