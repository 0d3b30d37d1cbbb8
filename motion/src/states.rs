// This module contains the states of the tracking supervisor.
// To add or modify states, edit this file only.

use std::fmt;

/// - WaitingAreaDefinition: no area yet, the frame is refreshed periodically
/// - WaitingSunMove: area known, waiting for the spot to drift enough to be corrected
/// - Tracking: moving the spot away from the borders one step at a time
/// - TrackingPaused: tracking stopped after a step until the operator continues
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum SupervisorState {
    WaitingAreaDefinition,
    WaitingSunMove,
    Tracking,
    TrackingPaused,
}

impl SupervisorState {
    /// Check if a tracking episode is in progress
    pub fn is_tracking(&self) -> bool {
        matches!(self, SupervisorState::Tracking | SupervisorState::TrackingPaused)
    }

    /// Area corners and resets are only taken outside of an episode
    pub fn accepts_area_events(&self) -> bool {
        !self.is_tracking()
    }

    pub fn name(&self) -> &'static str {
        match self {
            SupervisorState::WaitingAreaDefinition => "WAITING_AREA_DEFINITION",
            SupervisorState::WaitingSunMove => "WAITING_SUN_MOVE",
            SupervisorState::Tracking => "TRACKING",
            SupervisorState::TrackingPaused => "TRACKING_PAUSED",
        }
    }
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
