use crate::planner::{PanelRotation, SunMove};
use network::MotorsDirection;
use spot::{Frame, Rectangle};

/// State of one tracking episode, rebuilt when the episode starts.
#[derive(Debug, Clone)]
pub struct TrackingSession {
    /// Number of moves issued in this episode
    pub step_count: u32,
    pub current_direction: MotorsDirection,
    pub spot_before_move: Rectangle,
    pub frame_before_move: Frame,
    pub panels: PanelRotation,
    /// Drift measured before the episode, frozen until it ends
    pub sun_move: SunMove,
}

impl TrackingSession {
    pub fn start(
        direction: MotorsDirection,
        spot: Rectangle,
        frame: Frame,
        sun_move: SunMove,
        panels_count: usize,
    ) -> Self {
        Self {
            step_count: 1,
            current_direction: direction,
            spot_before_move: spot,
            frame_before_move: frame,
            panels: PanelRotation::new(panels_count),
            sun_move,
        }
    }

    /// Records the move about to be issued from `spot`
    pub fn next_move(&mut self, direction: MotorsDirection, spot: Rectangle, frame: Frame) {
        self.step_count += 1;
        self.current_direction = direction;
        self.spot_before_move = spot;
        self.frame_before_move = frame;
    }
}
