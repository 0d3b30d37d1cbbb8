use crate::direction::BorderSet;
use crate::error::SupervisorError;
use crate::planner::SunMove;
use crate::states::SupervisorState;
use spot::{Frame, Rectangle};

/// What the supervisor knew about the last analysed frame
#[derive(Debug, Clone, PartialEq)]
pub struct Annotations {
    pub state: SupervisorState,
    /// Corners given so far, at most two
    pub corners: Vec<(u32, u32)>,
    pub area: Option<Rectangle>,
    pub spot: Option<Rectangle>,
    pub spot_before_move: Option<Rectangle>,
    /// Frame the last move was decided on, while tracking
    pub frame_before_move: Option<Frame>,
    pub borders: BorderSet,
    pub sun_move: Option<SunMove>,
    pub step_count: Option<u32>,
}

impl Annotations {
    pub fn new(state: SupervisorState) -> Self {
        Self {
            state,
            corners: Vec::new(),
            area: None,
            spot: None,
            spot_before_move: None,
            frame_before_move: None,
            borders: BorderSet::new(),
            sun_move: None,
            step_count: None,
        }
    }
}

/// Receives the debug view of the supervisor. Observation only: nothing here can change
/// what the supervisor does.
pub trait Observer {
    /// Called after every analysed frame
    fn show(&mut self, frame: &Frame, annotations: &Annotations);

    /// Called when an episode ended with the spot away from the borders
    fn episode_complete(&mut self, frame: &Frame, annotations: &Annotations);

    /// Called once when the supervisor halts, with the last analysed frame if any
    fn freeze(&mut self, frame: Option<&Frame>, annotations: &Annotations, reason: &SupervisorError);
}

pub struct NoopObserver;

impl Observer for NoopObserver {
    fn show(&mut self, _frame: &Frame, _annotations: &Annotations) {}

    fn episode_complete(&mut self, _frame: &Frame, _annotations: &Annotations) {}

    fn freeze(&mut self, _frame: Option<&Frame>, _annotations: &Annotations, _reason: &SupervisorError) {}
}
