// Closed loop tracking: from the spot seen in the area to the motors moves keeping it there.

pub mod direction;
pub mod error;
pub mod observer;
pub mod planner;
pub mod session;
pub mod states;
pub mod supervisor;

pub use direction::{best_motors_direction, Border, BorderSet, PlannerError};
pub use error::{StepOutcome, SupervisorError};
pub use observer::{Annotations, NoopObserver, Observer};
pub use planner::{borders_to_move_away, move_had_effect, PanelRotation, SunMove, TrackingConfig};
pub use session::TrackingSession;
pub use states::SupervisorState;
pub use supervisor::{Supervisor, SupervisorConfig};
