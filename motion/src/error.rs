use crate::direction::PlannerError;
use network::{GatewayError, MotorsStatus};
use spot::DetectionError;
use thiserror::Error;

/// Reasons for the supervisor to stop for good
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SupervisorError {
    #[error("cannot move the spot away from the borders after {steps} tracking steps")]
    NonConvergence { steps: u32 },
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Detection(#[from] DetectionError),
    #[error(transparent)]
    Planner(#[from] PlannerError),
    #[error("unexpected motors status {status} while {context}")]
    UnexpectedMotorsStatus {
        status: MotorsStatus,
        context: &'static str,
    },
    #[error("invalid state: {0}")]
    InvalidState(String),
}

/// Result of one supervisor tick
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Continue,
    /// Waiting for the operator after a tracking step
    Paused,
    /// Halted; every later tick returns the same reason
    Fatal(SupervisorError),
}
