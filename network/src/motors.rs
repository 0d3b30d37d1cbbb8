use crate::GatewayError;
use std::fmt;
use std::str::FromStr;

/// One discrete move of the motors, or stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorsDirection {
    Up,
    UpRight,
    Right,
    DownRight,
    Down,
    DownLeft,
    Left,
    UpLeft,
    Stop,
}

impl MotorsDirection {
    pub const MOVES: [MotorsDirection; 8] = [
        MotorsDirection::Up,
        MotorsDirection::UpRight,
        MotorsDirection::Right,
        MotorsDirection::DownRight,
        MotorsDirection::Down,
        MotorsDirection::DownLeft,
        MotorsDirection::Left,
        MotorsDirection::UpLeft,
    ];

    /// Value of the `cmd` parameter of `/motors_command`
    pub fn as_command(&self) -> &'static str {
        match self {
            MotorsDirection::Up => "up",
            MotorsDirection::UpRight => "up-right",
            MotorsDirection::Right => "right",
            MotorsDirection::DownRight => "down-right",
            MotorsDirection::Down => "down",
            MotorsDirection::DownLeft => "down-left",
            MotorsDirection::Left => "left",
            MotorsDirection::UpLeft => "up-left",
            MotorsDirection::Stop => "stop",
        }
    }

    pub fn moves_up(&self) -> bool {
        matches!(self, MotorsDirection::Up | MotorsDirection::UpRight | MotorsDirection::UpLeft)
    }

    pub fn moves_down(&self) -> bool {
        matches!(
            self,
            MotorsDirection::Down | MotorsDirection::DownRight | MotorsDirection::DownLeft
        )
    }

    pub fn moves_left(&self) -> bool {
        matches!(
            self,
            MotorsDirection::Left | MotorsDirection::UpLeft | MotorsDirection::DownLeft
        )
    }

    pub fn moves_right(&self) -> bool {
        matches!(
            self,
            MotorsDirection::Right | MotorsDirection::UpRight | MotorsDirection::DownRight
        )
    }
}

impl fmt::Display for MotorsDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_command())
    }
}

impl FromStr for MotorsDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "up" => Ok(MotorsDirection::Up),
            "up-right" => Ok(MotorsDirection::UpRight),
            "right" => Ok(MotorsDirection::Right),
            "down-right" => Ok(MotorsDirection::DownRight),
            "down" => Ok(MotorsDirection::Down),
            "down-left" => Ok(MotorsDirection::DownLeft),
            "left" => Ok(MotorsDirection::Left),
            "up-left" => Ok(MotorsDirection::UpLeft),
            "stop" => Ok(MotorsDirection::Stop),
            other => Err(format!("unknown motors direction {other:?}")),
        }
    }
}

/// State reported by `/motors_status`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorsStatus {
    Error,
    Uninitialized,
    Idle,
    Moving,
    MovingOneStep,
    Tightening,
    /// Idle and safe to command
    Locked,
}

impl MotorsStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotorsStatus::Error => "ERROR",
            MotorsStatus::Uninitialized => "UNINITIALIZED",
            MotorsStatus::Idle => "IDLE",
            MotorsStatus::Moving => "MOVING",
            MotorsStatus::MovingOneStep => "MOVING_ONE_STEP",
            MotorsStatus::Tightening => "TIGHTENING",
            MotorsStatus::Locked => "LOCKED",
        }
    }
}

impl fmt::Display for MotorsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MotorsStatus {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ERROR" => Ok(MotorsStatus::Error),
            "UNINITIALIZED" => Ok(MotorsStatus::Uninitialized),
            "IDLE" => Ok(MotorsStatus::Idle),
            "MOVING" => Ok(MotorsStatus::Moving),
            "MOVING_ONE_STEP" => Ok(MotorsStatus::MovingOneStep),
            "TIGHTENING" => Ok(MotorsStatus::Tightening),
            "LOCKED" => Ok(MotorsStatus::Locked),
            other => Err(GatewayError::UnknownMotorsStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_names() {
        assert_eq!(MotorsDirection::UpRight.as_command(), "up-right");
        assert_eq!(MotorsDirection::DownLeft.to_string(), "down-left");
        assert_eq!(MotorsDirection::Stop.as_command(), "stop");
        for direction in MotorsDirection::MOVES {
            assert_eq!(direction.as_command().parse::<MotorsDirection>(), Ok(direction));
        }
        assert_eq!("UP_LEFT".parse::<MotorsDirection>(), Ok(MotorsDirection::UpLeft));
        assert!("north".parse::<MotorsDirection>().is_err());
    }

    #[test]
    fn direction_components() {
        assert!(MotorsDirection::DownRight.moves_down());
        assert!(MotorsDirection::DownRight.moves_right());
        assert!(!MotorsDirection::DownRight.moves_left());
        assert!(!MotorsDirection::Right.moves_up());
        assert!(!MotorsDirection::Stop.moves_up() && !MotorsDirection::Stop.moves_left());
    }

    #[test]
    fn status_parsing() {
        assert_eq!("LOCKED".parse::<MotorsStatus>(), Ok(MotorsStatus::Locked));
        assert_eq!(
            "MOVING_ONE_STEP".parse::<MotorsStatus>(),
            Ok(MotorsStatus::MovingOneStep)
        );
        assert_eq!(
            "BROKEN".parse::<MotorsStatus>(),
            Err(GatewayError::UnknownMotorsStatus("BROKEN".to_string()))
        );
    }
}
