// Borders of the area and the fixed table turning the borders the spot must leave into one
// motors move.

use network::MotorsDirection;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Border {
    Left,
    Top,
    Right,
    Bottom,
}

impl Border {
    pub const ALL: [Border; 4] = [Border::Left, Border::Top, Border::Right, Border::Bottom];

    fn bit(self) -> u8 {
        match self {
            Border::Left => 0b0001,
            Border::Top => 0b0010,
            Border::Right => 0b0100,
            Border::Bottom => 0b1000,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Border::Left => "LEFT",
            Border::Top => "TOP",
            Border::Right => "RIGHT",
            Border::Bottom => "BOTTOM",
        }
    }
}

impl fmt::Display for Border {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Borders the spot has to move away from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BorderSet(u8);

impl BorderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(borders: &[Border]) -> Self {
        let mut set = Self::new();
        for border in borders {
            set.insert(*border);
        }
        set
    }

    pub fn insert(&mut self, border: Border) {
        self.0 |= border.bit();
    }

    pub fn contains(&self, border: Border) -> bool {
        self.0 & border.bit() != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Border> + '_ {
        Border::ALL.into_iter().filter(|border| self.contains(*border))
    }
}

impl fmt::Display for BorderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|border| border.name()).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlannerError {
    #[error("no motors direction moves the spot away from borders {0}")]
    UnmappedBorders(BorderSet),
}

/// Move taking the spot away from the flagged borders.
///
/// One border gives the opposite cardinal move, two adjacent borders the opposite diagonal.
/// Every other set (empty, opposite borders, three or four borders) has no answer.
pub fn best_motors_direction(borders: &BorderSet) -> Result<MotorsDirection, PlannerError> {
    let flags = (
        borders.contains(Border::Left),
        borders.contains(Border::Top),
        borders.contains(Border::Right),
        borders.contains(Border::Bottom),
    );
    match flags {
        // (left, top, right, bottom)
        (true, false, false, false) => Ok(MotorsDirection::Right),
        (false, true, false, false) => Ok(MotorsDirection::Down),
        (false, false, true, false) => Ok(MotorsDirection::Left),
        (false, false, false, true) => Ok(MotorsDirection::Up),
        (true, true, false, false) => Ok(MotorsDirection::DownRight),
        (true, false, false, true) => Ok(MotorsDirection::UpRight),
        (false, true, true, false) => Ok(MotorsDirection::DownLeft),
        (false, false, true, true) => Ok(MotorsDirection::UpLeft),
        _ => Err(PlannerError::UnmappedBorders(*borders)),
    }
}
