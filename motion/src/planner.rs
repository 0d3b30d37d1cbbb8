// Which borders the spot is about to cross, and whether the last move did anything.
//
// The sun drifts one way during an episode, so the drift measured before tracking tells
// which border of each axis the spot is heading to. Only that border is tested, against two
// limits: the spot edge getting too close to it, or the spot centre drifting too far off the
// area centre towards it.

use crate::direction::{Border, BorderSet};
use log::*;
use network::MotorsDirection;
use serde::{Deserialize, Serialize};
use spot::{DetectorConfig, Rectangle};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub lighted_pixel_min_offset: u8,
    pub min_lighted_pixels_count: usize,
    /// Drift below which the sun is considered still
    pub min_sun_move_px: f64,
    pub min_distance_from_border_px: u32,
    pub max_distance_from_center_axis_px: f64,
    /// Edge advance proving a move had an effect
    pub min_spot_overrun_px: u32,
    pub max_tracking_steps: u32,
    pub panels_count: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        let detector = DetectorConfig::default();
        Self {
            lighted_pixel_min_offset: detector.lighted_pixel_min_offset,
            min_lighted_pixels_count: detector.min_lighted_pixels_count,
            min_sun_move_px: 2.0,
            min_distance_from_border_px: 5,
            max_distance_from_center_axis_px: 5.0,
            min_spot_overrun_px: 3,
            max_tracking_steps: 20,
            panels_count: 1,
        }
    }
}

impl TrackingConfig {
    pub fn detector(&self) -> DetectorConfig {
        DetectorConfig {
            lighted_pixel_min_offset: self.lighted_pixel_min_offset,
            min_lighted_pixels_count: self.min_lighted_pixels_count,
        }
    }
}

/// Displacement of the spot centre while waiting for the sun, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SunMove {
    pub dx: f64,
    pub dy: f64,
}

impl SunMove {
    pub fn between(before: &Rectangle, after: &Rectangle) -> Self {
        let (x0, y0) = before.center();
        let (x1, y1) = after.center();
        Self {
            dx: x1 - x0,
            dy: y1 - y0,
        }
    }

    pub fn magnitude(&self) -> f64 {
        self.dx.hypot(self.dy)
    }
}

/// Borders of `area` the spot has to move away from, at most one per axis.
pub fn borders_to_move_away(
    spot: &Rectangle,
    area: &Rectangle,
    sun_move: &SunMove,
    config: &TrackingConfig,
) -> BorderSet {
    let (spot_x, spot_y) = spot.center();
    let (area_x, area_y) = area.center();
    let center_error_x = spot_x - area_x;
    let center_error_y = spot_y - area_y;
    let min_border = config.min_distance_from_border_px;
    let max_center = config.max_distance_from_center_axis_px;

    let distance_left = spot.left.abs_diff(area.left);
    let distance_top = spot.top.abs_diff(area.top);
    let distance_right = spot.right.abs_diff(area.right);
    let distance_bottom = spot.bottom.abs_diff(area.bottom);
    debug!(
        "Distances to borders left:{} top:{} right:{} bottom:{}, centre error ({:.1}, {:.1})",
        distance_left, distance_top, distance_right, distance_bottom, center_error_x, center_error_y
    );

    let mut borders = BorderSet::new();
    if sun_move.dx < 0.0 {
        if distance_left < min_border || center_error_x < -max_center {
            borders.insert(Border::Left);
        }
    } else if sun_move.dx > 0.0 && (distance_right < min_border || center_error_x > max_center) {
        borders.insert(Border::Right);
    }
    if sun_move.dy < 0.0 {
        if distance_top < min_border || center_error_y < -max_center {
            borders.insert(Border::Top);
        }
    } else if sun_move.dy > 0.0 && (distance_bottom < min_border || center_error_y > max_center) {
        borders.insert(Border::Bottom);
    }

    debug!("Borders to move away from: {}", borders);
    borders
}

/// True when the spot edge on the side of `direction` advanced by at least `min_overrun`
/// pixels between `before` and `after`.
pub fn move_had_effect(
    before: &Rectangle,
    after: &Rectangle,
    direction: MotorsDirection,
    min_overrun: u32,
) -> bool {
    let min_overrun = min_overrun as i64;
    let overrun_left = before.left as i64 - after.left as i64;
    let overrun_top = before.top as i64 - after.top as i64;
    let overrun_right = after.right as i64 - before.right as i64;
    let overrun_bottom = after.bottom as i64 - before.bottom as i64;

    (direction.moves_left() && overrun_left >= min_overrun)
        || (direction.moves_up() && overrun_top >= min_overrun)
        || (direction.moves_right() && overrun_right >= min_overrun)
        || (direction.moves_down() && overrun_bottom >= min_overrun)
}

/// Panel driven by the next move.
///
/// A move without visible effect means the driven panel's spot is hidden or stuck, so the
/// next panel takes over. With a single panel nothing ever changes and moves carry no panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelRotation {
    panels_count: usize,
    index: usize,
}

impl PanelRotation {
    pub fn new(panels_count: usize) -> Self {
        Self {
            panels_count: panels_count.max(1),
            index: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Panel to address in the move command, `None` on a single panel rig
    pub fn panel(&self) -> Option<usize> {
        (self.panels_count > 1).then_some(self.index)
    }

    pub fn after_move(&mut self, had_effect: bool) -> usize {
        if !had_effect && self.panels_count > 1 {
            self.index = (self.index + 1) % self.panels_count;
            info!("Last move had no effect, switching to panel {}", self.index);
        }
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::best_motors_direction;

    fn flagged(spot: Rectangle, area: Rectangle, dx: f64, dy: f64) -> BorderSet {
        borders_to_move_away(&spot, &area, &SunMove { dx, dy }, &TrackingConfig::default())
    }

    #[test]
    fn centered_spot_needs_nothing() {
        let area = Rectangle::new(10, 10, 109, 109);
        let spot = Rectangle::new(40, 40, 60, 60);
        assert!(flagged(spot, area, 5.0, 0.0).is_empty());
    }

    #[test]
    fn spot_near_left_border() {
        let area = Rectangle::new(10, 10, 109, 109);
        let spot = Rectangle::new(12, 40, 32, 60);

        let borders = flagged(spot, area, -3.0, 0.0);
        assert_eq!(borders, BorderSet::of(&[Border::Left]));
        assert_eq!(best_motors_direction(&borders), Ok(MotorsDirection::Right));
    }

    #[test]
    fn drift_off_centre_on_both_axes() {
        let area = Rectangle::new(0, 0, 119, 119);
        let spot = Rectangle::new(70, 10, 90, 30);

        let borders = flagged(spot, area, 1.0, -1.0);
        assert_eq!(borders, BorderSet::of(&[Border::Right, Border::Top]));
        assert_eq!(best_motors_direction(&borders), Ok(MotorsDirection::DownLeft));
    }

    #[test]
    fn only_the_border_ahead_of_the_sun_is_tested() {
        let area = Rectangle::new(10, 10, 109, 109);
        let spot = Rectangle::new(12, 40, 32, 60);

        // Sun moving right: the left border is behind, the right one is far
        assert!(flagged(spot, area, 4.0, 0.0).is_empty());
        // No drift on an axis: nothing to test on it
        assert!(flagged(spot, area, 0.0, 0.0).is_empty());
    }

    #[test]
    fn centered_spot_is_left_alone_whatever_the_drift() {
        let area = Rectangle::new(10, 10, 109, 109);
        let spot = Rectangle::new(50, 50, 70, 70);
        for dx in [-7.0, 0.0, 7.0] {
            for dy in [-3.0, 0.0, 3.0] {
                assert!(flagged(spot, area, dx, dy).is_empty(), "dx {dx} dy {dy}");
            }
        }
    }

    #[test]
    fn border_distance_and_centre_error_limits() {
        let area = Rectangle::new(10, 10, 109, 109);
        // tall spots keep the vertical centre error under the limit
        assert!(flagged(Rectangle::new(50, 15, 70, 104), area, 0.0, 1.0).is_empty());
        assert_eq!(
            flagged(Rectangle::new(50, 15, 70, 105), area, 0.0, 1.0),
            BorderSet::of(&[Border::Bottom])
        );
        // a centre error of exactly 5 px is accepted
        assert!(flagged(Rectangle::new(54, 50, 75, 70), area, 1.0, 0.0).is_empty());
        assert_eq!(
            flagged(Rectangle::new(55, 50, 75, 70), area, 1.0, 0.0),
            BorderSet::of(&[Border::Right])
        );
    }

    #[test]
    fn sun_move_between_spots() {
        let before = Rectangle::new(40, 40, 60, 60);
        let after = Rectangle::new(43, 36, 63, 56);
        let sun_move = SunMove::between(&before, &after);
        assert_eq!(sun_move, SunMove { dx: 3.0, dy: -4.0 });
        assert_eq!(sun_move.magnitude(), 5.0);
    }

    #[test]
    fn overrun_in_move_direction() {
        let before = Rectangle::new(20, 40, 40, 60);
        assert!(move_had_effect(&before, &Rectangle::new(23, 40, 43, 60), MotorsDirection::Right, 3));
        assert!(!move_had_effect(&before, &Rectangle::new(22, 40, 42, 60), MotorsDirection::Right, 3));
        // advance on the wrong side does not count
        assert!(!move_had_effect(&before, &Rectangle::new(23, 40, 43, 60), MotorsDirection::Left, 3));
        // one component of a diagonal is enough
        assert!(move_had_effect(&before, &Rectangle::new(20, 36, 40, 56), MotorsDirection::UpLeft, 3));
        assert!(!move_had_effect(&before, &before, MotorsDirection::Stop, 0));
    }

    #[test]
    fn single_panel_never_rotates() {
        let mut panels = PanelRotation::new(1);
        assert_eq!(panels.after_move(false), 0);
        assert_eq!(panels.panel(), None);
    }

    #[test]
    fn panels_rotate_on_ineffective_moves() {
        let mut panels = PanelRotation::new(3);
        assert_eq!(panels.panel(), Some(0));
        assert_eq!(panels.after_move(true), 0);
        assert_eq!(panels.after_move(false), 1);
        assert_eq!(panels.after_move(false), 2);
        assert_eq!(panels.after_move(false), 0);
        assert_eq!(panels.panel(), Some(0));
    }
}
