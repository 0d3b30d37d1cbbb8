// Spot localisation inside the area of interest.
//
// The lit threshold is relative to the darkest pixel found on the area borders, recomputed
// for every frame, so exposure and ambient light changes do not need a fixed global level.
// Each edge of the spot is found by its own scan; for irregular blobs the four edges may not
// describe the same shape and that is accepted.

use crate::{DetectionError, Frame, Rectangle};
use serde::{Deserialize, Serialize};

const LIGHTED_PIXEL_MIN_OFFSET: u8 = 70;
const MIN_LIGHTED_PIXELS_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Level above the border baseline from which a pixel counts as lit
    pub lighted_pixel_min_offset: u8,
    /// Lit pixels needed on a segment to call the segment lit
    pub min_lighted_pixels_count: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            lighted_pixel_min_offset: LIGHTED_PIXEL_MIN_OFFSET,
            min_lighted_pixels_count: MIN_LIGHTED_PIXELS_COUNT,
        }
    }
}

/// One pixel wide horizontal or vertical segment, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Segment {
    /// Column `x` of the area, from its top to its bottom
    pub fn vertical(x: u32, area: &Rectangle) -> Self {
        Self {
            x0: x,
            y0: area.top,
            x1: x,
            y1: area.bottom,
        }
    }

    /// Row `y` of the area, from its left to its right
    pub fn horizontal(y: u32, area: &Rectangle) -> Self {
        Self {
            x0: area.left,
            y0: y,
            x1: area.right,
            y1: y,
        }
    }

    /// Left, top, right and bottom borders of the area
    pub fn area_borders(area: &Rectangle) -> [Segment; 4] {
        [
            Segment::vertical(area.left, area),
            Segment::horizontal(area.top, area),
            Segment::vertical(area.right, area),
            Segment::horizontal(area.bottom, area),
        ]
    }

    /// Pixel values along the segment; pixels outside the frame are skipped.
    pub fn pixels<'a>(&self, frame: &'a Frame) -> impl Iterator<Item = u8> + 'a {
        let (x0, y0, x1, y1) = (self.x0, self.y0, self.x1, self.y1);
        (y0..=y1).flat_map(move |y| {
            (x0..=x1).filter_map(move |x| frame.get_pixel_checked(x, y).map(|p| p.0[0]))
        })
    }
}

/// Darkest pixel level found on the four borders of the area.
pub fn border_baseline(frame: &Frame, area: &Rectangle) -> Result<u8, DetectionError> {
    area.check_fits(frame)?;
    Ok(Segment::area_borders(area)
        .iter()
        .flat_map(|segment| segment.pixels(frame))
        .min()
        .unwrap_or(u8::MAX))
}

/// Number of pixels of the segment at or above `baseline + lighted_pixel_min_offset`.
///
/// When that level is above 255 nothing is lit, which keeps a saturated frame from
/// producing a spot everywhere.
pub fn count_lit(frame: &Frame, segment: &Segment, baseline: u8, config: &DetectorConfig) -> usize {
    let min_level = baseline as u16 + config.lighted_pixel_min_offset as u16;
    if min_level > u8::MAX as u16 {
        return 0;
    }
    segment
        .pixels(frame)
        .filter(|&level| level as u16 >= min_level)
        .count()
}

/// Bounding box of the lit pixels inside `area`, or `None` when no spot is visible.
pub fn locate_spot(
    frame: &Frame,
    area: &Rectangle,
    config: &DetectorConfig,
) -> Result<Option<Rectangle>, DetectionError> {
    let baseline = border_baseline(frame, area)?;
    let is_lit = |segment: Segment| {
        count_lit(frame, &segment, baseline, config) >= config.min_lighted_pixels_count
    };

    let Some(left) = (area.left..=area.right).find(|&x| is_lit(Segment::vertical(x, area))) else {
        return Ok(None);
    };
    let Some(right) = (area.left..=area.right)
        .rev()
        .find(|&x| is_lit(Segment::vertical(x, area)))
    else {
        return Ok(None);
    };
    let Some(top) = (area.top..=area.bottom).find(|&y| is_lit(Segment::horizontal(y, area))) else {
        return Ok(None);
    };
    let Some(bottom) = (area.top..=area.bottom)
        .rev()
        .find(|&y| is_lit(Segment::horizontal(y, area)))
    else {
        return Ok(None);
    };

    Ok(Some(Rectangle::new(left, top, right, bottom)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn frame_with_spot(width: u32, height: u32, background: u8, spot: Rectangle, level: u8) -> Frame {
        Frame::from_fn(width, height, |x, y| {
            if x >= spot.left && x <= spot.right && y >= spot.top && y <= spot.bottom {
                Luma([level])
            } else {
                Luma([background])
            }
        })
    }

    #[test]
    fn finds_centered_spot() {
        let area = Rectangle::new(10, 10, 109, 109);
        let spot = Rectangle::new(40, 40, 60, 60);
        let frame = frame_with_spot(120, 120, 20, spot, 220);

        let found = locate_spot(&frame, &area, &DetectorConfig::default()).unwrap();
        assert_eq!(found, Some(spot));
    }

    #[test]
    fn detection_is_deterministic() {
        let area = Rectangle::new(5, 5, 90, 70);
        let frame = Frame::from_fn(100, 80, |x, y| Luma([((x * 7 + y * 13) % 251) as u8]));

        let first = locate_spot(&frame, &area, &DetectorConfig::default());
        let second = locate_spot(&frame, &area, &DetectorConfig::default());
        assert_eq!(first, second);
    }

    #[test]
    fn uniform_frame_has_no_spot() {
        let area = Rectangle::new(10, 10, 109, 109);
        let frame = Frame::from_pixel(120, 120, Luma([90]));
        assert_eq!(locate_spot(&frame, &area, &DetectorConfig::default()), Ok(None));
    }

    #[test]
    fn saturated_frame_has_no_spot() {
        let area = Rectangle::new(0, 0, 49, 49);
        let frame = Frame::from_pixel(50, 50, Luma([255]));
        assert_eq!(locate_spot(&frame, &area, &DetectorConfig::default()), Ok(None));
    }

    #[test]
    fn spot_narrower_than_lit_count_is_ignored() {
        let area = Rectangle::new(10, 10, 109, 109);
        let frame = frame_with_spot(120, 120, 20, Rectangle::new(50, 50, 55, 55), 250);
        assert_eq!(locate_spot(&frame, &area, &DetectorConfig::default()), Ok(None));
    }

    #[test]
    fn threshold_follows_border_brightness() {
        let area = Rectangle::new(10, 10, 109, 109);
        let spot = Rectangle::new(30, 30, 70, 70);

        // 120 + 70 = 190: a 200 spot is lit, a 180 spot is not
        let bright = frame_with_spot(120, 120, 120, spot, 200);
        let dim = frame_with_spot(120, 120, 120, spot, 180);
        let config = DetectorConfig::default();

        assert_eq!(border_baseline(&bright, &area), Ok(120));
        assert_eq!(locate_spot(&bright, &area, &config), Ok(Some(spot)));
        assert_eq!(locate_spot(&dim, &area, &config), Ok(None));
    }

    #[test]
    fn spot_touching_the_left_border() {
        let area = Rectangle::new(10, 10, 109, 109);
        let spot = Rectangle::new(10, 40, 30, 60);
        let frame = frame_with_spot(120, 120, 20, spot, 220);

        let found = locate_spot(&frame, &area, &DetectorConfig::default()).unwrap();
        assert_eq!(found, Some(spot));
    }

    #[test]
    fn edges_are_scanned_independently() {
        // An L shaped blob: the box covers both arms
        let area = Rectangle::new(0, 0, 99, 99);
        let mut frame = frame_with_spot(100, 100, 10, Rectangle::new(20, 20, 35, 70), 200);
        for y in 55..=70 {
            for x in 20..=80 {
                frame.put_pixel(x, y, Luma([200]));
            }
        }

        let found = locate_spot(&frame, &area, &DetectorConfig::default()).unwrap();
        assert_eq!(found, Some(Rectangle::new(20, 20, 80, 70)));
    }

    #[test]
    fn count_lit_on_a_segment() {
        let area = Rectangle::new(0, 0, 19, 19);
        let frame = frame_with_spot(20, 20, 0, Rectangle::new(5, 0, 5, 11), 100);
        let config = DetectorConfig::default();

        assert_eq!(count_lit(&frame, &Segment::vertical(5, &area), 0, &config), 12);
        assert_eq!(count_lit(&frame, &Segment::vertical(6, &area), 0, &config), 0);
        assert_eq!(count_lit(&frame, &Segment::vertical(5, &area), 40, &config), 0);
    }

    #[test]
    fn area_outside_frame_is_an_error() {
        let frame = Frame::new(50, 50);
        let area = Rectangle::new(10, 10, 60, 40);
        assert!(matches!(
            locate_spot(&frame, &area, &DetectorConfig::default()),
            Err(DetectionError::AreaOutsideFrame { .. })
        ));
    }
}
