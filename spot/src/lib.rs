// Camera-side analysis of the capture surface: where the area of interest is and where the
// reflected spot sits inside it. Everything here is a pure function of pixel data.

pub mod detector;
pub mod filter;

use std::fmt;
use thiserror::Error;

pub use detector::{border_baseline, count_lit, locate_spot, DetectorConfig, Segment};
pub use filter::{blur3x3, crop_area, paste_area};

/// Monochrome camera frame
pub type Frame = image::GrayImage;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectionError {
    #[error("area {area} does not fit in a {width}x{height} frame")]
    AreaOutsideFrame {
        area: Rectangle,
        width: u32,
        height: u32,
    },
    #[error("area {area} does not match a {width}x{height} buffer")]
    AreaSizeMismatch {
        area: Rectangle,
        width: u32,
        height: u32,
    },
}

/// Rectangle in pixel coordinates, all bounds inclusive.
///
/// Used both for the area of interest and for the spot bounding box. The constructor
/// keeps `left <= right` and `top <= bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rectangle {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Rectangle {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: left.max(right),
            bottom: top.max(bottom),
        }
    }

    /// Rectangle spanned by two opposite corners given in any order
    pub fn from_corners(a: (u32, u32), b: (u32, u32)) -> Self {
        Self::new(a.0, a.1, b.0, b.1)
    }

    pub fn width(&self) -> u32 {
        self.right - self.left + 1
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top + 1
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.left as f64 + self.right as f64) / 2.0,
            (self.top as f64 + self.bottom as f64) / 2.0,
        )
    }

    pub fn fits_in(&self, width: u32, height: u32) -> bool {
        self.right < width && self.bottom < height
    }

    pub fn check_fits(&self, frame: &Frame) -> Result<(), DetectionError> {
        if self.fits_in(frame.width(), frame.height()) {
            Ok(())
        } else {
            Err(DetectionError::AreaOutsideFrame {
                area: *self,
                width: frame.width(),
                height: frame.height(),
            })
        }
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(left:{}, top:{}, right:{}, bottom:{})",
            self.left, self.top, self.right, self.bottom
        )
    }
}
