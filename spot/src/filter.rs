use crate::{DetectionError, Frame, Rectangle};
use image::imageops;
use imageproc::filter::box_filter;

/// 3x3 box blur.
///
/// The frame is mirrored by one pixel around its edges (the edge pixel itself is not repeated)
/// before filtering, so border pixels are averaged over nine samples like any other.
pub fn blur3x3(frame: &Frame) -> Frame {
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return frame.clone();
    }
    let padded = Frame::from_fn(width + 2, height + 2, |x, y| {
        *frame.get_pixel(mirror(x, width), mirror(y, height))
    });
    let blurred = box_filter(&padded, 1, 1);
    imageops::crop_imm(&blurred, 1, 1, width, height).to_image()
}

/// Coordinate in the padded frame back to the source frame of length `len`
fn mirror(padded: u32, len: u32) -> u32 {
    match padded {
        0 => 1.min(len - 1),
        p if p > len => len.saturating_sub(2),
        p => p - 1,
    }
}

/// Copy of `frame` restricted to `area`
pub fn crop_area(frame: &Frame, area: &Rectangle) -> Result<Frame, DetectionError> {
    area.check_fits(frame)?;
    Ok(imageops::crop_imm(frame, area.left, area.top, area.width(), area.height()).to_image())
}

/// Full frame built from the last full capture with `area_image` pasted over `area`.
///
/// `last_full` is left untouched.
pub fn paste_area(
    last_full: &Frame,
    area: &Rectangle,
    area_image: &Frame,
) -> Result<Frame, DetectionError> {
    area.check_fits(last_full)?;
    if area_image.dimensions() != (area.width(), area.height()) {
        return Err(DetectionError::AreaSizeMismatch {
            area: *area,
            width: area_image.width(),
            height: area_image.height(),
        });
    }

    let mut merged = last_full.clone();
    imageops::replace(&mut merged, area_image, area.left as i64, area.top as i64);
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn blur_keeps_uniform_frames() {
        let frame = Frame::from_pixel(8, 6, Luma([77]));
        assert_eq!(blur3x3(&frame), frame);
    }

    #[test]
    fn blur_averages_nine_neighbours() {
        let mut frame = Frame::new(5, 5);
        frame.put_pixel(2, 2, Luma([90]));
        frame.put_pixel(0, 0, Luma([45]));

        let blurred = blur3x3(&frame);
        assert_eq!(blurred.get_pixel(2, 2).0[0], 10);
        // (45 + 90) / 9
        assert_eq!(blurred.get_pixel(1, 1).0[0], 15);
        assert_eq!(blurred.get_pixel(4, 4).0[0], 0);
        // mirrored corner: 45 is counted once, 45 / 9
        assert_eq!(blurred.get_pixel(0, 0).0[0], 5);
    }

    #[test]
    fn blur_mirrors_the_frame_edges() {
        let mut frame = Frame::new(3, 3);
        frame.put_pixel(0, 0, Luma([90]));

        let blurred = blur3x3(&frame);
        assert_eq!(blurred.get_pixel(0, 0).0[0], 10);
        assert_eq!(blurred.get_pixel(1, 1).0[0], 10);
        assert_eq!(blurred.get_pixel(2, 2).0[0], 0);
    }

    #[test]
    fn mirrored_coordinates() {
        assert_eq!((0..7).map(|p| mirror(p, 5)).collect::<Vec<_>>(), [1, 0, 1, 2, 3, 4, 3]);
        assert_eq!((0..4).map(|p| mirror(p, 2)).collect::<Vec<_>>(), [1, 0, 1, 0]);
        assert_eq!((0..3).map(|p| mirror(p, 1)).collect::<Vec<_>>(), [0, 0, 0]);
    }

    #[test]
    fn blur_on_single_pixel_frame() {
        let frame = Frame::from_pixel(1, 1, Luma([200]));
        assert_eq!(blur3x3(&frame).get_pixel(0, 0).0[0], 200);
    }

    #[test]
    fn paste_replaces_only_the_area() {
        let last_full = Frame::from_pixel(10, 8, Luma([5]));
        let area = Rectangle::new(2, 3, 5, 4);
        let patch = Frame::from_pixel(4, 2, Luma([250]));

        let merged = paste_area(&last_full, &area, &patch).unwrap();
        assert_eq!(merged.get_pixel(2, 3).0[0], 250);
        assert_eq!(merged.get_pixel(5, 4).0[0], 250);
        assert_eq!(merged.get_pixel(1, 3).0[0], 5);
        assert_eq!(merged.get_pixel(6, 4).0[0], 5);
        assert_eq!(merged.get_pixel(2, 5).0[0], 5);
        assert_eq!(last_full.get_pixel(2, 3).0[0], 5);
    }

    #[test]
    fn paste_checks_sizes() {
        let last_full = Frame::new(10, 8);
        let area = Rectangle::new(2, 3, 5, 4);

        assert!(matches!(
            paste_area(&last_full, &area, &Frame::new(3, 2)),
            Err(DetectionError::AreaSizeMismatch { width: 3, height: 2, .. })
        ));
        assert!(matches!(
            paste_area(&last_full, &Rectangle::new(0, 0, 10, 2), &Frame::new(11, 3)),
            Err(DetectionError::AreaOutsideFrame { .. })
        ));
    }

    #[test]
    fn crop_then_paste_restores_the_frame() {
        let frame = Frame::from_fn(12, 9, |x, y| Luma([(x * 10 + y) as u8]));
        let area = Rectangle::new(3, 2, 8, 6);

        let cropped = crop_area(&frame, &area).unwrap();
        assert_eq!(cropped.dimensions(), (6, 5));
        assert_eq!(cropped.get_pixel(0, 0).0[0], 32);
        let restored = paste_area(&Frame::new(12, 9), &area, &cropped).unwrap();
        assert_eq!(restored.get_pixel(8, 6), frame.get_pixel(8, 6));
        assert_eq!(restored.get_pixel(2, 2).0[0], 0);
    }
}
