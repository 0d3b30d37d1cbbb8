use clock::{file_time_suffix, Clock};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_cross_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use log::*;
use motion::{Annotations, Border, Observer, SupervisorError};
use spot::{Frame, Rectangle};
use std::fs;
use std::path::{Path, PathBuf};

const AREA_COLOR: Rgb<u8> = Rgb([0, 128, 255]);
const CORNER_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
const SPOT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const SPOT_BEFORE_MOVE_COLOR: Rgb<u8> = Rgb([255, 160, 0]);
const BORDER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const SUN_MOVE_COLOR: Rgb<u8> = Rgb([255, 0, 255]);

// The drift is a few pixels, scaled up to be visible
const SUN_MOVE_SCALE: f64 = 5.0;

/// Debug view written as PNG files: `current.png` after every analysis (with `before_move.png`
/// while tracking), `fatal.png` when the supervisor halts, and one `episode-<time>.png` per
/// completed episode when a snapshot folder is configured.
pub struct PngDebugView<C: Clock> {
    debug_dir: PathBuf,
    snapshot_dir: Option<PathBuf>,
    clock: C,
}

impl<C: Clock> PngDebugView<C> {
    pub fn new(debug_dir: &Path, snapshot_dir: Option<&Path>, clock: C) -> anyhow::Result<Self> {
        fs::create_dir_all(debug_dir)?;
        if let Some(snapshot_dir) = snapshot_dir {
            fs::create_dir_all(snapshot_dir)?;
        }
        Ok(Self {
            debug_dir: debug_dir.to_path_buf(),
            snapshot_dir: snapshot_dir.map(Path::to_path_buf),
            clock,
        })
    }

    fn write(&self, image: &RgbImage, path: &Path) {
        // The view is for the operator only, a failed write never stops the rig
        match image.save(path) {
            Ok(()) => debug!("Wrote {}", path.display()),
            Err(e) => warn!("Could not write {}: {}", path.display(), e),
        }
    }
}

impl<C: Clock> Observer for PngDebugView<C> {
    fn show(&mut self, frame: &Frame, annotations: &Annotations) {
        self.write(&render(frame, annotations), &self.debug_dir.join("current.png"));
        if let Some(before) = &annotations.frame_before_move {
            self.write(
                &render_before_move(before, annotations),
                &self.debug_dir.join("before_move.png"),
            );
        }
    }

    fn episode_complete(&mut self, frame: &Frame, annotations: &Annotations) {
        if let Some(snapshot_dir) = &self.snapshot_dir {
            let suffix = file_time_suffix(&self.clock.local_time());
            let path = snapshot_dir.join(format!("episode{}.png", suffix));
            info!("Episode snapshot {}", path.display());
            self.write(&render(frame, annotations), &path);
        }
    }

    fn freeze(&mut self, frame: Option<&Frame>, annotations: &Annotations, reason: &SupervisorError) {
        error!("Debug view frozen: {}", reason);
        match frame {
            Some(frame) => self.write(&render(frame, annotations), &self.debug_dir.join("fatal.png")),
            None => warn!("No frame to freeze"),
        }
    }
}

/// Frame in color with the annotations drawn over it
pub fn render(frame: &Frame, annotations: &Annotations) -> RgbImage {
    let mut image = DynamicImage::ImageLuma8(frame.clone()).to_rgb8();

    for &(x, y) in &annotations.corners {
        draw_cross_mut(&mut image, CORNER_COLOR, x as i32, y as i32);
    }
    if let Some(area) = &annotations.area {
        draw_hollow_rect_mut(&mut image, rect(area), AREA_COLOR);
        for border in annotations.borders.iter() {
            let (from, to) = border_segment(area, border);
            draw_line_segment_mut(&mut image, from, to, BORDER_COLOR);
        }
        if let Some(sun_move) = &annotations.sun_move {
            let (cx, cy) = area.center();
            let to = (cx + sun_move.dx * SUN_MOVE_SCALE, cy + sun_move.dy * SUN_MOVE_SCALE);
            draw_line_segment_mut(
                &mut image,
                (cx as f32, cy as f32),
                (to.0 as f32, to.1 as f32),
                SUN_MOVE_COLOR,
            );
        }
    }
    if let Some(spot) = &annotations.spot_before_move {
        draw_hollow_rect_mut(&mut image, rect(spot), SPOT_BEFORE_MOVE_COLOR);
    }
    if let Some(spot) = &annotations.spot {
        draw_hollow_rect_mut(&mut image, rect(spot), SPOT_COLOR);
    }
    image
}

/// Frame the last move was decided on, with the area and the spot it was moved from
pub fn render_before_move(frame: &Frame, annotations: &Annotations) -> RgbImage {
    let mut image = DynamicImage::ImageLuma8(frame.clone()).to_rgb8();
    if let Some(area) = &annotations.area {
        draw_hollow_rect_mut(&mut image, rect(area), AREA_COLOR);
    }
    if let Some(spot) = &annotations.spot_before_move {
        draw_hollow_rect_mut(&mut image, rect(spot), SPOT_BEFORE_MOVE_COLOR);
    }
    image
}

fn rect(rectangle: &Rectangle) -> Rect {
    Rect::at(rectangle.left as i32, rectangle.top as i32)
        .of_size(rectangle.width(), rectangle.height())
}

fn border_segment(area: &Rectangle, border: Border) -> ((f32, f32), (f32, f32)) {
    let (left, top) = (area.left as f32, area.top as f32);
    let (right, bottom) = (area.right as f32, area.bottom as f32);
    match border {
        Border::Left => ((left, top), (left, bottom)),
        Border::Top => ((left, top), (right, top)),
        Border::Right => ((right, top), (right, bottom)),
        Border::Bottom => ((left, bottom), (right, bottom)),
    }
}
