// File backed gateways: replaying a folder of captures instead of the rig, and recording the
// captures of a live session so it can be replayed later.

use crate::gateway::Gateway;
use crate::motors::{MotorsDirection, MotorsStatus};
use crate::GatewayError;
use clock::{file_time_suffix, Clock};
use log::*;
use spot::{crop_area, Frame, Rectangle};
use std::fs;
use std::path::{Path, PathBuf};

fn storage_error(path: &Path, e: impl ToString) -> GatewayError {
    GatewayError::Storage {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

/// Serves the PNG files of a folder in file name order, starting over after the last one.
///
/// Motors always report LOCKED and commands are only logged.
pub struct ReplayGateway {
    files: Vec<PathBuf>,
    next: usize,
    current: Option<Frame>,
}

impl ReplayGateway {
    pub fn new(folder: &Path) -> Result<Self, GatewayError> {
        let mut files: Vec<PathBuf> = fs::read_dir(folder)
            .map_err(|e| storage_error(folder, e))?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
            })
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(storage_error(folder, "no png file to replay"));
        }
        info!("Replaying {} captures from {}", files.len(), folder.display());

        Ok(Self {
            files,
            next: 0,
            current: None,
        })
    }

    fn load(&self, index: usize) -> Result<Frame, GatewayError> {
        let path = &self.files[index];
        let image = image::open(path).map_err(|e| storage_error(path, e))?;
        debug!("Replay capture {}", path.display());
        Ok(image.to_luma8())
    }
}

impl Gateway for ReplayGateway {
    fn capture(&mut self) -> Result<Frame, GatewayError> {
        let frame = self.load(self.next)?;
        self.next = (self.next + 1) % self.files.len();
        self.current = Some(frame.clone());
        Ok(frame)
    }

    fn capture_area(&mut self, area: &Rectangle) -> Result<Frame, GatewayError> {
        let frame = match &self.current {
            Some(frame) => frame.clone(),
            None => self.capture()?,
        };
        crop_area(&frame, area).map_err(|e| GatewayError::InvalidPayload {
            path: "replay capture_area".to_string(),
            reason: e.to_string(),
        })
    }

    fn move_one_step(
        &mut self,
        direction: MotorsDirection,
        panel: Option<usize>,
    ) -> Result<(), GatewayError> {
        match panel {
            Some(panel) => info!("Replay: motors command {} on panel {}", direction, panel),
            None => info!("Replay: motors command {}", direction),
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), GatewayError> {
        info!("Replay: motors command stop");
        Ok(())
    }

    fn motors_status(&mut self) -> Result<MotorsStatus, GatewayError> {
        Ok(MotorsStatus::Locked)
    }
}

/// Live gateway whose full captures are also written as `camera_capture-<time>.png`.
pub struct RecordingGateway<G: Gateway, C: Clock> {
    inner: G,
    folder: PathBuf,
    clock: C,
}

impl<G: Gateway, C: Clock> RecordingGateway<G, C> {
    pub fn new(inner: G, folder: &Path, clock: C) -> Result<Self, GatewayError> {
        fs::create_dir_all(folder).map_err(|e| storage_error(folder, e))?;
        Ok(Self {
            inner,
            folder: folder.to_path_buf(),
            clock,
        })
    }

    fn record(&self, frame: &Frame) {
        let suffix = file_time_suffix(&self.clock.local_time());
        let path = self.folder.join(format!("camera_capture{}.png", suffix));
        // A lost recording must not stop the rig
        match frame.save(&path) {
            Ok(()) => debug!("Recorded {}", path.display()),
            Err(e) => warn!("Could not record {}: {}", path.display(), e),
        }
    }
}

impl<G: Gateway, C: Clock> Gateway for RecordingGateway<G, C> {
    fn capture(&mut self) -> Result<Frame, GatewayError> {
        let frame = self.inner.capture()?;
        self.record(&frame);
        Ok(frame)
    }

    fn capture_area(&mut self, area: &Rectangle) -> Result<Frame, GatewayError> {
        self.inner.capture_area(area)
    }

    fn move_one_step(
        &mut self,
        direction: MotorsDirection,
        panel: Option<usize>,
    ) -> Result<(), GatewayError> {
        self.inner.move_one_step(direction, panel)
    }

    fn stop(&mut self) -> Result<(), GatewayError> {
        self.inner.stop()
    }

    fn motors_status(&mut self) -> Result<MotorsStatus, GatewayError> {
        self.inner.motors_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clock::ManualClock;
    use image::Luma;
    use std::time::Duration;

    fn write_frame(folder: &Path, name: &str, level: u8) {
        Frame::from_pixel(8, 6, Luma([level]))
            .save(folder.join(name))
            .unwrap();
    }

    #[test]
    fn replays_in_name_order_and_cycles() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "b.png", 20);
        write_frame(dir.path(), "a.png", 10);
        fs::write(dir.path().join("notes.txt"), "not a capture").unwrap();

        let mut replay = ReplayGateway::new(dir.path()).unwrap();
        let levels: Vec<u8> = (0..3)
            .map(|_| replay.capture().unwrap().get_pixel(0, 0).0[0])
            .collect();
        assert_eq!(levels, vec![10, 20, 10]);
    }

    #[test]
    fn replay_motors_are_always_locked() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "a.png", 10);

        let mut replay = ReplayGateway::new(dir.path()).unwrap();
        replay.move_one_step(MotorsDirection::Up, None).unwrap();
        replay.stop().unwrap();
        assert_eq!(replay.motors_status(), Ok(MotorsStatus::Locked));
    }

    #[test]
    fn replay_capture_area_crops_current_frame() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "a.png", 10);
        write_frame(dir.path(), "b.png", 20);

        let mut replay = ReplayGateway::new(dir.path()).unwrap();
        replay.capture().unwrap();
        let area = replay.capture_area(&Rectangle::new(1, 1, 4, 2)).unwrap();
        assert_eq!(area.dimensions(), (4, 2));
        assert_eq!(area.get_pixel(0, 0).0[0], 10);

        assert!(matches!(
            replay.capture_area(&Rectangle::new(0, 0, 8, 2)),
            Err(GatewayError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn empty_replay_folder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ReplayGateway::new(dir.path()),
            Err(GatewayError::Storage { .. })
        ));
    }

    #[test]
    fn recording_writes_timestamped_captures() {
        let source = tempfile::tempdir().unwrap();
        write_frame(source.path(), "a.png", 42);
        let target = tempfile::tempdir().unwrap();
        let records = target.path().join("records");
        let clock = ManualClock::new();

        let replay = ReplayGateway::new(source.path()).unwrap();
        let mut recording = RecordingGateway::new(replay, &records, clock.clone()).unwrap();
        recording.capture().unwrap();
        clock.advance(Duration::from_secs(61));
        recording.capture().unwrap();

        let mut names: Vec<String> = fs::read_dir(&records)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "camera_capture-19700101-000000.png",
                "camera_capture-19700101-000101.png",
            ]
        );
        let saved = image::open(records.join(&names[0])).unwrap().to_luma8();
        assert_eq!(saved.get_pixel(3, 3).0[0], 42);
        assert_eq!(recording.motors_status(), Ok(MotorsStatus::Locked));
    }
}
