//! Capture session controller.
//!
//! Orchestrates the session lifecycle: resolve and create the scene layout,
//! query the source once for intrinsics and depth scale, then run a
//! single-threaded cooperative loop that blocks on frame acquisition and
//! polls one command per iteration.
//!
//! Finalization runs on every exit path (cancel, fault): the source is
//! released first, then the accumulated metadata is flushed, so the
//! metadata write is the last observable effect of the session.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::command::{Command, CommandSource};
use crate::frame::FramePair;
use crate::metadata::{depth_scale_mm, CameraRecord, SceneCameraMeta};
use crate::scene::SceneLayout;
use crate::source::FrameSource;

/// Outcome of a completed session.
#[derive(Debug)]
pub struct SessionSummary {
    pub frames_captured: u32,
    pub scene_dir: PathBuf,
}

/// One capture session. Owns the frame source exclusively for its duration;
/// all mutable state (frame counter, metadata mapping) lives here.
pub struct CaptureSession {
    layout: SceneLayout,
    source: Box<dyn FrameSource>,
    record: CameraRecord,
    next_id: u32,
    meta: SceneCameraMeta,
}

impl CaptureSession {
    /// Start a session: create the scene directories and query the source
    /// once for intrinsics and depth scale. The sensor reports meters per
    /// raw unit; the dataset convention is millimeters, converted here and
    /// never per frame.
    pub fn start(layout: SceneLayout, source: Box<dyn FrameSource>) -> Result<Self> {
        layout.ensure_dirs()?;

        let cam_k = source.intrinsics().cam_k();
        let scale_m = source.depth_scale();
        let record = CameraRecord {
            cam_k,
            depth_scale: depth_scale_mm(scale_m),
        };

        log::info!("saving data to {}", layout.scene_dir().display());
        log::info!("camera intrinsics (K): {:?}", cam_k);
        log::info!(
            "depth scale: {} m/unit from sensor, {} mm/unit in scene_camera.json",
            scale_m,
            record.depth_scale
        );

        Ok(Self {
            layout,
            source,
            record,
            next_id: 0,
            meta: SceneCameraMeta::new(),
        })
    }

    /// Run the capture loop until cancellation, then finalize.
    ///
    /// Finalization (source release + conditional metadata flush) runs even
    /// when the loop body faults; the loop fault takes precedence in the
    /// returned result.
    pub fn run(mut self, commands: &mut dyn CommandSource) -> Result<SessionSummary> {
        let loop_result = self.capture_loop(commands);
        let finish_result = self.finish();
        loop_result?;
        finish_result
    }

    fn capture_loop(&mut self, commands: &mut dyn CommandSource) -> Result<()> {
        loop {
            // Sole suspension point: block until the next aligned pair.
            let Some(frame) = self.source.next_frame()? else {
                log::debug!("frames missing, skipping");
                continue;
            };

            match commands.poll() {
                Command::Capture => {
                    let frame_id = self.next_id;
                    match self.capture(frame_id, &frame) {
                        Ok(()) => {
                            // The counter advances only on successful capture.
                            self.next_id += 1;
                            log::info!(
                                "saved frame {}: {} and {}",
                                frame_id,
                                self.layout.rgb_path(frame_id).display(),
                                self.layout.depth_path(frame_id).display()
                            );
                        }
                        Err(e) => {
                            // Partial capture is worth more than a dead
                            // session; the id is reused by the next capture.
                            log::error!("capture of frame {} failed: {:#}", frame_id, e);
                        }
                    }
                }
                Command::Cancel => {
                    log::info!("cancel received, exiting capture loop");
                    return Ok(());
                }
                Command::Idle => {}
            }
        }
    }

    /// Persist one frame pair and record its metadata entry.
    ///
    /// Depth pixels are written raw; no rescaling, the mm conversion lives
    /// in the metadata only. If the depth write fails after the color write
    /// succeeded, the color file is removed so rgb/, depth/ and the
    /// metadata stay consistent.
    fn capture(&mut self, frame_id: u32, frame: &FramePair) -> Result<()> {
        let rgb_path = self.layout.rgb_path(frame_id);
        let depth_path = self.layout.depth_path(frame_id);

        frame
            .to_color_image()
            .save(&rgb_path)
            .with_context(|| format!("write {}", rgb_path.display()))?;

        if let Err(e) = frame
            .to_depth_image()
            .save(&depth_path)
            .with_context(|| format!("write {}", depth_path.display()))
        {
            if let Err(rm) = std::fs::remove_file(&rgb_path) {
                log::warn!("orphaned color file {}: {}", rgb_path.display(), rm);
            }
            return Err(e);
        }

        self.meta.push(frame_id, self.record.clone());
        Ok(())
    }

    /// Release the source, then flush metadata if anything was captured.
    /// Zero-capture sessions never create scene_camera.json.
    fn finish(&mut self) -> Result<SessionSummary> {
        if let Err(e) = self.source.close() {
            log::warn!("frame source close failed: {:#}", e);
        }

        if self.meta.is_empty() {
            log::info!("no frames captured, scene_camera.json not written");
        } else {
            let path = self.layout.camera_json_path();
            self.meta.write_to(&path)?;
            log::info!(
                "saved camera info for {} frames to {}",
                self.meta.len(),
                path.display()
            );
        }

        Ok(SessionSummary {
            frames_captured: self.next_id,
            scene_dir: self.layout.scene_dir().to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ScriptedCommands;
    use crate::source::{StreamConfig, SyntheticConfig, SyntheticSource};

    fn small_stream() -> StreamConfig {
        StreamConfig {
            width: 8,
            height: 6,
            fps: 30,
        }
    }

    #[test]
    fn counter_advances_only_on_capture() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = SceneLayout::new(tmp.path(), "train", 0);
        let source = SyntheticSource::new(SyntheticConfig::default(), small_stream());
        let session = CaptureSession::start(layout, Box::new(source)).unwrap();

        let mut commands = ScriptedCommands::new(vec![
            Command::Idle,
            Command::Capture,
            Command::Idle,
            Command::Capture,
            Command::Cancel,
        ]);
        let summary = session.run(&mut commands).unwrap();
        assert_eq!(summary.frames_captured, 2);
    }

    #[test]
    fn faulting_source_still_finalizes() {
        struct FailingSource {
            closed: std::sync::Arc<std::sync::atomic::AtomicBool>,
        }
        impl FrameSource for FailingSource {
            fn intrinsics(&self) -> crate::frame::Intrinsics {
                SyntheticConfig::default().intrinsics
            }
            fn depth_scale(&self) -> f64 {
                0.001
            }
            fn next_frame(&mut self) -> Result<Option<FramePair>> {
                Err(anyhow::anyhow!("sensor unplugged"))
            }
            fn close(&mut self) -> Result<()> {
                self.closed.store(true, std::sync::atomic::Ordering::Relaxed);
                Ok(())
            }
        }

        let tmp = tempfile::tempdir().unwrap();
        let layout = SceneLayout::new(tmp.path(), "train", 1);
        let closed = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let source = FailingSource {
            closed: closed.clone(),
        };
        let session = CaptureSession::start(layout.clone(), Box::new(source)).unwrap();

        let mut commands = ScriptedCommands::new(vec![]);
        assert!(session.run(&mut commands).is_err());
        assert!(closed.load(std::sync::atomic::Ordering::Relaxed));
        assert!(!layout.camera_json_path().exists());
    }
}
