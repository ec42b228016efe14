//! Synthetic frame source.
//!
//! Deterministic stand-in for a depth camera, used by tests and `stub://`
//! URLs. Produces a slowly shifting gradient in the color channel and a
//! ramp in the depth channel, and can simulate the sensor's transient
//! missing-frame condition on a fixed schedule.

use anyhow::Result;

use super::{FrameSource, StreamConfig};
use crate::frame::{FramePair, Intrinsics};

/// Configuration for a synthetic source.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    /// Display name (from the stub:// URL).
    pub name: String,
    /// Reported color-stream intrinsics.
    pub intrinsics: Intrinsics,
    /// Reported depth scale, meters per raw unit.
    pub depth_scale: f64,
    /// Report a missing frame every Nth call (0 = never).
    pub miss_every: u64,
}

impl SyntheticConfig {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            name: "camera".to_string(),
            intrinsics: Intrinsics {
                fx: 615.0,
                fy: 615.0,
                cx: 320.0,
                cy: 240.0,
            },
            // The common RealSense default: 1 raw unit = 1 mm.
            depth_scale: 0.001,
            miss_every: 0,
        }
    }
}

/// Deterministic synthetic frame source.
pub struct SyntheticSource {
    config: SyntheticConfig,
    stream: StreamConfig,
    frame_count: u64,
    closed: bool,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig, stream: StreamConfig) -> Self {
        Self {
            config,
            stream,
            frame_count: 0,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn generate_color(&self) -> Vec<u8> {
        let len = (self.stream.width * self.stream.height * 3) as usize;
        let mut pixels = vec![0u8; len];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count) % 256) as u8;
        }
        pixels
    }

    fn generate_depth(&self) -> Vec<u16> {
        let len = (self.stream.width * self.stream.height) as usize;
        let mut pixels = vec![0u16; len];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            // Row ramp, offset per frame so consecutive frames differ.
            *pixel = ((i as u64 / self.stream.width as u64) * 10 + self.frame_count) as u16;
        }
        pixels
    }
}

impl FrameSource for SyntheticSource {
    fn intrinsics(&self) -> Intrinsics {
        self.config.intrinsics
    }

    fn depth_scale(&self) -> f64 {
        self.config.depth_scale
    }

    fn next_frame(&mut self) -> Result<Option<FramePair>> {
        self.frame_count += 1;
        if self.config.miss_every != 0 && self.frame_count % self.config.miss_every == 0 {
            return Ok(None);
        }
        let frame = FramePair::new(
            self.generate_color(),
            self.generate_depth(),
            self.stream.width,
            self.stream.height,
        )?;
        Ok(Some(frame))
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        log::info!("synthetic source {} closed", self.config.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_match_requested_resolution() {
        let stream = StreamConfig {
            width: 4,
            height: 3,
            fps: 30,
        };
        let mut source = SyntheticSource::new(SyntheticConfig::default(), stream);
        let frame = source.next_frame().unwrap().unwrap();
        assert_eq!(frame.width, 4);
        assert_eq!(frame.height, 3);
        assert_eq!(frame.color().len(), 4 * 3 * 3);
        assert_eq!(frame.depth().len(), 4 * 3);
    }

    #[test]
    fn miss_schedule_yields_none() {
        let config = SyntheticConfig {
            miss_every: 2,
            ..SyntheticConfig::default()
        };
        let mut source = SyntheticSource::new(config, StreamConfig::default());
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn consecutive_frames_differ() {
        let mut source = SyntheticSource::new(SyntheticConfig::default(), StreamConfig::default());
        let a = source.next_frame().unwrap().unwrap();
        let b = source.next_frame().unwrap().unwrap();
        assert_ne!(a.color(), b.color());
        assert_ne!(a.depth(), b.depth());
    }
}
